use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SampleFormat, SampleRate, StreamConfig};
use log::debug;

use crate::error::AudioError;

/// One supported configuration range as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigCandidate {
    pub channels: u16,
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub sample_format: SampleFormat,
}

impl ConfigCandidate {
    fn covers(&self, sample_rate: u32, channels: u16) -> bool {
        self.channels == channels
            && sample_rate >= self.min_sample_rate
            && sample_rate <= self.max_sample_rate
    }
}

/// Pick a stream configuration with exactly the requested rate and channel
/// count in signed 16-bit. No conversion happens downstream, so anything
/// else is an error.
pub fn negotiate(
    candidates: &[ConfigCandidate],
    sample_rate: u32,
    channels: u16,
) -> Result<StreamConfig, AudioError> {
    let unsupported = |reason: &str| AudioError::UnsupportedParameters {
        sample_rate,
        channels,
        reason: reason.to_string(),
    };

    let matching: Vec<&ConfigCandidate> = candidates
        .iter()
        .filter(|c| c.covers(sample_rate, channels))
        .collect();

    if matching.is_empty() {
        return Err(unsupported("no matching rate/channel configuration"));
    }

    if !matching.iter().any(|c| c.sample_format == SampleFormat::I16) {
        let offered: Vec<String> = matching.iter().map(|c| format!("{:?}", c.sample_format)).collect();
        return Err(unsupported(&format!(
            "device offers {} instead of signed 16-bit",
            offered.join("/")
        )));
    }

    Ok(StreamConfig {
        channels,
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    })
}

/// Output device enumeration and selection
pub struct DeviceManager {
    host: Host,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Names of all output devices
    pub fn list_devices(&self) -> Result<Vec<String>, AudioError> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| AudioError::DeviceUnavailable(format!("Failed to enumerate devices: {}", e)))?;

        Ok(devices.filter_map(|device| device.name().ok()).collect())
    }

    /// Select a device by name, or the default one
    pub fn select_device(&self, device_name: Option<&str>) -> Result<Device, AudioError> {
        match device_name {
            Some(name) => {
                let mut devices = self.host.output_devices().map_err(|e| {
                    AudioError::DeviceUnavailable(format!("Failed to enumerate devices: {}", e))
                })?;
                devices
                    .find(|device| device.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| AudioError::DeviceUnavailable(format!("no output device named '{}'", name)))
            }
            None => self
                .host
                .default_output_device()
                .ok_or_else(|| AudioError::DeviceUnavailable("No default output device available".to_string())),
        }
    }

    /// Supported output configurations of `device`
    pub fn candidates(device: &Device) -> Result<Vec<ConfigCandidate>, AudioError> {
        let ranges = device
            .supported_output_configs()
            .map_err(|e| AudioError::DeviceUnavailable(format!("Failed to query configurations: {}", e)))?;

        let candidates: Vec<ConfigCandidate> = ranges
            .map(|range| ConfigCandidate {
                channels: range.channels(),
                min_sample_rate: range.min_sample_rate().0,
                max_sample_rate: range.max_sample_rate().0,
                sample_format: range.sample_format(),
            })
            .collect();

        debug!("Device offers {} configuration ranges", candidates.len());
        Ok(candidates)
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(channels: u16, min: u32, max: u32, sample_format: SampleFormat) -> ConfigCandidate {
        ConfigCandidate {
            channels,
            min_sample_rate: min,
            max_sample_rate: max,
            sample_format,
        }
    }

    #[test]
    fn test_negotiates_exact_parameters() {
        let candidates = [
            candidate(2, 8000, 192000, SampleFormat::F32),
            candidate(2, 8000, 192000, SampleFormat::I16),
            candidate(1, 8000, 48000, SampleFormat::I16),
        ];

        let config = negotiate(&candidates, 44100, 2).unwrap();
        assert_eq!(config.channels, 2);
        assert_eq!(config.sample_rate, SampleRate(44100));

        let config = negotiate(&candidates, 22050, 1).unwrap();
        assert_eq!(config.channels, 1);
    }

    #[test]
    fn test_rejects_other_bit_depths() {
        let candidates = [candidate(2, 8000, 192000, SampleFormat::F32)];

        match negotiate(&candidates, 44100, 2) {
            Err(AudioError::UnsupportedParameters { reason, .. }) => {
                assert!(reason.contains("F32"), "{}", reason);
            }
            other => panic!("Expected UnsupportedParameters, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_uncovered_rate_or_channels() {
        let candidates = [candidate(2, 44100, 48000, SampleFormat::I16)];

        assert!(negotiate(&candidates, 96000, 2).is_err());
        assert!(negotiate(&candidates, 44100, 1).is_err());
        assert!(negotiate(&[], 44100, 2).is_err());
    }

    #[test]
    fn test_i16_must_cover_the_request_itself() {
        // I16 exists, but only for mono
        let candidates = [
            candidate(1, 8000, 48000, SampleFormat::I16),
            candidate(2, 8000, 48000, SampleFormat::U16),
        ];
        assert!(negotiate(&candidates, 44100, 2).is_err());
    }
}
