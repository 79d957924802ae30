use std::io::{self, Write};
use std::process::ExitCode;

use log::{info, warn};

use smp_player::audio::{CpalSinkOpener, DeviceManager};
use smp_player::cli::{CliApp, Invocation, KeyboardInput, StatusDisplay, TerminalGuard};
use smp_player::config::{ConfigManager, PlayerConfig};
use smp_player::error::PlayerError;
use smp_player::logging::PlaybackLogger;
use smp_player::session::{PlayerSession, QuitFlag};

/// Exit status for usage errors and strict-mode failures
const EXIT_USAGE: u8 = 1;
/// Exit status for device and terminal failures
const EXIT_FATAL: u8 = 2;

/// Wires configuration, device, terminal and session together for one run
struct AppController {
    args: CliApp,
    config: PlayerConfig,
    logger: PlaybackLogger,
}

impl AppController {
    fn new(args: CliApp) -> Result<Self, PlayerError> {
        let mut manager = ConfigManager::new(args.config.as_deref())?;
        manager.override_with(|config| args.apply_overrides(config))?;
        match manager.config_path() {
            Some(path) => info!("Using configuration from {}", path.display()),
            None => info!("Using the default configuration"),
        }

        Ok(Self {
            args,
            config: manager.into_config(),
            logger: PlaybackLogger::new(),
        })
    }

    fn list_devices(&self) -> Result<(), PlayerError> {
        let devices = DeviceManager::new().list_devices()?;
        let mut stdout = io::stdout();
        if devices.is_empty() {
            let _ = writeln!(stdout, "No output devices found");
        }
        for name in devices {
            let _ = writeln!(stdout, "{}", name);
        }
        Ok(())
    }

    fn play(&self) -> Result<u8, PlayerError> {
        let quit = QuitFlag::new();
        if let Err(e) = quit.install_signal_handler() {
            warn!("Could not install signal handler: {}", e);
        }

        let opener = CpalSinkOpener::new(self.config.preferred_device.clone(), self.config.block_frames);
        let mut session = PlayerSession::new(&self.config, opener, quit.clone(), self.logger.clone());
        let mut input = KeyboardInput::new(quit);
        let mut display = StatusDisplay::stdout(self.config.bar_width, self.config.ui_refresh());

        // Dropped at the end of this scope on every path, restoring the terminal
        let _terminal = TerminalGuard::enter()?;
        let summary = session.run(&self.args.files, &mut input, &mut display, &mut io::stderr())?;

        Ok(summary.exit_code(self.args.strict) as u8)
    }

    fn run(&self) -> u8 {
        let result = if self.args.list_devices {
            self.list_devices().map(|_| 0)
        } else {
            self.play()
        };

        match result {
            Ok(code) => code,
            Err(e) => {
                let severity = e.severity();
                log::log!(severity.log_level(), "[{}] {}", severity.as_str(), e);
                eprintln!("smp: {}", e.user_message());
                if let PlayerError::Audio(audio) = &e {
                    if audio.is_setup_failure() {
                        eprintln!("smp: run with --list-devices to see the available outputs");
                    }
                }
                if e.is_fatal() {
                    EXIT_FATAL
                } else {
                    EXIT_USAGE
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let args = match CliApp::parse_from_args(std::env::args_os()) {
        Invocation::Run(args) => args,
        Invocation::Info(text) => {
            print!("{}", text);
            return ExitCode::SUCCESS;
        }
        Invocation::Usage(text) => {
            eprint!("{}", text);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Err(e) = PlaybackLogger::init() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let app = match AppController::new(args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("smp: {}", e.user_message());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    ExitCode::from(app.run())
}
