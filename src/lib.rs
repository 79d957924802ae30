pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;

#[cfg(test)]
mod test_support;


pub use error::*;
pub use models::*;
