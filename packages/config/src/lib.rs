// ABOUTME: Configuration and environment variable management for cloudlens
// ABOUTME: Exposes env var names and a typed Config loaded from the process environment

pub mod config;
pub mod constants;

pub use config::{Config, ConfigError};
