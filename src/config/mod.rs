//! Application configuration.
//!
//! Window geometry, timer rate and log filter, loaded once at startup from an
//! optional JSON file. Every field has a default, so a missing file or a
//! partial one is fine.

pub mod app;

pub use app::{AppConfig, WindowConfig, CONFIG_ENV_VAR};
