//! An animated procedural pixel shader, drawn with Direct2D into a
//! DirectComposition virtual surface.
//!
//! The platform-neutral core lives in [`compositor`]: the device chain, the
//! frame submitter and its gate, and the window-event dispatcher, all generic
//! over a [`compositor::CompositionBackend`]. The Windows backend and the
//! window itself are only built on Windows.

pub mod clock;
pub mod com;
pub mod compositor;
pub mod config;
pub mod error;
pub mod shader;

#[cfg(windows)]
pub mod window;

use config::AppConfig;
use error::DcompShaderResult;

/// Run the application until its window closes. Returns the process exit code.
#[cfg(windows)]
pub fn run(config: &AppConfig) -> DcompShaderResult<i32> {
    window::run(config)
}

#[cfg(not(windows))]
pub fn run(_config: &AppConfig) -> DcompShaderResult<i32> {
    Err(error::DcompShaderError::Other(
        "DirectComposition is only available on Windows".to_string(),
    ))
}
