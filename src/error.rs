//! Central error types for dcomp-shader.
//!
//! Native graphics calls report `HRESULT`-style status codes. They are
//! classified once, at the boundary, into the variants below so callers can
//! branch on device loss instead of comparing numeric codes.

use thiserror::Error;

use crate::compositor::types::{DeviceLoss, HResult, NativeError, StatusClass};

/// Main error type for dcomp-shader operations.
#[derive(Error, Debug)]
pub enum DcompShaderError {
    /// The rendering device was removed or reset (recoverable by rebuilding the chain)
    #[error("{context}: graphics device lost ({kind:?}, HRESULT {code})")]
    DeviceLost {
        context: &'static str,
        kind: DeviceLoss,
        code: HResult,
    },

    /// A native call failed with a non-recoverable status
    #[error("{context} failed with HRESULT {code}")]
    Native { context: &'static str, code: HResult },

    /// Both the hardware device and the software fallback could not be created
    #[error("Device creation failed (hardware: HRESULT {hardware}, software: HRESULT {software})")]
    DeviceCreation { hardware: HResult, software: HResult },

    /// The drawing context reported a primitive blend with no composite equivalent
    #[error("Unsupported primitive blend value {0}")]
    UnsupportedBlend(u32),

    /// Window class registration or window creation failed
    #[error("Window error: {0}")]
    Window(String),

    /// Configuration was rejected
    #[error("Config error: {0}")]
    Config(String),

    /// Reading the configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl DcompShaderError {
    /// True if this error should trigger a teardown and rebuild of the device chain.
    pub fn is_device_lost(&self) -> bool {
        matches!(self, DcompShaderError::DeviceLost { .. })
    }

    /// The status code to show the user, if this error carries one.
    pub fn status_code(&self) -> Option<HResult> {
        match self {
            DcompShaderError::DeviceLost { code, .. } | DcompShaderError::Native { code, .. } => {
                Some(*code)
            }
            DcompShaderError::DeviceCreation { software, .. } => Some(*software),
            _ => None,
        }
    }
}

impl From<NativeError> for DcompShaderError {
    fn from(err: NativeError) -> Self {
        match err.code.classify() {
            StatusClass::DeviceLost(kind) => DcompShaderError::DeviceLost {
                context: err.context,
                kind,
                code: err.code,
            },
            // A NativeError carrying a success code is a backend bug; surface it as fatal.
            StatusClass::Fatal | StatusClass::Success => DcompShaderError::Native {
                context: err.context,
                code: err.code,
            },
        }
    }
}

impl From<String> for DcompShaderError {
    fn from(msg: String) -> Self {
        DcompShaderError::Other(msg)
    }
}

impl From<&str> for DcompShaderError {
    fn from(msg: &str) -> Self {
        DcompShaderError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// Similar to anyhow's `Context` trait, this allows chaining context
/// information onto errors for better debugging.
pub trait ResultExt<T> {
    /// Add context to an error, converting it to DcompShaderError::Other.
    fn context(self, msg: &str) -> DcompShaderResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> DcompShaderResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> DcompShaderResult<T> {
        self.map_err(|e| DcompShaderError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> DcompShaderResult<T> {
        self.map_err(|e| DcompShaderError::Other(format!("{}: {}", f(), e)))
    }
}

/// Type alias for Results using DcompShaderError.
pub type DcompShaderResult<T> = Result<T, DcompShaderError>;
