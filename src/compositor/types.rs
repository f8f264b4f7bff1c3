//! Type definitions for the composition core.
//!
//! Status codes, sizes, blend modes and the small enums shared between the
//! device chain, the frame submitter and the dispatch shim.

use std::fmt;

use crate::error::{DcompShaderError, DcompShaderResult};

// ============================================================================
// Status Codes
// ============================================================================

/// A native result code (`HRESULT`). Negative values are failures.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

pub const S_OK: HResult = HResult(0);
pub const E_NOINTERFACE: HResult = HResult(0x8000_4002_u32 as i32);
pub const E_POINTER: HResult = HResult(0x8000_4003_u32 as i32);
pub const E_FAIL: HResult = HResult(0x8000_4005_u32 as i32);
pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000E_u32 as i32);
pub const DXGI_ERROR_DEVICE_REMOVED: HResult = HResult(0x887A_0005_u32 as i32);
pub const DXGI_ERROR_DEVICE_RESET: HResult = HResult(0x887A_0007_u32 as i32);

/// Which flavour of device loss a status reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceLoss {
    Removed,
    Reset,
}

/// Classification of a status code for recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    DeviceLost(DeviceLoss),
    Fatal,
}

impl HResult {
    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }

    /// Map this code onto the recovery taxonomy.
    ///
    /// Only device-removed and device-reset are recoverable; every other
    /// failure is fatal.
    pub fn classify(self) -> StatusClass {
        if self.is_ok() {
            StatusClass::Success
        } else if self == DXGI_ERROR_DEVICE_REMOVED {
            StatusClass::DeviceLost(DeviceLoss::Removed)
        } else if self == DXGI_ERROR_DEVICE_RESET {
            StatusClass::DeviceLost(DeviceLoss::Reset)
        } else {
            StatusClass::Fatal
        }
    }

    /// Turn a status into a `NativeResult`, tagging failures with the call that produced them.
    pub fn check(self, context: &'static str) -> NativeResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(NativeError::new(context, self))
        }
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult({})", self)
    }
}

/// A failed native call: the step that failed and the status it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeError {
    pub context: &'static str,
    pub code: HResult,
}

impl NativeError {
    pub fn new(context: &'static str, code: HResult) -> Self {
        Self { context, code }
    }
}

/// Result of a single native call.
pub type NativeResult<T> = Result<T, NativeError>;

// ============================================================================
// Geometry
// ============================================================================

/// Pixel dimensions of the render target.
///
/// (0, 0) is legal while the window is minimized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if there is nothing to draw into.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Decode the packed client size carried by a `WM_SIZE` lParam.
    pub fn from_lparam(lparam: isize) -> Self {
        let width = (lparam & 0xFFFF) as u32;
        let height = ((lparam >> 16) & 0xFFFF) as u32;
        Self { width, height }
    }
}

/// Offset into the surface atlas reported by `BeginDraw`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetPoint {
    pub x: i32,
    pub y: i32,
}

impl OffsetPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Minimum trackable size from a sizing-constraint query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSize {
    pub x: i32,
    pub y: i32,
}

impl TrackSize {
    /// Clamp both dimensions to at least one pixel so the client area can never reach zero.
    pub fn clamp_min(self) -> Self {
        Self {
            x: self.x.max(1),
            y: self.y.max(1),
        }
    }
}

/// Opaque native window handle, as an integer so the core stays platform-neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowHandle(pub isize);

// ============================================================================
// Device & Blend Enums
// ============================================================================

/// Driver tier used to create the rendering device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverType {
    /// GPU-backed device (tried first)
    Hardware,
    /// Software rasterizer (single fallback tier)
    Warp,
}

/// Raw `D2D1_PRIMITIVE_BLEND` values.
pub mod primitive_blend {
    pub const SOURCE_OVER: u32 = 0;
    pub const COPY: u32 = 1;
    pub const MIN: u32 = 2;
    pub const ADD: u32 = 3;
    pub const MAX: u32 = 4;
}

/// Composite operator used when drawing the effect output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    SourceOver,
    SourceCopy,
    Plus,
}

impl CompositeMode {
    /// Derive the composite operator from the context's primitive blend.
    pub fn from_primitive_blend(blend: u32) -> DcompShaderResult<Self> {
        match blend {
            primitive_blend::SOURCE_OVER => Ok(CompositeMode::SourceOver),
            primitive_blend::COPY => Ok(CompositeMode::SourceCopy),
            primitive_blend::ADD => Ok(CompositeMode::Plus),
            other => Err(DcompShaderError::UnsupportedBlend(other)),
        }
    }

    /// Raw `D2D1_COMPOSITE_MODE` value.
    pub fn raw(self) -> i32 {
        match self {
            CompositeMode::SourceOver => 0,
            CompositeMode::Plus => 9,
            CompositeMode::SourceCopy => 10,
        }
    }
}

// ============================================================================
// Lifecycle & Outcomes
// ============================================================================

/// Lifecycle of the device chain as seen by the dispatch shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChainState {
    Uninitialized = 0,
    Ready = 1,
    /// Inside a teardown + rebuild; treated as uninitialized.
    Rebuilding = 2,
}

impl ChainState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ChainState::Ready,
            2 => ChainState::Rebuilding,
            _ => ChainState::Uninitialized,
        }
    }
}

/// What a call to `submit_frame` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Frame drawn and committed
    Presented,
    /// Another submission held the gate; request dropped
    Dropped,
    /// Zero-sized target; nothing drawn
    Skipped,
    /// Chain not built; nothing drawn
    NotReady,
    /// Device was lost; chain rebuilt and this frame abandoned
    Recovered,
}
