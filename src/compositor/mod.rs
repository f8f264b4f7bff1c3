//! Composition core: device chain, frame submission and event dispatch.
//!
//! # Architecture
//!
//! ```text
//! Rendering device (hardware, then WARP)
//!     |
//!     +-- DXGI view --+-- 2D drawing device --+-- composition device
//!                                               |
//!                                               +-- target (window) -- visual
//!                                               |
//!                                               +-- surface factory -- virtual surface
//! ```
//!
//! Everything here is generic over [`CompositionBackend`]; the Windows
//! implementation lives in `graphics`.
//!
//! # Modules
//!
//! - `types` - status codes, sizes, blend mapping, outcomes
//! - `backend` - the native API seam
//! - `chain` - build and release of the nine-resource chain
//! - `gate` - non-blocking submission gate
//! - `renderer` - lifecycle owner and frame submitter
//! - `dispatch` - window events to renderer calls

pub mod backend;
pub mod chain;
pub mod dispatch;
pub mod gate;
pub mod renderer;
pub mod types;

#[cfg(windows)]
pub mod graphics;

#[cfg(test)]
mod mock;

pub use backend::CompositionBackend;
pub use chain::DeviceChain;
pub use dispatch::{DispatchOutcome, Dispatcher, WindowEvent};
pub use gate::{GatePermit, SubmissionGate};
pub use renderer::{FrameStats, Lifecycle, Renderer};
pub use types::{
    ChainState, CompositeMode, DriverType, FrameSize, HResult, NativeError, NativeResult,
    OffsetPoint, SubmitOutcome, TrackSize, WindowHandle,
};
