//! The owning context for the device chain and frame submission.
//!
//! `Renderer` replaces process-wide globals: it owns the backend, the chain,
//! the submission gate and the lifecycle flag, and is passed by reference to
//! whoever triggers frames.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DcompShaderResult;
use crate::shader::ShaderConstants;

use super::backend::CompositionBackend;
use super::chain::DeviceChain;
use super::gate::SubmissionGate;
use super::types::{ChainState, CompositeMode, FrameSize, SubmitOutcome, WindowHandle};

// ============================================================================
// Lifecycle
// ============================================================================

/// Shared view of the chain's lifecycle state.
///
/// Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle(Arc<AtomicU8>);

impl Lifecycle {
    pub fn get(&self) -> ChainState {
        ChainState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn is_ready(&self) -> bool {
        self.get() == ChainState::Ready
    }

    fn set(&self, state: ChainState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

// ============================================================================
// Frame Statistics
// ============================================================================

#[derive(Debug, Default)]
struct FrameCounters {
    presented: AtomicU64,
    dropped: AtomicU64,
    skipped: AtomicU64,
    recoveries: AtomicU64,
}

/// Point-in-time copy of the renderer's frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub presented: u64,
    /// Requests turned away because another submission held the gate
    pub dropped: u64,
    /// Requests with a zero-sized target
    pub skipped: u64,
    /// Device losses recovered by rebuilding the chain
    pub recoveries: u64,
}

// ============================================================================
// Renderer
// ============================================================================

struct Inner<B: CompositionBackend> {
    backend: B,
    window: WindowHandle,
    /// Size the virtual surface was last created or resized to
    surface_size: FrameSize,
    chain: Option<DeviceChain<B>>,
}

/// Device chain owner and frame submitter.
pub struct Renderer<B: CompositionBackend> {
    gate: SubmissionGate,
    lifecycle: Lifecycle,
    counters: FrameCounters,
    inner: Mutex<Inner<B>>,
}

impl<B: CompositionBackend> Renderer<B> {
    /// Create an uninitialized renderer for `window`.
    ///
    /// `initial_size` is the size the first virtual surface is created at.
    pub fn new(backend: B, window: WindowHandle, initial_size: FrameSize) -> Self {
        Self {
            gate: SubmissionGate::new(),
            lifecycle: Lifecycle::default(),
            counters: FrameCounters::default(),
            inner: Mutex::new(Inner {
                backend,
                window,
                surface_size: initial_size,
                chain: None,
            }),
        }
    }

    pub fn state(&self) -> ChainState {
        self.lifecycle.get()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    /// A handle observing the lifecycle flag.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            presented: self.counters.presented.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            recoveries: self.counters.recoveries.load(Ordering::Relaxed),
        }
    }

    /// Build the device chain. Any existing chain is released first.
    ///
    /// On success the renderer is `Ready`; on failure it is `Uninitialized`
    /// and the error is fatal.
    pub fn initialize(&self) -> DcompShaderResult<()> {
        let mut inner = self.inner.lock();
        if inner.chain.is_some() {
            return self.rebuild_chain(&mut inner);
        }
        self.build_chain(&mut inner)
    }

    /// Release the device chain and clear the ready flag.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        self.release_chain(&mut inner);
        self.lifecycle.set(ChainState::Uninitialized);
    }

    /// Full teardown followed by full rebuild.
    pub fn rebuild(&self) -> DcompShaderResult<()> {
        let mut inner = self.inner.lock();
        self.rebuild_chain(&mut inner)
    }

    /// Draw and commit one frame of shader output.
    ///
    /// Never waits: if another submission is in flight the request is
    /// dropped. A zero-sized `size` draws nothing. If `is_resize`, the
    /// surface is resized to `size` before drawing. A device-removed or
    /// device-reset status rebuilds the chain and abandons this frame; any
    /// other failure is returned and is fatal.
    pub fn submit_frame(
        &self,
        timestamp: f32,
        size: FrameSize,
        is_resize: bool,
    ) -> DcompShaderResult<SubmitOutcome> {
        let Some(_permit) = self.gate.try_acquire() else {
            log::trace!("[SUBMIT] Submission in flight, dropping frame");
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(SubmitOutcome::Dropped);
        };

        if size.is_empty() {
            log::trace!("[SUBMIT] Zero-sized target {}x{}, skipping", size.width, size.height);
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(SubmitOutcome::Skipped);
        }

        let mut inner = self.inner.lock();
        let Inner {
            backend,
            chain,
            surface_size,
            ..
        } = &mut *inner;

        let Some(chain) = chain.as_ref() else {
            return Ok(SubmitOutcome::NotReady);
        };

        match draw_frame(backend, chain, surface_size, timestamp, size, is_resize) {
            Ok(()) => {
                self.counters.presented.fetch_add(1, Ordering::Relaxed);
                Ok(SubmitOutcome::Presented)
            }
            Err(err) if err.is_device_lost() => {
                log::warn!("[SUBMIT] {}; rebuilding device chain", err);
                self.rebuild_chain(&mut inner)?;
                self.counters.recoveries.fetch_add(1, Ordering::Relaxed);
                Ok(SubmitOutcome::Recovered)
            }
            Err(err) => {
                log::error!("[SUBMIT] {}", err);
                Err(err)
            }
        }
    }

    fn build_chain(&self, inner: &mut Inner<B>) -> DcompShaderResult<()> {
        match DeviceChain::build(&mut inner.backend, inner.window, inner.surface_size) {
            Ok(chain) => {
                inner.chain = Some(chain);
                self.lifecycle.set(ChainState::Ready);
                Ok(())
            }
            Err(err) => {
                log::error!("[CHAIN] Device chain construction failed: {}", err);
                self.lifecycle.set(ChainState::Uninitialized);
                Err(err)
            }
        }
    }

    fn release_chain(&self, inner: &mut Inner<B>) {
        if let Some(chain) = inner.chain.take() {
            chain.dispose();
        }
    }

    fn rebuild_chain(&self, inner: &mut Inner<B>) -> DcompShaderResult<()> {
        self.lifecycle.set(ChainState::Rebuilding);
        self.release_chain(inner);
        self.build_chain(inner)
    }
}

/// One frame: optional resize, draw the effect, end the draw, commit.
fn draw_frame<B: CompositionBackend>(
    backend: &mut B,
    chain: &DeviceChain<B>,
    surface_size: &mut FrameSize,
    timestamp: f32,
    size: FrameSize,
    is_resize: bool,
) -> DcompShaderResult<()> {
    let surface = chain.surface();

    if is_resize {
        // The window is already at `size`; a rebuild after a failed resize uses it.
        *surface_size = size;
        backend.resize_surface(surface, size)?;
    }

    let (context, offset) = backend.begin_draw(surface)?;
    backend.clear(&context)?;

    let composite_mode = CompositeMode::from_primitive_blend(backend.primitive_blend(&context)?)?;
    let constants = ShaderConstants::new(timestamp, size);
    backend.draw_effect(&context, &constants, offset, size, composite_mode)?;

    backend.end_draw(surface)?;
    drop(context);

    backend.commit(chain.composition_device())?;
    Ok(())
}
