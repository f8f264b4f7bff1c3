//! Window-event dispatch.
//!
//! Translates platform-neutral window events into renderer calls. Resize and
//! timer events are only acted on while the chain is `Ready`; the sizing
//! constraint query is answered in every state.

use crate::clock::Clock;
use crate::error::DcompShaderResult;

use super::backend::CompositionBackend;
use super::renderer::Renderer;
use super::types::{FrameSize, SubmitOutcome, TrackSize};

/// Window events the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The user asked to close the window
    Close,
    /// The client area changed size
    Resize(FrameSize),
    /// Periodic frame timer fired
    Tick,
    /// The system asked for sizing constraints; carries the proposed minimum track size
    MinMaxQuery(TrackSize),
}

/// What the platform layer should do after an event was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Post the quit signal; the message loop ends
    Quit,
    /// A frame submission ran with this result
    Frame(SubmitOutcome),
    /// Nothing to do in the current state
    Ignored,
    /// Write back this minimum track size
    MinTrackSize(TrackSize),
}

/// Routes window events to a renderer, stamping frames with a clock.
pub struct Dispatcher<'a, B: CompositionBackend, C: Clock> {
    renderer: &'a Renderer<B>,
    clock: &'a C,
}

impl<'a, B: CompositionBackend, C: Clock> Dispatcher<'a, B, C> {
    pub fn new(renderer: &'a Renderer<B>, clock: &'a C) -> Self {
        Self { renderer, clock }
    }

    /// Handle one event.
    ///
    /// `client_size` is only called for timer ticks, to read the window's
    /// current client area.
    pub fn dispatch(
        &self,
        event: WindowEvent,
        client_size: impl FnOnce() -> FrameSize,
    ) -> DcompShaderResult<DispatchOutcome> {
        match event {
            WindowEvent::Close => {
                log::info!("[DISPATCH] Close requested");
                Ok(DispatchOutcome::Quit)
            }
            WindowEvent::MinMaxQuery(proposed) => Ok(DispatchOutcome::MinTrackSize(proposed.clamp_min())),
            WindowEvent::Resize(size) => {
                if !self.renderer.is_ready() {
                    return Ok(DispatchOutcome::Ignored);
                }
                log::debug!("[DISPATCH] Resize to {}x{}", size.width, size.height);
                self.submit(size, true)
            }
            WindowEvent::Tick => {
                if !self.renderer.is_ready() {
                    return Ok(DispatchOutcome::Ignored);
                }
                self.submit(client_size(), false)
            }
        }
    }

    fn submit(&self, size: FrameSize, is_resize: bool) -> DcompShaderResult<DispatchOutcome> {
        let timestamp = self.clock.elapsed_seconds();
        self.renderer
            .submit_frame(timestamp, size, is_resize)
            .map(DispatchOutcome::Frame)
    }
}
