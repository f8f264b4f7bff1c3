//! Recording backend for exercising the composition core without a GPU.
//!
//! Every native call is appended to a shared log. Resources log their own
//! release when dropped, so tests can assert both construction and teardown
//! order. Failures are injected per call name and consumed one at a time.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::shader::ShaderConstants;

use super::backend::CompositionBackend;
use super::renderer::Lifecycle;
use super::types::{
    primitive_blend, ChainState, CompositeMode, DriverType, FrameSize, HResult, NativeError,
    NativeResult, OffsetPoint, WindowHandle,
};

/// One recorded `draw_effect` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub constants: ShaderConstants,
    pub offset: OffsetPoint,
    pub size: FrameSize,
    pub mode: CompositeMode,
}

struct BlockHook {
    entered: Sender<()>,
    release: Receiver<()>,
}

struct MockState {
    log: Vec<String>,
    failures: HashMap<&'static str, VecDeque<HResult>>,
    blend: u32,
    offset: OffsetPoint,
    surface_sizes: Vec<FrameSize>,
    resizes: Vec<FrameSize>,
    draws: Vec<DrawCall>,
    probe: Option<Lifecycle>,
    observed_states: Vec<ChainState>,
    block: Option<BlockHook>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            failures: HashMap::new(),
            blend: primitive_blend::SOURCE_OVER,
            offset: OffsetPoint::default(),
            surface_sizes: Vec::new(),
            resizes: Vec::new(),
            draws: Vec::new(),
            probe: None,
            observed_states: Vec::new(),
            block: None,
        }
    }
}

/// A native resource stand-in that logs its release.
#[derive(Debug)]
pub struct Resource {
    name: &'static str,
    state: Arc<Mutex<MockState>>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.state.lock().log.push(format!("release:{}", self.name));
    }
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState").field("log", &self.log).finish()
    }
}

/// Cloning shares the recorded state, so a test can keep a handle after
/// moving the backend into a renderer.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `call` fail with `code`. Queued failures are consumed in order.
    pub fn fail_next(&self, call: &'static str, code: HResult) {
        self.state
            .lock()
            .failures
            .entry(call)
            .or_default()
            .push_back(code);
    }

    pub fn set_blend(&self, blend: u32) {
        self.state.lock().blend = blend;
    }

    pub fn set_offset(&self, offset: OffsetPoint) {
        self.state.lock().offset = offset;
    }

    /// Record the lifecycle state every time a device creation is attempted.
    pub fn probe(&self, lifecycle: Lifecycle) {
        self.state.lock().probe = Some(lifecycle);
    }

    /// Make the next `begin_draw` signal `entered` and wait for `release`.
    pub fn block_begin_draw(&self, entered: Sender<()>, release: Receiver<()>) {
        self.state.lock().block = Some(BlockHook { entered, release });
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    pub fn count(&self, call: &str) -> usize {
        self.state.lock().log.iter().filter(|entry| *entry == call).count()
    }

    pub fn surface_sizes(&self) -> Vec<FrameSize> {
        self.state.lock().surface_sizes.clone()
    }

    pub fn resizes(&self) -> Vec<FrameSize> {
        self.state.lock().resizes.clone()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.lock().draws.clone()
    }

    pub fn observed_states(&self) -> Vec<ChainState> {
        self.state.lock().observed_states.clone()
    }

    fn step(&self, call: &'static str) -> NativeResult<()> {
        let mut state = self.state.lock();
        state.log.push(call.to_string());
        match state.failures.get_mut(call).and_then(VecDeque::pop_front) {
            Some(code) => Err(NativeError::new(call, code)),
            None => Ok(()),
        }
    }

    fn resource(&self, call: &'static str, name: &'static str) -> NativeResult<Resource> {
        self.step(call)?;
        Ok(Resource {
            name,
            state: Arc::clone(&self.state),
        })
    }
}

impl CompositionBackend for MockBackend {
    type Device = Resource;
    type DeviceView = Resource;
    type Factory = Resource;
    type DrawingDevice = Resource;
    type CompositionDevice = Resource;
    type Target = Resource;
    type Visual = Resource;
    type SurfaceFactory = Resource;
    type Surface = Resource;
    type Context = Resource;

    fn create_device(&mut self, driver: DriverType) -> NativeResult<Resource> {
        {
            let mut state = self.state.lock();
            if let Some(lifecycle) = state.probe.clone() {
                state.observed_states.push(lifecycle.get());
            }
        }
        let call = match driver {
            DriverType::Hardware => "create_device:hardware",
            DriverType::Warp => "create_device:warp",
        };
        self.resource(call, "device")
    }

    fn device_view(&mut self, _device: &Resource) -> NativeResult<Resource> {
        self.resource("device_view", "view")
    }

    fn create_factory(&mut self) -> NativeResult<Resource> {
        self.resource("create_factory", "factory")
    }

    fn create_drawing_device(&mut self, _factory: &Resource, _view: &Resource) -> NativeResult<Resource> {
        self.resource("create_drawing_device", "drawing_device")
    }

    fn create_composition_device(&mut self, _drawing_device: &Resource) -> NativeResult<Resource> {
        self.resource("create_composition_device", "composition_device")
    }

    fn register_effect(&mut self, _factory: &Resource) -> NativeResult<()> {
        self.step("register_effect")
    }

    fn create_target(
        &mut self,
        _device: &Resource,
        _window: WindowHandle,
        topmost: bool,
    ) -> NativeResult<Resource> {
        assert!(topmost, "target must be created topmost");
        self.resource("create_target", "target")
    }

    fn create_visual(&mut self, _device: &Resource) -> NativeResult<Resource> {
        self.resource("create_visual", "visual")
    }

    fn create_surface_factory(&mut self, _device: &Resource, _drawing_device: &Resource) -> NativeResult<Resource> {
        self.resource("create_surface_factory", "surface_factory")
    }

    fn create_surface(&mut self, _factory: &Resource, size: FrameSize) -> NativeResult<Resource> {
        let surface = self.resource("create_surface", "surface")?;
        self.state.lock().surface_sizes.push(size);
        Ok(surface)
    }

    fn set_content(&mut self, _visual: &Resource, _surface: &Resource) -> NativeResult<()> {
        self.step("set_content")
    }

    fn set_root(&mut self, _target: &Resource, _visual: &Resource) -> NativeResult<()> {
        self.step("set_root")
    }

    fn commit(&mut self, _device: &Resource) -> NativeResult<()> {
        self.step("commit")
    }

    fn resize_surface(&mut self, _surface: &Resource, size: FrameSize) -> NativeResult<()> {
        self.step("resize_surface")?;
        self.state.lock().resizes.push(size);
        Ok(())
    }

    fn begin_draw(&mut self, _surface: &Resource) -> NativeResult<(Resource, OffsetPoint)> {
        let hook = self.state.lock().block.take();
        if let Some(hook) = hook {
            let _ = hook.entered.send(());
            let _ = hook.release.recv();
        }
        let context = self.resource("begin_draw", "context")?;
        let offset = self.state.lock().offset;
        Ok((context, offset))
    }

    fn clear(&mut self, _context: &Resource) -> NativeResult<()> {
        self.step("clear")
    }

    fn primitive_blend(&mut self, _context: &Resource) -> NativeResult<u32> {
        self.step("primitive_blend")?;
        Ok(self.state.lock().blend)
    }

    fn draw_effect(
        &mut self,
        _context: &Resource,
        constants: &ShaderConstants,
        offset: OffsetPoint,
        size: FrameSize,
        composite_mode: CompositeMode,
    ) -> NativeResult<()> {
        self.step("draw_effect")?;
        self.state.lock().draws.push(DrawCall {
            constants: *constants,
            offset,
            size,
            mode: composite_mode,
        });
        Ok(())
    }

    fn end_draw(&mut self, _surface: &Resource) -> NativeResult<()> {
        self.step("end_draw")
    }
}
