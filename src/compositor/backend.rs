//! The seam between the composition core and the native graphics API.
//!
//! Each method is one native call (or a fixed group of calls) whose status
//! the core checks immediately. Resources are opaque associated types; the
//! core only orders their creation and release.

use crate::shader::ShaderConstants;

use super::types::{CompositeMode, DriverType, FrameSize, NativeResult, OffsetPoint, WindowHandle};

/// Native graphics API used to build the device chain and draw frames.
pub trait CompositionBackend {
    /// Rendering device
    type Device;
    /// Rendering device viewed as a composition backend (DXGI device)
    type DeviceView;
    /// 2D drawing factory
    type Factory;
    /// 2D drawing device
    type DrawingDevice;
    /// Desktop composition device
    type CompositionDevice;
    /// Composition target bound to a window
    type Target;
    /// Composition visual
    type Visual;
    /// Surface factory bound to the drawing device
    type SurfaceFactory;
    /// Virtual composition surface
    type Surface;
    /// Drawing context handed out by `begin_draw`
    type Context;

    // ------------------------------------------------------------------
    // Chain construction
    // ------------------------------------------------------------------

    /// Create a BGRA-capable rendering device on the given driver tier.
    fn create_device(&mut self, driver: DriverType) -> NativeResult<Self::Device>;

    /// Query the device for its composition-backend view.
    fn device_view(&mut self, device: &Self::Device) -> NativeResult<Self::DeviceView>;

    /// Create the single-threaded 2D drawing factory.
    fn create_factory(&mut self) -> NativeResult<Self::Factory>;

    fn create_drawing_device(
        &mut self,
        factory: &Self::Factory,
        view: &Self::DeviceView,
    ) -> NativeResult<Self::DrawingDevice>;

    fn create_composition_device(
        &mut self,
        drawing_device: &Self::DrawingDevice,
    ) -> NativeResult<Self::CompositionDevice>;

    /// Register the shader effect with `factory`. Must tolerate repeat calls.
    fn register_effect(&mut self, factory: &Self::Factory) -> NativeResult<()>;

    fn create_target(
        &mut self,
        device: &Self::CompositionDevice,
        window: WindowHandle,
        topmost: bool,
    ) -> NativeResult<Self::Target>;

    fn create_visual(&mut self, device: &Self::CompositionDevice) -> NativeResult<Self::Visual>;

    fn create_surface_factory(
        &mut self,
        device: &Self::CompositionDevice,
        drawing_device: &Self::DrawingDevice,
    ) -> NativeResult<Self::SurfaceFactory>;

    /// Create a 32-bit, alpha-carrying virtual surface.
    fn create_surface(
        &mut self,
        factory: &Self::SurfaceFactory,
        size: FrameSize,
    ) -> NativeResult<Self::Surface>;

    fn set_content(&mut self, visual: &Self::Visual, surface: &Self::Surface) -> NativeResult<()>;

    fn set_root(&mut self, target: &Self::Target, visual: &Self::Visual) -> NativeResult<()>;

    /// Commit the composition device's pending transaction.
    fn commit(&mut self, device: &Self::CompositionDevice) -> NativeResult<()>;

    // ------------------------------------------------------------------
    // Frame drawing
    // ------------------------------------------------------------------

    fn resize_surface(&mut self, surface: &Self::Surface, size: FrameSize) -> NativeResult<()>;

    /// Begin drawing on the surface's update region.
    ///
    /// Returns the drawing context and the offset to draw at.
    fn begin_draw(&mut self, surface: &Self::Surface)
        -> NativeResult<(Self::Context, OffsetPoint)>;

    /// Clear the context to transparent.
    fn clear(&mut self, context: &Self::Context) -> NativeResult<()>;

    /// The context's configured `D2D1_PRIMITIVE_BLEND`, raw.
    fn primitive_blend(&mut self, context: &Self::Context) -> NativeResult<u32>;

    /// Instantiate the shader effect, feed it `constants` and draw its output
    /// at `offset` over `size` with linear interpolation.
    fn draw_effect(
        &mut self,
        context: &Self::Context,
        constants: &ShaderConstants,
        offset: OffsetPoint,
        size: FrameSize,
        composite_mode: CompositeMode,
    ) -> NativeResult<()>;

    fn end_draw(&mut self, surface: &Self::Surface) -> NativeResult<()>;
}
