//! Windows implementation of the composition backend.
//!
//! # Architecture
//!
//! ```text
//! D3D11 Device (hardware or WARP)
//!     |
//!     +-- IDXGIDevice
//!             |
//!             +-- ID2D1Device1 (from ID2D1Factory2, shader effect registered)
//!                     |
//!                     +-- IDCompositionDesktopDevice
//!                             |
//!                             +-- target (HWND) -- visual
//!                             |
//!                             +-- surface factory -- virtual surface (BGRA, premultiplied)
//! ```
//!
//! # Modules
//!
//! - `d3d` - D3D11 device creation
//! - `d2d` - Direct2D factory, device and drawing
//! - `compositor` - DirectComposition setup and surface drawing
//! - `effect` - the custom pixel shader effect

pub mod compositor;
pub mod d2d;
pub mod d3d;
pub mod effect;

use windows::core::HRESULT;
use windows::Win32::Graphics::Direct2D::{
    ID2D1Device1, ID2D1DeviceContext, ID2D1Factory2,
};
use windows::Win32::Graphics::Direct3D11::ID3D11Device;
use windows::Win32::Graphics::DirectComposition::{
    IDCompositionDesktopDevice, IDCompositionSurfaceFactory, IDCompositionTarget,
    IDCompositionVirtualSurface, IDCompositionVisual2,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;

use super::backend::CompositionBackend;
use super::types::{
    CompositeMode, DriverType, FrameSize, HResult, NativeError, NativeResult, OffsetPoint,
    WindowHandle,
};
use crate::com::Com;
use crate::shader::ShaderConstants;

impl From<HRESULT> for HResult {
    fn from(code: HRESULT) -> Self {
        HResult(code.0)
    }
}

/// Tag a `windows-rs` result with the native call that produced it.
pub(crate) trait NativeResultExt<T> {
    fn native(self, context: &'static str) -> NativeResult<T>;
}

impl<T> NativeResultExt<T> for windows::core::Result<T> {
    fn native(self, context: &'static str) -> NativeResult<T> {
        self.map_err(|err| NativeError::new(context, err.code().into()))
    }
}

/// Direct3D 11 + Direct2D + DirectComposition.
#[derive(Debug, Default)]
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CompositionBackend for WindowsBackend {
    type Device = Com<ID3D11Device>;
    type DeviceView = Com<IDXGIDevice>;
    type Factory = Com<ID2D1Factory2>;
    type DrawingDevice = Com<ID2D1Device1>;
    type CompositionDevice = Com<IDCompositionDesktopDevice>;
    type Target = Com<IDCompositionTarget>;
    type Visual = Com<IDCompositionVisual2>;
    type SurfaceFactory = Com<IDCompositionSurfaceFactory>;
    type Surface = Com<IDCompositionVirtualSurface>;
    type Context = Com<ID2D1DeviceContext>;

    fn create_device(&mut self, driver: DriverType) -> NativeResult<Self::Device> {
        d3d::create_device(driver)
    }

    fn device_view(&mut self, device: &Self::Device) -> NativeResult<Self::DeviceView> {
        d3d::dxgi_device(device)
    }

    fn create_factory(&mut self) -> NativeResult<Self::Factory> {
        d2d::create_factory()
    }

    fn create_drawing_device(
        &mut self,
        factory: &Self::Factory,
        view: &Self::DeviceView,
    ) -> NativeResult<Self::DrawingDevice> {
        d2d::create_device(factory, view)
    }

    fn create_composition_device(
        &mut self,
        drawing_device: &Self::DrawingDevice,
    ) -> NativeResult<Self::CompositionDevice> {
        compositor::create_device(drawing_device)
    }

    fn register_effect(&mut self, factory: &Self::Factory) -> NativeResult<()> {
        effect::register(factory)
    }

    fn create_target(
        &mut self,
        device: &Self::CompositionDevice,
        window: WindowHandle,
        topmost: bool,
    ) -> NativeResult<Self::Target> {
        compositor::create_target(device, window, topmost)
    }

    fn create_visual(&mut self, device: &Self::CompositionDevice) -> NativeResult<Self::Visual> {
        compositor::create_visual(device)
    }

    fn create_surface_factory(
        &mut self,
        device: &Self::CompositionDevice,
        drawing_device: &Self::DrawingDevice,
    ) -> NativeResult<Self::SurfaceFactory> {
        compositor::create_surface_factory(device, drawing_device)
    }

    fn create_surface(
        &mut self,
        factory: &Self::SurfaceFactory,
        size: FrameSize,
    ) -> NativeResult<Self::Surface> {
        compositor::create_surface(factory, size)
    }

    fn set_content(&mut self, visual: &Self::Visual, surface: &Self::Surface) -> NativeResult<()> {
        compositor::set_content(visual, surface)
    }

    fn set_root(&mut self, target: &Self::Target, visual: &Self::Visual) -> NativeResult<()> {
        compositor::set_root(target, visual)
    }

    fn commit(&mut self, device: &Self::CompositionDevice) -> NativeResult<()> {
        compositor::commit(device)
    }

    fn resize_surface(&mut self, surface: &Self::Surface, size: FrameSize) -> NativeResult<()> {
        compositor::resize(surface, size)
    }

    fn begin_draw(
        &mut self,
        surface: &Self::Surface,
    ) -> NativeResult<(Self::Context, OffsetPoint)> {
        compositor::begin_draw(surface)
    }

    fn clear(&mut self, context: &Self::Context) -> NativeResult<()> {
        d2d::clear(context)
    }

    fn primitive_blend(&mut self, context: &Self::Context) -> NativeResult<u32> {
        d2d::primitive_blend(context)
    }

    fn draw_effect(
        &mut self,
        context: &Self::Context,
        constants: &ShaderConstants,
        offset: OffsetPoint,
        size: FrameSize,
        composite_mode: CompositeMode,
    ) -> NativeResult<()> {
        d2d::draw_effect(context, constants, offset, size, composite_mode)
    }

    fn end_draw(&mut self, surface: &Self::Surface) -> NativeResult<()> {
        compositor::end_draw(surface)
    }
}
