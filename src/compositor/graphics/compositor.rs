//! DirectComposition device, visual tree and virtual surface.
//!
//! The window is created with `WS_EX_NOREDIRECTIONBITMAP`, so the visual tree
//! built here is the only thing that ever reaches the screen.

use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Direct2D::{ID2D1Device1, ID2D1DeviceContext};
use windows::Win32::Graphics::DirectComposition::{
    DCompositionCreateDevice3, IDCompositionDesktopDevice, IDCompositionSurfaceFactory,
    IDCompositionTarget, IDCompositionVirtualSurface, IDCompositionVisual2,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_ALPHA_MODE_PREMULTIPLIED, DXGI_FORMAT_B8G8R8A8_UNORM,
};

use super::NativeResultExt;
use crate::com::Com;
use crate::compositor::types::{FrameSize, NativeResult, OffsetPoint, WindowHandle};

/// Create a desktop composition device that renders through the D2D device.
pub fn create_device(
    d2d_device: &Com<ID2D1Device1>,
) -> NativeResult<Com<IDCompositionDesktopDevice>> {
    let d2d_device = d2d_device.require("DCompositionCreateDevice3")?;
    let device: IDCompositionDesktopDevice =
        unsafe { DCompositionCreateDevice3(d2d_device) }.native("DCompositionCreateDevice3")?;
    Ok(Com::from_interface(device))
}

/// Bind a composition target to the window.
pub fn create_target(
    device: &Com<IDCompositionDesktopDevice>,
    window: WindowHandle,
    topmost: bool,
) -> NativeResult<Com<IDCompositionTarget>> {
    let device = device.require("CreateTargetForHwnd")?;
    let hwnd = HWND(window.0 as *mut _);
    let target = unsafe { device.CreateTargetForHwnd(hwnd, topmost) }.native("CreateTargetForHwnd")?;
    Ok(Com::from_interface(target))
}

pub fn create_visual(
    device: &Com<IDCompositionDesktopDevice>,
) -> NativeResult<Com<IDCompositionVisual2>> {
    let device = device.require("CreateVisual")?;
    let visual = unsafe { device.CreateVisual() }.native("CreateVisual")?;
    Ok(Com::from_interface(visual))
}

pub fn create_surface_factory(
    device: &Com<IDCompositionDesktopDevice>,
    d2d_device: &Com<ID2D1Device1>,
) -> NativeResult<Com<IDCompositionSurfaceFactory>> {
    let device = device.require("CreateSurfaceFactory")?;
    let d2d_device = d2d_device.require("CreateSurfaceFactory")?;
    let factory = unsafe { device.CreateSurfaceFactory(d2d_device) }.native("CreateSurfaceFactory")?;
    Ok(Com::from_interface(factory))
}

/// Create a BGRA virtual surface with premultiplied alpha.
pub fn create_surface(
    factory: &Com<IDCompositionSurfaceFactory>,
    size: FrameSize,
) -> NativeResult<Com<IDCompositionVirtualSurface>> {
    let factory = factory.require("CreateVirtualSurface")?;
    let surface = unsafe {
        factory.CreateVirtualSurface(
            size.width,
            size.height,
            DXGI_FORMAT_B8G8R8A8_UNORM,
            DXGI_ALPHA_MODE_PREMULTIPLIED,
        )
    }
    .native("CreateVirtualSurface")?;
    Ok(Com::from_interface(surface))
}

pub fn set_content(
    visual: &Com<IDCompositionVisual2>,
    surface: &Com<IDCompositionVirtualSurface>,
) -> NativeResult<()> {
    let visual = visual.require("SetContent")?;
    let surface = surface.require("SetContent")?;
    unsafe { visual.SetContent(surface) }.native("SetContent")
}

pub fn set_root(
    target: &Com<IDCompositionTarget>,
    visual: &Com<IDCompositionVisual2>,
) -> NativeResult<()> {
    let target = target.require("SetRoot")?;
    let visual = visual.require("SetRoot")?;
    unsafe { target.SetRoot(visual) }.native("SetRoot")
}

pub fn commit(device: &Com<IDCompositionDesktopDevice>) -> NativeResult<()> {
    let device = device.require("Commit")?;
    unsafe { device.Commit() }.native("Commit")
}

pub fn resize(surface: &Com<IDCompositionVirtualSurface>, size: FrameSize) -> NativeResult<()> {
    let surface = surface.require("Resize")?;
    unsafe { surface.Resize(size.width, size.height) }.native("Resize")
}

/// Begin drawing over the whole surface.
///
/// Returns the D2D context and the offset of the update region in the
/// surface's atlas.
pub fn begin_draw(
    surface: &Com<IDCompositionVirtualSurface>,
) -> NativeResult<(Com<ID2D1DeviceContext>, OffsetPoint)> {
    let surface = surface.require("BeginDraw")?;
    let mut offset = POINT::default();
    let context: ID2D1DeviceContext =
        unsafe { surface.BeginDraw(None, &mut offset) }.native("BeginDraw")?;
    Ok((Com::from_interface(context), OffsetPoint::new(offset.x, offset.y)))
}

pub fn end_draw(surface: &Com<IDCompositionVirtualSurface>) -> NativeResult<()> {
    let surface = surface.require("EndDraw")?;
    unsafe { surface.EndDraw() }.native("EndDraw")
}
