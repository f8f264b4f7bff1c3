//! Direct2D factory, device and per-frame drawing.

use windows::Foundation::Numerics::Vector2;
use windows::Win32::Graphics::Direct2D::Common::{D2D1_COMPOSITE_MODE, D2D_RECT_F};
use windows::Win32::Graphics::Direct2D::{
    D2D1CreateFactory, ID2D1Device1, ID2D1DeviceContext, ID2D1Effect, ID2D1Factory2,
    D2D1_FACTORY_TYPE_SINGLE_THREADED, D2D1_INTERPOLATION_MODE_LINEAR,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;

use super::effect;
use super::NativeResultExt;
use crate::com::Com;
use crate::compositor::types::{CompositeMode, FrameSize, NativeResult, OffsetPoint};
use crate::shader::ShaderConstants;

/// Create the single-threaded D2D factory.
pub fn create_factory() -> NativeResult<Com<ID2D1Factory2>> {
    let factory: ID2D1Factory2 = unsafe { D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, None) }
        .native("D2D1CreateFactory")?;
    Ok(Com::from_interface(factory))
}

/// Create a D2D device on top of the DXGI device.
pub fn create_device(
    factory: &Com<ID2D1Factory2>,
    dxgi_device: &Com<IDXGIDevice>,
) -> NativeResult<Com<ID2D1Device1>> {
    let factory = factory.require("ID2D1Factory2::CreateDevice")?;
    let dxgi_device = dxgi_device.require("ID2D1Factory2::CreateDevice")?;
    let device = unsafe { factory.CreateDevice(dxgi_device) }.native("ID2D1Factory2::CreateDevice")?;
    Ok(Com::from_interface(device))
}

/// Clear to fully transparent.
pub fn clear(context: &Com<ID2D1DeviceContext>) -> NativeResult<()> {
    let context = context.require("ID2D1DeviceContext::Clear")?;
    unsafe { context.Clear(None) };
    Ok(())
}

/// Raw `D2D1_PRIMITIVE_BLEND` of the context.
pub fn primitive_blend(context: &Com<ID2D1DeviceContext>) -> NativeResult<u32> {
    let context = context.require("ID2D1DeviceContext::GetPrimitiveBlend")?;
    Ok(unsafe { context.GetPrimitiveBlend() }.0 as u32)
}

/// Create a fresh shader effect, hand it the frame's constants and draw its
/// output at `offset`.
pub fn draw_effect(
    context: &Com<ID2D1DeviceContext>,
    constants: &ShaderConstants,
    offset: OffsetPoint,
    size: FrameSize,
    mode: CompositeMode,
) -> NativeResult<()> {
    let context = context.require("ID2D1DeviceContext::DrawImage")?;

    effect::stage_constants(*constants);

    let effect: ID2D1Effect =
        unsafe { context.CreateEffect(&effect::clsid()) }.native("ID2D1DeviceContext::CreateEffect")?;
    let image = unsafe { effect.GetOutput() }.native("ID2D1Effect::GetOutput")?;

    let target_offset = Vector2 {
        X: offset.x as f32,
        Y: offset.y as f32,
    };
    let source = D2D_RECT_F {
        left: 0.0,
        top: 0.0,
        right: size.width as f32,
        bottom: size.height as f32,
    };

    unsafe {
        context.DrawImage(
            &image,
            Some(&target_offset),
            Some(&source),
            D2D1_INTERPOLATION_MODE_LINEAR,
            D2D1_COMPOSITE_MODE(mode.raw()),
        );
    }

    Ok(())
}

