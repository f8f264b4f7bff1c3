//! Custom Direct2D effect running the procedural pixel shader.
//!
//! The effect has no inputs and a single draw transform. Its constant buffer
//! is staged on the drawing thread right before the effect is drawn and
//! picked up in `PrepareForRender`; the single-threaded factory calls back
//! on that same thread.

use std::cell::Cell;
use std::ffi::CString;
use std::sync::OnceLock;

use parking_lot::Mutex;
use windows::core::{implement, IUnknown, IUnknownImpl, Result, GUID, HRESULT, PCSTR, PCWSTR};
use windows::Win32::Foundation::{E_NOTIMPL, E_POINTER, RECT, S_OK};
use windows::Win32::Graphics::Direct2D::{
    ID2D1DrawInfo, ID2D1DrawTransform, ID2D1DrawTransform_Impl, ID2D1EffectContext,
    ID2D1EffectImpl, ID2D1EffectImpl_Impl, ID2D1Factory2, ID2D1TransformGraph,
    ID2D1TransformNode_Impl, ID2D1Transform_Impl, D2D1_CHANGE_TYPE, D2D1_PIXEL_OPTIONS_NONE,
};
use windows::Win32::Graphics::Direct3D::Fxc::{D3DCompile, D3DCOMPILE_ENABLE_STRICTNESS};
use windows::Win32::Graphics::Direct3D::ID3DBlob;

use super::NativeResultExt;
use crate::com::Com;
use crate::compositor::types::{NativeError, NativeResult, E_FAIL};
use crate::shader::{
    ShaderConstants, EFFECT_CLSID, EFFECT_XML, PIXEL_SHADER_ENTRY, PIXEL_SHADER_HLSL,
    PIXEL_SHADER_ID, PIXEL_SHADER_TARGET,
};

thread_local! {
    static STAGED_CONSTANTS: Cell<ShaderConstants> = Cell::new(ShaderConstants::default());
}

static BYTECODE: OnceLock<Vec<u8>> = OnceLock::new();

pub fn clsid() -> GUID {
    GUID::from_u128(EFFECT_CLSID)
}

fn shader_id() -> GUID {
    GUID::from_u128(PIXEL_SHADER_ID)
}

/// Constants the next effect instance will render with.
pub fn stage_constants(constants: ShaderConstants) {
    STAGED_CONSTANTS.with(|staged| staged.set(constants));
}

fn staged_constants() -> ShaderConstants {
    STAGED_CONSTANTS.with(Cell::get)
}

// ============================================================================
// Registration
// ============================================================================

/// Compile the shader (once per process) and register the effect with `factory`.
pub fn register(factory: &Com<ID2D1Factory2>) -> NativeResult<()> {
    compiled_shader()?;

    let factory = factory.require("RegisterEffectFromString")?;
    let xml: Vec<u16> = EFFECT_XML.encode_utf16().chain(std::iter::once(0)).collect();

    unsafe {
        factory.RegisterEffectFromString(
            &clsid(),
            PCWSTR(xml.as_ptr()),
            None,
            Some(create_effect),
        )
    }
    .native("RegisterEffectFromString")
}

unsafe extern "system" fn create_effect(effect_impl: *mut Option<IUnknown>) -> HRESULT {
    if effect_impl.is_null() {
        return E_POINTER;
    }
    let effect: IUnknown = ShaderEffect::default().into();
    effect_impl.write(Some(effect));
    S_OK
}

fn compiled_shader() -> NativeResult<&'static [u8]> {
    if let Some(bytecode) = BYTECODE.get() {
        return Ok(bytecode);
    }
    let bytecode = compile_shader()?;
    Ok(BYTECODE.get_or_init(|| bytecode))
}

fn compile_shader() -> NativeResult<Vec<u8>> {
    let entry = CString::new(PIXEL_SHADER_ENTRY).map_err(|_| NativeError::new("D3DCompile", E_FAIL))?;
    let target = CString::new(PIXEL_SHADER_TARGET).map_err(|_| NativeError::new("D3DCompile", E_FAIL))?;

    let mut blob: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;

    let result = unsafe {
        D3DCompile(
            PIXEL_SHADER_HLSL.as_ptr().cast(),
            PIXEL_SHADER_HLSL.len(),
            PCSTR::null(),
            None,
            None,
            PCSTR(entry.as_ptr().cast()),
            PCSTR(target.as_ptr().cast()),
            D3DCOMPILE_ENABLE_STRICTNESS,
            0,
            &mut blob,
            Some(&mut errors),
        )
    };

    if let Err(err) = result {
        if let Some(errors) = errors {
            log::error!("[CHAIN] Pixel shader compilation failed: {}", blob_text(&errors));
        }
        return Err(NativeError::new("D3DCompile", err.code().into()));
    }

    let blob = blob.ok_or_else(|| NativeError::new("D3DCompile", E_POINTER.into()))?;
    Ok(blob_bytes(&blob).to_vec())
}

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer().cast::<u8>(), blob.GetBufferSize()) }
}

fn blob_text(blob: &ID3DBlob) -> String {
    String::from_utf8_lossy(blob_bytes(blob)).trim_end_matches('\0').to_string()
}

// ============================================================================
// Effect Implementation
// ============================================================================

fn null_argument() -> windows::core::Error {
    E_POINTER.into()
}

#[implement(ID2D1EffectImpl, ID2D1DrawTransform)]
#[derive(Default)]
struct ShaderEffect {
    draw_info: Mutex<Option<ID2D1DrawInfo>>,
}

impl ID2D1EffectImpl_Impl for ShaderEffect_Impl {
    fn Initialize(
        &self,
        effectcontext: Option<&ID2D1EffectContext>,
        transformgraph: Option<&ID2D1TransformGraph>,
    ) -> Result<()> {
        let context = effectcontext.ok_or_else(null_argument)?;
        let graph = transformgraph.ok_or_else(null_argument)?;

        let bytecode = BYTECODE.get().ok_or_else(null_argument)?;
        unsafe { context.LoadPixelShader(&shader_id(), bytecode)? };

        let transform: ID2D1DrawTransform = self.to_object().to_interface();
        unsafe { graph.SetSingleTransformNode(&transform) }
    }

    fn PrepareForRender(&self, _changetype: D2D1_CHANGE_TYPE) -> Result<()> {
        let draw_info = self.draw_info.lock();
        let Some(draw_info) = draw_info.as_ref() else {
            return Err(E_POINTER.into());
        };
        let constants = staged_constants();
        unsafe { draw_info.SetPixelShaderConstantBuffer(constants.as_bytes()) }
    }

    fn SetGraph(&self, _transformgraph: Option<&ID2D1TransformGraph>) -> Result<()> {
        Err(E_NOTIMPL.into())
    }
}

impl ID2D1TransformNode_Impl for ShaderEffect_Impl {
    fn GetInputCount(&self) -> u32 {
        0
    }
}

impl ID2D1Transform_Impl for ShaderEffect_Impl {
    fn MapOutputRectToInputRects(
        &self,
        _outputrect: *const RECT,
        _inputrects: *mut RECT,
        _inputrectscount: u32,
    ) -> Result<()> {
        Ok(())
    }

    fn MapInputRectsToOutputRect(
        &self,
        _inputrects: *const RECT,
        _inputopaquesubrects: *const RECT,
        _inputrectcount: u32,
        outputrect: *mut RECT,
        outputopaquesubrect: *mut RECT,
    ) -> Result<()> {
        if outputrect.is_null() || outputopaquesubrect.is_null() {
            return Err(E_POINTER.into());
        }
        // A source effect: infinite output, nothing known to be opaque.
        unsafe {
            *outputrect = RECT {
                left: i32::MIN,
                top: i32::MIN,
                right: i32::MAX,
                bottom: i32::MAX,
            };
            *outputopaquesubrect = RECT::default();
        }
        Ok(())
    }

    fn MapInvalidRect(&self, _inputindex: u32, invalidinputrect: &RECT) -> Result<RECT> {
        Ok(*invalidinputrect)
    }
}

impl ID2D1DrawTransform_Impl for ShaderEffect_Impl {
    fn SetDrawInfo(&self, drawinfo: Option<&ID2D1DrawInfo>) -> Result<()> {
        let drawinfo = drawinfo.ok_or_else(null_argument)?;
        unsafe { drawinfo.SetPixelShader(&shader_id(), D2D1_PIXEL_OPTIONS_NONE)? };
        *self.draw_info.lock() = Some(drawinfo.clone());
        Ok(())
    }
}
