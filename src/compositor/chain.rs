//! Device chain construction and teardown.
//!
//! The chain is nine strictly dependent resources. It is built in one pass
//! and released as a whole; it is never patched in place.
//!
//! # Release order
//!
//! Struct fields are dropped in declaration order and local variables in
//! reverse order of declaration. `DeviceChain` declares its fields in release
//! order, and `build` holds the in-progress resources in locals, so both a
//! complete chain and one abandoned halfway release in exact reverse of
//! construction.

use crate::error::{DcompShaderError, DcompShaderResult};

use super::backend::CompositionBackend;
use super::types::{DriverType, FrameSize, NativeError, WindowHandle};

/// The complete, committed device chain.
// Most fields are only held to keep the resource alive.
#[allow(dead_code)]
pub struct DeviceChain<B: CompositionBackend> {
    // Declared in release order.
    surface: B::Surface,
    surface_factory: B::SurfaceFactory,
    visual: B::Visual,
    target: B::Target,
    composition_device: B::CompositionDevice,
    drawing_device: B::DrawingDevice,
    factory: B::Factory,
    view: B::DeviceView,
    device: B::Device,
}

impl<B: CompositionBackend> DeviceChain<B> {
    /// Build every resource in dependency order and commit the visual tree.
    ///
    /// The first failing step aborts the rest; anything already created is
    /// released before the error is returned. Every failure here is fatal,
    /// including device-loss codes.
    pub fn build(
        backend: &mut B,
        window: WindowHandle,
        size: FrameSize,
    ) -> DcompShaderResult<Self> {
        log::info!(
            "[CHAIN] Building device chain for window {:#x} at {}x{}",
            window.0,
            size.width,
            size.height
        );

        let device = create_device_with_fallback(backend)?;
        let view = backend.device_view(&device).map_err(fatal)?;
        let factory = backend.create_factory().map_err(fatal)?;
        let drawing_device = backend
            .create_drawing_device(&factory, &view)
            .map_err(fatal)?;
        let composition_device = backend
            .create_composition_device(&drawing_device)
            .map_err(fatal)?;

        backend.register_effect(&factory).map_err(fatal)?;

        let target = backend
            .create_target(&composition_device, window, true)
            .map_err(fatal)?;
        let visual = backend.create_visual(&composition_device).map_err(fatal)?;
        let surface_factory = backend
            .create_surface_factory(&composition_device, &drawing_device)
            .map_err(fatal)?;
        let surface = backend
            .create_surface(&surface_factory, size)
            .map_err(fatal)?;

        backend.set_content(&visual, &surface).map_err(fatal)?;
        backend.set_root(&target, &visual).map_err(fatal)?;
        backend.commit(&composition_device).map_err(fatal)?;

        log::info!("[CHAIN] Device chain ready");

        Ok(Self {
            surface,
            surface_factory,
            visual,
            target,
            composition_device,
            drawing_device,
            factory,
            view,
            device,
        })
    }

    /// Release every resource, in reverse construction order.
    pub fn dispose(self) {
        log::info!("[CHAIN] Releasing device chain");
        drop(self);
    }

    pub fn surface(&self) -> &B::Surface {
        &self.surface
    }

    pub fn composition_device(&self) -> &B::CompositionDevice {
        &self.composition_device
    }
}

/// Hardware first, then exactly one software attempt with the same flags.
fn create_device_with_fallback<B: CompositionBackend>(
    backend: &mut B,
) -> DcompShaderResult<B::Device> {
    match backend.create_device(DriverType::Hardware) {
        Ok(device) => Ok(device),
        Err(hardware) => {
            log::warn!(
                "[CHAIN] Hardware device creation failed ({}), falling back to WARP",
                hardware.code
            );
            backend
                .create_device(DriverType::Warp)
                .map_err(|software| DcompShaderError::DeviceCreation {
                    hardware: hardware.code,
                    software: software.code,
                })
        }
    }
}

fn fatal(err: NativeError) -> DcompShaderError {
    DcompShaderError::Native {
        context: err.context,
        code: err.code,
    }
}
