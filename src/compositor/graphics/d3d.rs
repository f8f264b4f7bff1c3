//! Direct3D 11 device creation.
//!
//! The device is only used as the backing store for Direct2D and
//! DirectComposition, so it is created without an immediate context.

use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;

use super::NativeResultExt;
use crate::com::{Com, Native};
use crate::compositor::types::{DriverType, NativeError, NativeResult, E_POINTER};

fn driver_type(driver: DriverType) -> D3D_DRIVER_TYPE {
    match driver {
        DriverType::Hardware => D3D_DRIVER_TYPE_HARDWARE,
        DriverType::Warp => D3D_DRIVER_TYPE_WARP,
    }
}

/// Create a D3D11 device on the given driver tier.
///
/// BGRA support is required for Direct2D interop.
pub fn create_device(driver: DriverType) -> NativeResult<Com<ID3D11Device>> {
    let mut device = Com::<ID3D11Device>::null();

    unsafe {
        D3D11CreateDevice(
            None,
            driver_type(driver),
            None,
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(device.out_param()),
            None,
            None,
        )
        .native("D3D11CreateDevice")?;
    }

    if device.is_null() {
        return Err(NativeError::new("D3D11CreateDevice", E_POINTER));
    }
    Ok(device)
}

/// Query the DXGI view of a D3D11 device.
pub fn dxgi_device(device: &Com<ID3D11Device>) -> NativeResult<Com<IDXGIDevice>> {
    device
        .cast::<Native<IDXGIDevice>>()
        .map_err(|code| NativeError::new("QueryInterface(IDXGIDevice)", code))
}
