//! `ComPtr` over `windows-rs` interface pointers.
//!
//! `Native<I>` is never constructed; a `*mut Native<I>` is simply the raw
//! interface pointer of `I`, so reference counting goes straight through the
//! `IUnknown` vtable every COM interface starts with.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use windows_core::{IUnknown_Vtbl, Interface};

use super::{ComPtr, Queryable, RefCounted};
use crate::compositor::types::{HResult, NativeError, NativeResult, E_POINTER};

/// Opaque pointee standing in for interface `I`.
#[repr(C)]
pub struct Native<I> {
    _opaque: [u8; 0],
    _marker: PhantomData<I>,
}

/// Handle to a `windows-rs` interface.
pub type Com<I> = ComPtr<Native<I>>;

unsafe fn unknown_vtable<'a>(raw: *mut c_void) -> &'a IUnknown_Vtbl {
    &**(raw as *const *const IUnknown_Vtbl)
}

unsafe impl<I: Interface> RefCounted for Native<I> {
    unsafe fn add_ref(this: NonNull<Self>) -> u32 {
        let raw = this.as_ptr().cast::<c_void>();
        (unknown_vtable(raw).AddRef)(raw)
    }

    unsafe fn release(this: NonNull<Self>) -> u32 {
        let raw = this.as_ptr().cast::<c_void>();
        (unknown_vtable(raw).Release)(raw)
    }
}

unsafe impl<I: Interface, U: Interface> Queryable<Native<U>> for Native<I> {
    unsafe fn query(this: NonNull<Self>, out: *mut *mut Native<U>) -> HResult {
        let raw = this.as_ptr().cast::<c_void>();
        *out = std::ptr::null_mut();
        let hr = (unknown_vtable(raw).QueryInterface)(raw, &U::IID, out.cast());
        HResult(hr.0)
    }
}

impl<I: Interface> ComPtr<Native<I>> {
    /// Take ownership of the reference held by a `windows-rs` interface value.
    pub fn from_interface(interface: I) -> Self {
        let mut handle = Self::null();
        // SAFETY: into_raw transfers the interface's reference to us.
        unsafe { handle.attach(interface.into_raw().cast()) };
        handle
    }

    /// Borrow the held pointer as a `windows-rs` interface.
    pub fn interface(&self) -> Option<&I> {
        // SAFETY: ComPtr is repr(transparent) over the raw pointer.
        unsafe { I::from_raw_borrowed(&*(self as *const Self as *const *mut c_void)) }
    }

    /// Borrow the interface, failing with `E_POINTER` if the handle is empty.
    pub fn require(&self, context: &'static str) -> NativeResult<&I> {
        self.interface()
            .ok_or_else(|| NativeError::new(context, E_POINTER))
    }

    /// Out-parameter slot for `windows-rs` calls that write an `Option<I>`.
    pub fn out_param(&mut self) -> *mut Option<I> {
        self.release_and_get_address_of().cast()
    }
}
