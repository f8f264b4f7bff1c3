//! Reference-counted handles over native COM-style objects.
//!
//! `ComPtr<T>` owns at most one reference on the object it points to. The
//! reference is released exactly once: on `release`, on replacement via
//! `attach`/`release_and_get_address_of`, or on drop. `detach` hands the
//! reference out without touching the count.
//!
//! The pointee type decides how the count is adjusted through [`RefCounted`];
//! [`Queryable`] adds the capability query used by [`ComPtr::convert_to`].

#[cfg(windows)]
mod native;

#[cfg(windows)]
pub use native::{Com, Native};

use std::fmt;
use std::ptr::{self, NonNull};

use crate::compositor::types::{HResult, E_POINTER, S_OK};

/// A native object whose lifetime is governed by an intrusive reference count.
///
/// # Safety
/// Implementors must only be reached through pointers to live objects, and
/// `add_ref`/`release` must adjust that object's count by exactly one.
pub unsafe trait RefCounted {
    /// Increment the count. Returns the new count.
    ///
    /// # Safety
    /// `this` must point to a live object.
    unsafe fn add_ref(this: NonNull<Self>) -> u32;

    /// Decrement the count. Returns the new count.
    ///
    /// # Safety
    /// `this` must point to a live object on which the caller owns a reference.
    unsafe fn release(this: NonNull<Self>) -> u32;
}

/// Capability query from `Self` to interface `U`.
///
/// # Safety
/// On success, `*out` must hold a pointer that already carries one reference
/// owned by the caller. On failure, `*out` must be null.
pub unsafe trait Queryable<U: RefCounted>: RefCounted {
    /// # Safety
    /// `this` must point to a live object and `out` must be writable.
    unsafe fn query(this: NonNull<Self>, out: *mut *mut U) -> HResult;
}

/// Owning, move-only handle to a reference-counted native object.
#[repr(transparent)]
pub struct ComPtr<T: RefCounted> {
    ptr: *mut T,
}

impl<T: RefCounted> ComPtr<T> {
    /// An empty handle.
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
        }
    }

    /// Wrap `raw`, taking a new reference on it. Null yields an empty handle.
    ///
    /// # Safety
    /// `raw` must be null or point to a live object.
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        if let Some(nn) = NonNull::new(raw) {
            T::add_ref(nn);
        }
        Self { ptr: raw }
    }

    /// Release the held object, then store `raw` without incrementing it.
    ///
    /// Used for pointers that already carry a reference owned by the caller,
    /// typically the result of a create or query call.
    ///
    /// # Safety
    /// `raw` must be null or point to a live object whose reference is
    /// transferred to this handle.
    pub unsafe fn attach(&mut self, raw: *mut T) {
        if let Some(old) = NonNull::new(self.ptr) {
            let remaining = T::release(old);
            debug_assert!(remaining != 0 || old.as_ptr() != raw);
        }
        self.ptr = raw;
    }

    /// Hand out the raw pointer and clear the handle. The count is unchanged.
    #[must_use = "the detached pointer still owns a reference"]
    pub fn detach(&mut self) -> *mut T {
        std::mem::replace(&mut self.ptr, ptr::null_mut())
    }

    /// Drop the held reference, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(nn) = NonNull::new(self.detach()) {
            // SAFETY: the handle owned exactly this reference.
            unsafe {
                T::release(nn);
            }
        }
    }

    /// Query the held object for `U` and store the result in `out`.
    ///
    /// On success `out` owns the freshly-referenced `U`; on failure `out` is
    /// left empty. An empty handle reports `E_POINTER`.
    pub fn convert_to<U: RefCounted>(&self, out: &mut ComPtr<U>) -> HResult
    where
        T: Queryable<U>,
    {
        let Some(nn) = NonNull::new(self.ptr) else {
            out.release();
            return E_POINTER;
        };

        let mut raw: *mut U = ptr::null_mut();
        // SAFETY: nn is live while we hold our reference; raw is a local out slot.
        let result = unsafe { T::query(nn, &mut raw) };
        if result.is_ok() {
            // SAFETY: a successful query hands us one owned reference.
            unsafe { out.attach(raw) };
            S_OK
        } else {
            out.release();
            result
        }
    }

    /// `convert_to` returning a new handle.
    pub fn cast<U: RefCounted>(&self) -> Result<ComPtr<U>, HResult>
    where
        T: Queryable<U>,
    {
        let mut out = ComPtr::null();
        let result = self.convert_to(&mut out);
        if result.is_ok() {
            Ok(out)
        } else {
            Err(result)
        }
    }

    /// Release the held object and expose the slot for a creation call to fill.
    ///
    /// Whatever the callee writes is owned by this handle afterwards.
    pub fn release_and_get_address_of(&mut self) -> *mut *mut T {
        self.release();
        &mut self.ptr
    }

    /// The raw pointer, without affecting the count.
    pub fn as_raw(&self) -> *mut T {
        self.ptr
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl<T: RefCounted> Default for ComPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted> Clone for ComPtr<T> {
    /// Takes an additional reference.
    fn clone(&self) -> Self {
        // SAFETY: our own pointer is null or live.
        unsafe { Self::from_raw(self.ptr) }
    }
}

impl<T: RefCounted> Drop for ComPtr<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: RefCounted> fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComPtr").field(&self.ptr).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::types::E_NOINTERFACE;
    use std::cell::Cell;

    /// Heap object with a visible count. Never freed by `release` so tests can inspect it.
    struct Counted {
        refs: Cell<u32>,
        supports_other: bool,
    }

    struct Other {
        refs: Cell<u32>,
    }

    unsafe impl RefCounted for Counted {
        unsafe fn add_ref(this: NonNull<Self>) -> u32 {
            let refs = &this.as_ref().refs;
            refs.set(refs.get() + 1);
            refs.get()
        }

        unsafe fn release(this: NonNull<Self>) -> u32 {
            let refs = &this.as_ref().refs;
            refs.set(refs.get() - 1);
            refs.get()
        }
    }

    unsafe impl RefCounted for Other {
        unsafe fn add_ref(this: NonNull<Self>) -> u32 {
            let refs = &this.as_ref().refs;
            refs.set(refs.get() + 1);
            refs.get()
        }

        unsafe fn release(this: NonNull<Self>) -> u32 {
            let refs = &this.as_ref().refs;
            refs.set(refs.get() - 1);
            refs.get()
        }
    }

    thread_local! {
        static OTHER: Other = const { Other { refs: Cell::new(0) } };
    }

    unsafe impl Queryable<Other> for Counted {
        unsafe fn query(this: NonNull<Self>, out: *mut *mut Other) -> HResult {
            if this.as_ref().supports_other {
                OTHER.with(|other| {
                    other.refs.set(other.refs.get() + 1);
                    *out = other as *const Other as *mut Other;
                });
                S_OK
            } else {
                *out = ptr::null_mut();
                E_NOINTERFACE
            }
        }
    }

    fn object(initial: u32) -> Box<Counted> {
        Box::new(Counted {
            refs: Cell::new(initial),
            supports_other: true,
        })
    }

    fn other_refs() -> u32 {
        OTHER.with(|other| other.refs.get())
    }

    #[test]
    fn from_raw_increments_once() {
        let obj = object(1);
        let raw = &*obj as *const Counted as *mut Counted;
        let handle = unsafe { ComPtr::from_raw(raw) };
        assert_eq!(obj.refs.get(), 2);
        drop(handle);
        assert_eq!(obj.refs.get(), 1);
    }

    #[test]
    fn from_null_is_empty() {
        let handle: ComPtr<Counted> = unsafe { ComPtr::from_raw(ptr::null_mut()) };
        assert!(handle.is_null());
    }

    #[test]
    fn attach_does_not_increment() {
        let obj = object(1);
        let raw = &*obj as *const Counted as *mut Counted;
        let mut handle = ComPtr::null();
        unsafe { handle.attach(raw) };
        assert_eq!(obj.refs.get(), 1);
        handle.release();
        assert_eq!(obj.refs.get(), 0);
    }

    #[test]
    fn attach_releases_previous_object() {
        let first = object(1);
        let second = object(1);
        let mut handle = unsafe { ComPtr::from_raw(&*first as *const Counted as *mut Counted) };
        assert_eq!(first.refs.get(), 2);

        unsafe { handle.attach(&*second as *const Counted as *mut Counted) };
        assert_eq!(first.refs.get(), 1);
        assert_eq!(second.refs.get(), 1);

        let _ = handle.detach();
    }

    #[test]
    fn detach_leaves_count_untouched() {
        let obj = object(1);
        let raw = &*obj as *const Counted as *mut Counted;
        let mut handle = unsafe { ComPtr::from_raw(raw) };
        let out = handle.detach();
        assert_eq!(out, raw);
        assert!(handle.is_null());
        drop(handle);
        assert_eq!(obj.refs.get(), 2);
    }

    #[test]
    fn double_release_is_noop() {
        let obj = object(1);
        let mut handle = unsafe { ComPtr::from_raw(&*obj as *const Counted as *mut Counted) };
        handle.release();
        handle.release();
        drop(handle);
        assert_eq!(obj.refs.get(), 1);
    }

    #[test]
    fn clone_takes_its_own_reference() {
        let obj = object(1);
        let handle = unsafe { ComPtr::from_raw(&*obj as *const Counted as *mut Counted) };
        let copy = handle.clone();
        assert_eq!(obj.refs.get(), 3);
        drop(handle);
        drop(copy);
        assert_eq!(obj.refs.get(), 1);
    }

    #[test]
    fn convert_to_success_owns_result() {
        let obj = object(1);
        let handle = unsafe { ComPtr::from_raw(&*obj as *const Counted as *mut Counted) };
        let before = other_refs();

        let mut out: ComPtr<Other> = ComPtr::null();
        assert_eq!(handle.convert_to(&mut out), S_OK);
        assert!(!out.is_null());
        assert_eq!(other_refs(), before + 1);
        // Source count is unaffected by the query.
        assert_eq!(obj.refs.get(), 2);

        drop(out);
        assert_eq!(other_refs(), before);
    }

    #[test]
    fn convert_to_failure_leaves_output_empty() {
        let obj = Box::new(Counted {
            refs: Cell::new(1),
            supports_other: false,
        });
        let handle = unsafe { ComPtr::from_raw(&*obj as *const Counted as *mut Counted) };
        let mut out: ComPtr<Other> = ComPtr::null();
        assert_eq!(handle.convert_to(&mut out), E_NOINTERFACE);
        assert!(out.is_null());
        assert!(handle.cast::<Other>().is_err());
    }

    #[test]
    fn convert_from_empty_handle_reports_pointer_error() {
        let handle: ComPtr<Counted> = ComPtr::null();
        let mut out: ComPtr<Other> = ComPtr::null();
        assert_eq!(handle.convert_to(&mut out), E_POINTER);
    }

    #[test]
    fn release_and_get_address_of_releases_first() {
        let old = object(1);
        let fresh = object(1);
        let mut handle = unsafe { ComPtr::from_raw(&*old as *const Counted as *mut Counted) };

        let slot = handle.release_and_get_address_of();
        assert_eq!(old.refs.get(), 1);
        // Simulate a creation call writing an already-referenced pointer.
        unsafe { *slot = &*fresh as *const Counted as *mut Counted };
        assert_eq!(fresh.refs.get(), 1);

        drop(handle);
        assert_eq!(fresh.refs.get(), 0);
    }

    #[test]
    fn net_count_over_mixed_sequence() {
        let obj = object(1);
        let raw = &*obj as *const Counted as *mut Counted;

        let mut a = unsafe { ComPtr::from_raw(raw) }; // +1
        let mut b = ComPtr::null();
        unsafe { b.attach(a.detach()) }; // 0
        let c = unsafe { ComPtr::from_raw(b.as_raw()) }; // +1
        b.release(); // -1
        b.release(); // 0
        a.release(); // 0 (empty)

        assert_eq!(obj.refs.get(), 2);
        drop(c); // -1
        assert_eq!(obj.refs.get(), 1);
    }
}
