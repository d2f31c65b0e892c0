//! Process-wide allocator handle.
//!
//! Containers allocate through an [`AllocRef`] and default to the global
//! handle. The global instance is fixed at first use: either the built-in
//! [`AnsiAlloc`] or whatever [`set_global_alloc`] installed beforehand.

use core::ptr::NonNull;
use std::sync::OnceLock;

use super::{Allocator, AnsiAlloc};

/// Default global instance, used unless an override is installed.
static DEFAULT_ALLOC: AnsiAlloc = AnsiAlloc::new();

/// The installed global allocator.
static GLOBAL_ALLOC: OnceLock<&'static (dyn Allocator + Sync)> = OnceLock::new();

/// Install a custom global allocator.
///
/// Must be called before any container or pool touches the global handle;
/// returns `false` if the global instance was already fixed.
pub fn set_global_alloc(alloc: &'static (dyn Allocator + Sync)) -> bool {
    GLOBAL_ALLOC.set(alloc).is_ok()
}

/// The process-wide allocator handle.
#[must_use]
pub fn global_alloc() -> AllocRef {
    let alloc = *GLOBAL_ALLOC.get_or_init(|| &DEFAULT_ALLOC);
    AllocRef(alloc as &'static dyn Allocator)
}

/// Copyable handle to an allocator instance.
///
/// Every container stores one of these; two handles to the same instance
/// are interchangeable for alloc/dealloc pairing purposes.
#[derive(Clone, Copy)]
pub struct AllocRef(&'static dyn Allocator);

impl AllocRef {
    /// Wrap a specific allocator instance.
    pub const fn new(alloc: &'static dyn Allocator) -> Self {
        Self(alloc)
    }

    /// Handle to the process-wide allocator.
    #[must_use]
    pub fn global() -> Self {
        global_alloc()
    }

    /// Allocate through the referenced instance.
    #[inline]
    pub fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.0.alloc(size, align)
    }

    /// Free through the referenced instance.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`AllocRef::alloc`] on a handle to
    /// the same underlying instance, and not freed since.
    #[inline]
    pub unsafe fn dealloc(&self, ptr: NonNull<u8>) {
        // SAFETY: forwarded contract.
        unsafe { self.0.dealloc(ptr) }
    }

    /// Bytes currently handed out by the referenced instance.
    #[must_use]
    pub fn used_memory(&self) -> usize {
        self.0.used_memory()
    }
}

impl core::fmt::Debug for AllocRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "AllocRef({:p})", self.0 as *const dyn Allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trip() {
        let alloc = global_alloc();
        let ptr = alloc.alloc(32, 8).expect("global alloc");
        // SAFETY: ptr came from the same handle.
        unsafe { alloc.dealloc(ptr) };
    }

    #[test]
    fn handles_are_copyable() {
        let a = AllocRef::global();
        let b = a;
        let ptr = a.alloc(16, 8).expect("alloc");
        // SAFETY: `b` refers to the same instance as `a`.
        unsafe { b.dealloc(ptr) };
    }
}
