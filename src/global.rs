//! Process-wide allocator, for embedders that want a drop-in
//! `#[global_allocator]` instead of threading an `Allocator<E>` through
//! every call site.
//!
//! Grounded on the teacher crate's own `LockedBuddyAllocator` (a spinlock
//! around the allocator, `unsafe impl GlobalAlloc` forwarding into it) and
//! its `vmalloc` module's `OnceCell`-guarded kernel heap singleton: deferred
//! one-time initialization plus a lock, not a second algorithm.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use conquer_once::spin::OnceCell;
use spin::Mutex;

use crate::extend::HeapExtender;
use crate::Allocator;

/// A process-wide `Allocator<E>` behind a spinlock, installed once and then
/// usable as a `#[global_allocator]`.
///
/// Not initialized at construction: [`GlobalAllocHandle::install`] must run
/// before any allocation is attempted, since building an `Allocator<E>`
/// needs the embedder's concrete `E` value (its `sbrk`-equivalent), which
/// isn't available in a `const` context.
pub struct GlobalAllocHandle<E: HeapExtender> {
    inner: OnceCell<Mutex<Allocator<E>>>,
}

impl<E: HeapExtender> GlobalAllocHandle<E> {
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::uninit(),
        }
    }

    /// Installs `extender` as the backing heap source. Idempotent: a second
    /// call is ignored, matching `Allocator::init`'s own idempotence.
    pub fn install(&self, extender: E) {
        self.inner.init_once(|| Mutex::new(Allocator::new(extender)));
    }

    fn with_allocator<R>(&self, f: impl FnOnce(&mut Allocator<E>) -> R) -> R {
        let mut guard = self
            .inner
            .get()
            .expect("GlobalAllocHandle::install must run before any allocation")
            .lock();
        f(&mut guard)
    }

    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        self.with_allocator(|a| a.allocate(size))
    }

    pub fn dealloc(&self, ptr: Option<NonNull<u8>>) {
        self.with_allocator(|a| a.free(ptr));
    }

    pub fn realloc(&self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        self.with_allocator(|a| a.reallocate(ptr, size))
    }

    pub fn calloc(&self, n: usize, m: usize) -> Option<NonNull<u8>> {
        self.with_allocator(|a| a.zero_allocate(n, m))
    }
}

impl<E: HeapExtender> Default for GlobalAllocHandle<E> {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: every access goes through the inner `Mutex`, and `OnceCell` is
// itself `Sync` once initialized. The allocator algorithm stays
// single-mutator; this only lets "whichever thread holds the lock" be that
// mutator, per the crate's concurrency model.
unsafe impl<E: HeapExtender> GlobalAlloc for GlobalAllocHandle<E> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > 16 {
            return ptr::null_mut();
        }
        self.alloc(layout.size()).map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.dealloc(NonNull::new(ptr));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > 16 {
            return ptr::null_mut();
        }
        self.realloc(NonNull::new(ptr), new_size)
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}
