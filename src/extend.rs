//! The `sbrk`-equivalent growth primitive, and heap bounds, that the
//! embedder supplies.
//!
//! THE CORE never grows its own backing memory; it only asks `HeapExtender`
//! for more of it. A real embedder backs this trait with whatever platform
//! primitive it has (a kernel's page allocator, a hosted `sbrk`, a static
//! arena bump pointer); this crate ships only the `std`-only [`VecHeap`]
//! test double used by its own test suite, the same role the original lab's
//! `memlib.c` plays for the reference implementation.

use core::ptr::NonNull;

/// Supplies the allocator with more heap and reports the region's bounds.
///
/// `n` passed to [`HeapExtender::extend`] is always a multiple of 16; the
/// implementation only needs to hand back a pointer to `n` freshly
/// available bytes immediately following the previously returned region.
pub trait HeapExtender {
    /// Grows the managed region by `n` bytes, returning the address of the
    /// newly available range, or `None` if the embedder has no more memory
    /// to give.
    fn extend(&mut self, n: usize) -> Option<NonNull<u8>>;

    /// Inclusive low bound of the currently managed region.
    fn heap_lo(&self) -> usize;

    /// Inclusive high bound of the currently managed region.
    fn heap_hi(&self) -> usize;
}

/// A `std`-backed [`HeapExtender`] used only by this crate's own tests.
///
/// Backed by a `Vec<u8>` that never reallocates in place: each `extend`
/// call grows the vector and returns the address of the newly appended
/// tail, so pointers handed out earlier stay valid for the lifetime of the
/// `VecHeap`.
#[cfg(any(test, feature = "test-util"))]
pub struct VecHeap {
    bytes: std::vec::Vec<u8>,
    capacity: usize,
}

#[cfg(any(test, feature = "test-util"))]
impl VecHeap {
    /// Reserves enough backing storage up front that `extend` never
    /// triggers a `Vec` reallocation, which would invalidate pointers this
    /// crate has already handed back to its caller.
    pub fn new() -> Self {
        Self::with_capacity(64 * 1024 * 1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut bytes = std::vec::Vec::with_capacity(capacity + 16);
        // `Vec<u8>`'s backing allocation is only guaranteed `align_of::<u8>()`
        // (1), but every address this crate hands out must be 16-aligned.
        // Pad up front so the logical heap origin — where `extend`'s first
        // call starts counting from — sits on a 16-byte boundary; every
        // later `extend` call only ever adds a multiple of 16, so alignment
        // holds for the life of the heap.
        let base = bytes.as_ptr() as usize;
        let pad = (16 - base % 16) % 16;
        bytes.resize(pad, 0);
        Self { bytes, capacity }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Default for VecHeap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl HeapExtender for VecHeap {
    fn extend(&mut self, n: usize) -> Option<NonNull<u8>> {
        let old_len = self.bytes.len();
        if old_len + n > self.capacity {
            return None;
        }
        self.bytes.resize(old_len + n, 0);
        let addr = unsafe { self.bytes.as_mut_ptr().add(old_len) };
        NonNull::new(addr)
    }

    fn heap_lo(&self) -> usize {
        self.bytes.as_ptr() as usize
    }

    fn heap_hi(&self) -> usize {
        self.bytes.as_ptr() as usize + self.bytes.len().saturating_sub(1)
    }
}
