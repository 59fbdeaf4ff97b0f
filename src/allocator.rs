//! The allocate/free/reallocate front-end tying the codec, navigator,
//! free-list manager and coalescer together.

use core::ptr::{self, NonNull};

use log::debug;
#[cfg(feature = "checker")]
use log::{error, warn};

use crate::block::{self, Block};
use crate::coalesce;
use crate::config::{CHUNK_SIZE, DEFAULT_MAX_SEARCH, MIN_BLOCK_SIZE, NUM_CLASSES, WORD_SIZE};
use crate::extend::HeapExtender;
use crate::freelist::{get_class, FreeLists};
use crate::navigate;

fn round_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// A segregated free-list allocator over a single heap region, grown on
/// demand through an embedder-supplied [`HeapExtender`].
///
/// Not `Sync`: a single `Allocator` assumes a single mutator. The `global`
/// feature layers a lock around one to satisfy `GlobalAlloc`'s bound.
pub struct Allocator<E: HeapExtender> {
    extender: E,
    lists: FreeLists,
    heap_start: Option<NonNull<u8>>,
    max_search: usize,
}

impl<E: HeapExtender> Allocator<E> {
    pub fn new(extender: E) -> Self {
        Self::with_search_bound(extender, DEFAULT_MAX_SEARCH)
    }

    /// Like [`Self::new`], but with an explicit cap on how many free-list
    /// candidates `find_fit` inspects before settling for the best fit seen
    /// so far.
    pub fn with_search_bound(extender: E, max_search: usize) -> Self {
        Self {
            extender,
            lists: FreeLists::new(),
            heap_start: None,
            max_search,
        }
    }

    /// Places the prologue/epilogue sentinels and performs the first chunk
    /// extension. Idempotent: allocate() calls this lazily, so most callers
    /// never need to call it directly.
    pub fn init(&mut self) -> bool {
        self.lists = FreeLists::new();
        self.heap_start = None;

        let base = match self.extender.extend(2 * WORD_SIZE) {
            Some(b) => b,
            None => {
                debug!("heap init: initial extension failed");
                return false;
            }
        };
        unsafe {
            (base.as_ptr() as *mut u64).write(block::pack(0, true, true, false));
            let epilogue_addr = base.as_ptr().add(WORD_SIZE);
            (epilogue_addr as *mut u64).write(block::pack(0, true, true, false));
            self.heap_start = Some(NonNull::new_unchecked(epilogue_addr));
        }
        self.extend_heap(CHUNK_SIZE).is_some()
    }

    fn first_block_addr(&self) -> usize {
        self.heap_start.expect("heap not initialized").as_ptr() as usize
    }

    pub(crate) fn first_block(&self) -> Block {
        unsafe { Block::from_header_addr(self.heap_start.unwrap().as_ptr()) }
    }

    pub(crate) fn heap_lo(&self) -> usize {
        self.extender.heap_lo()
    }

    pub(crate) fn heap_hi(&self) -> usize {
        self.extender.heap_hi()
    }

    pub fn lists(&self) -> &FreeLists {
        &self.lists
    }

    /// Grows the heap by at least `size` bytes and coalesces the new chunk
    /// with whatever free tail preceded the old epilogue.
    fn extend_heap(&mut self, size: usize) -> Option<Block> {
        let size = round_up(size, MIN_BLOCK_SIZE);
        let new_region = self.extender.extend(size)?;
        let new_block = unsafe { Block::from_header_addr(new_region.as_ptr().sub(WORD_SIZE)) };

        // Reads the stale epilogue bits at this address before overwriting
        // them: the new block inherits whatever prev_alloc/prev_min the
        // epilogue it replaces was carrying.
        let prev_alloc = new_block.prev_alloc();
        let prev_min = new_block.prev_min();
        new_block.set_header(size as u64, false, prev_alloc, prev_min);
        new_block.write_footer();

        let new_epilogue =
            unsafe { Block::from_header_addr((new_block.addr() + size) as *mut u8) };
        new_epilogue.set_header(0, true, false, false);

        Some(coalesce::free_and_coalesce(
            new_block,
            self.first_block_addr(),
            &mut self.lists,
        ))
    }

    /// Bounded best-fit: scans up to `max_search` free-list entries,
    /// starting at the class `asize` maps to and moving to larger classes,
    /// tracking the smallest qualifying block seen.
    fn find_fit(&self, asize: u64) -> Option<Block> {
        let start_class = get_class(asize);
        let mut best: Option<Block> = None;
        let mut searched = 0usize;
        for class in start_class..NUM_CLASSES {
            for candidate in self.lists.iter_class(class) {
                if candidate.size() >= asize {
                    if best.map_or(true, |b| candidate.size() < b.size()) {
                        best = Some(candidate);
                    }
                    searched += 1;
                    if searched >= self.max_search {
                        return best;
                    }
                }
            }
        }
        best
    }

    /// Shrinks `block` (already marked allocated, sized `asize`... no —
    /// sized however large it was found) to `asize` if the remainder is at
    /// least a minimum block, handing the tail to the free-list manager.
    fn split_block(&mut self, block: Block, asize: u64) {
        let total = block.size();
        let remainder = total - asize;
        if remainder >= MIN_BLOCK_SIZE as u64 {
            block.set_header(asize, true, block.prev_alloc(), block.prev_min());
            let tail = unsafe { Block::from_header_addr((block.addr() + asize as usize) as *mut u8) };
            tail.set_header(remainder, false, true, asize == MIN_BLOCK_SIZE as u64);
            tail.write_footer();
            self.lists.insert(tail);

            let successor = navigate::next(tail);
            successor.set_header(
                successor.size(),
                successor.is_alloc(),
                false,
                remainder == MIN_BLOCK_SIZE as u64,
            );
            if !successor.is_alloc() && !successor.is_min() {
                successor.write_footer();
            }
        } else {
            block.set_header(total, true, block.prev_alloc(), block.prev_min());
            let successor = navigate::next(block);
            successor.set_header(
                successor.size(),
                successor.is_alloc(),
                true,
                total == MIN_BLOCK_SIZE as u64,
            );
            if !successor.is_alloc() && !successor.is_min() {
                successor.write_footer();
            }
        }
    }

    /// Returns a payload pointer with at least `size` usable bytes, or
    /// `None` if `size == 0` or the heap could not grow far enough.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        if self.heap_start.is_none() && !self.init() {
            return None;
        }
        if size == 0 {
            return None;
        }
        let asize = round_up(size + WORD_SIZE, MIN_BLOCK_SIZE).max(MIN_BLOCK_SIZE) as u64;

        let block = match self.find_fit(asize) {
            Some(b) => b,
            None => {
                let grow = (asize as usize).max(CHUNK_SIZE);
                match self.extend_heap(grow) {
                    Some(b) => b,
                    None => {
                        debug!("allocate: heap extension by {grow} bytes failed");
                        return None;
                    }
                }
            }
        };

        self.lists.remove(block);
        block.set_header(block.size(), true, block.prev_alloc(), block.prev_min());
        self.split_block(block, asize);

        self.assert_consistent("allocate");
        Some(block.payload_addr())
    }

    /// No-op on `None` and on a block that is not currently allocated
    /// (double free is silently ignored; see the crate's design notes).
    pub fn free(&mut self, ptr: Option<NonNull<u8>>) {
        let Some(ptr) = ptr else { return };
        let block = unsafe { Block::from_payload_addr(ptr) };
        if !block.is_alloc() {
            #[cfg(feature = "checker")]
            warn!("double free ignored at {:#x}", block.addr());
            return;
        }
        block.set_header(block.size(), false, block.prev_alloc(), block.prev_min());
        block.write_footer();
        coalesce::free_and_coalesce(block, self.first_block_addr(), &mut self.lists);

        self.assert_consistent("free");
    }

    /// `None` ptr behaves as `allocate`; `size == 0` behaves as `free` and
    /// returns `None`. Otherwise returns a pointer whose first
    /// `min(size, old_size)` bytes match the original payload.
    pub fn reallocate(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return self.allocate(size);
        };
        if size == 0 {
            self.free(Some(ptr));
            return None;
        }

        let block = unsafe { Block::from_payload_addr(ptr) };
        let asize = round_up(size + WORD_SIZE, MIN_BLOCK_SIZE).max(MIN_BLOCK_SIZE) as u64;
        let old_size = block.size();
        let next = navigate::next(block);
        let next_is_free = !next.is_alloc();
        let available = if next_is_free {
            old_size + next.size()
        } else {
            old_size
        };

        if available < asize {
            let new_ptr = self.allocate(size)?;
            let copy_len = (old_size as usize - WORD_SIZE).min(size);
            unsafe { ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), copy_len) };
            self.free(Some(ptr));
            return Some(new_ptr);
        }

        if next_is_free {
            self.lists.remove(next);
        }
        block.set_header(available, true, block.prev_alloc(), block.prev_min());
        self.split_block(block, asize);

        self.assert_consistent("reallocate");
        Some(block.payload_addr())
    }

    /// `None` on `n * m` overflow; otherwise a zeroed region of `n * m`
    /// bytes.
    pub fn zero_allocate(&mut self, n: usize, m: usize) -> Option<NonNull<u8>> {
        let total = n.checked_mul(m)?;
        let ptr = self.allocate(total)?;
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, total) };
        Some(ptr)
    }

    #[cfg(feature = "checker")]
    fn assert_consistent(&self, op: &str) {
        if !crate::checker::check_heap(self, line!()) {
            error!("heap consistency check failed after {op}");
        }
    }

    #[cfg(not(feature = "checker"))]
    fn assert_consistent(&self, _op: &str) {}

    /// Whole-heap invariant check, matching the original `check_heap(line)`
    /// debug predicate. Runs the real checker when the `checker` feature is
    /// enabled; otherwise compiles down to a constant `true` with no heap
    /// walk performed.
    #[cfg(feature = "checker")]
    pub fn check_heap(&self, line: u32) -> bool {
        crate::checker::check_heap(self, line)
    }

    #[cfg(not(feature = "checker"))]
    pub fn check_heap(&self, _line: u32) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extend::VecHeap;

    fn new_allocator() -> Allocator<VecHeap> {
        Allocator::new(VecHeap::new())
    }

    #[test]
    fn allocate_returns_aligned_pointer() {
        let mut a = new_allocator();
        let p = a.allocate(24).unwrap();
        assert_eq!(p.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn allocate_zero_returns_none() {
        let mut a = new_allocator();
        assert!(a.allocate(0).is_none());
    }

    #[test]
    fn round_trip_payload_bytes() {
        let mut a = new_allocator();
        let p = a.allocate(100).unwrap();
        unsafe {
            for i in 0..100u8 {
                p.as_ptr().add(i as usize).write(i);
            }
            for i in 0..100u8 {
                assert_eq!(p.as_ptr().add(i as usize).read(), i);
            }
        }
    }

    #[test]
    fn free_then_reallocate_reuses_slot() {
        let mut a = new_allocator();
        let mut ptrs = Vec::new();
        for _ in 0..10 {
            ptrs.push(a.allocate(24).unwrap());
        }
        for (i, p) in ptrs.iter().enumerate() {
            if i % 2 == 0 {
                a.free(Some(*p));
            }
        }
        let reused = a.allocate(24).unwrap();
        assert!(ptrs
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .any(|(_, p)| *p == reused));
    }

    #[test]
    fn coalesces_back_into_a_single_free_chunk() {
        let mut a = new_allocator();
        let p1 = a.allocate(2040).unwrap();
        let p2 = a.allocate(2040).unwrap();
        a.free(Some(p1));
        a.free(Some(p2));
        let big = a.allocate(4000).unwrap();
        assert_eq!(big, p1);
    }

    #[test]
    fn zero_allocate_zeroes_memory() {
        let mut a = new_allocator();
        let p = a.zero_allocate(100, 4).unwrap();
        unsafe {
            for i in 0..400 {
                assert_eq!(p.as_ptr().add(i).read(), 0);
            }
        }
    }

    #[test]
    fn zero_allocate_overflow_returns_none() {
        let mut a = new_allocator();
        assert!(a.zero_allocate(usize::MAX, 2).is_none());
    }

    #[test]
    fn double_free_is_a_silent_no_op() {
        let mut a = new_allocator();
        let p = a.allocate(24).unwrap();
        a.free(Some(p));
        a.free(Some(p));
    }

    #[test]
    fn reallocate_preserves_leading_bytes() {
        let mut a = new_allocator();
        let p = a.allocate(24).unwrap();
        unsafe {
            for i in 0..24u8 {
                p.as_ptr().add(i as usize).write(i);
            }
        }
        let q = a.reallocate(Some(p), 4000).unwrap();
        unsafe {
            for i in 0..24u8 {
                assert_eq!(q.as_ptr().add(i as usize).read(), i);
            }
        }
    }

    #[test]
    fn reallocate_null_behaves_as_allocate() {
        let mut a = new_allocator();
        let p = a.reallocate(None, 24).unwrap();
        assert_eq!(p.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn reallocate_to_zero_frees_and_returns_none() {
        let mut a = new_allocator();
        let p = a.allocate(24).unwrap();
        assert!(a.reallocate(Some(p), 0).is_none());
    }
}
