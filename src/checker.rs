//! Whole-heap consistency checker, compiled in behind the `checker`
//! feature (on by default) so debug builds get it for free and release
//! builds carry none of its cost.
//!
//! Two passes, mirroring the original lab's `mm_checkheap`: a forward
//! physical walk that verifies every block's own shape and its relationship
//! to its neighbors, followed by a walk of every segregated list that
//! verifies the free-list view agrees with what the physical walk counted.

use log::error;

use crate::block::extract_size;
use crate::config::{MIN_BLOCK_SIZE, NUM_CLASSES};
use crate::extend::HeapExtender;
use crate::freelist::{self, get_class};
use crate::navigate;
use crate::Allocator;

/// Walks the whole heap and every segregated free list, logging each
/// [`crate::error::CheckViolation`] found via [`log::error!`] and returning
/// whether the heap was found fully consistent.
///
/// `line` identifies the call site in log output, matching the original
/// `check_heap(line)` interface; it carries no other behavior.
pub fn check_heap<E: HeapExtender>(alloc: &Allocator<E>, line: u32) -> bool {
    let mut ok = true;
    let mut report = |violation: crate::error::CheckViolation| {
        error!("check_heap@{line}: {violation}");
        ok = false;
    };

    let lo = alloc.heap_lo();
    let hi = alloc.heap_hi();

    let first_block_addr = alloc.first_block().addr();
    let mut physical_free_count = 0usize;
    let mut prev_was_free = false;
    let mut prev_addr = 0usize;
    let mut block = alloc.first_block();

    loop {
        let addr = block.addr();
        let size = block.size();

        if size == 0 {
            if !block.is_alloc() {
                report(crate::error::CheckViolation::BadSentinel { addr });
            }
            break;
        }

        if block.payload_addr().as_ptr() as usize % 16 != 0 {
            report(crate::error::CheckViolation::Misaligned { addr });
        }
        if size % 16 != 0 || size < MIN_BLOCK_SIZE as u64 || addr + size as usize > hi + 1 {
            report(crate::error::CheckViolation::BadSize { addr, size });
        }

        let is_free = !block.is_alloc();
        if is_free {
            physical_free_count += 1;
            if prev_was_free {
                report(crate::error::CheckViolation::UncoalescedNeighbors {
                    first: prev_addr,
                    second: addr,
                });
            }
            if !block.is_min() {
                let footer = block.footer_word();
                if extract_size(footer) != size || crate::block::extract_alloc(footer) {
                    report(crate::error::CheckViolation::FooterMismatch { addr });
                }
            }

            // `check_free_link`: a free block's forward/backward free-list
            // pointers must round-trip back to it.
            if !block.is_min() {
                if let Some(p) = freelist::prev_free(block) {
                    if freelist::next_free(p) != Some(block) {
                        report(crate::error::CheckViolation::MissingFromFreeList { addr });
                    }
                }
            }
            if let Some(n) = freelist::next_free(block) {
                if !n.is_min() && freelist::prev_free(n) != Some(block) {
                    report(crate::error::CheckViolation::MissingFromFreeList { addr });
                }
            }
        }

        if let Some(prev) = navigate::prev(block, first_block_addr) {
            let expect_prev_alloc = prev.is_alloc();
            let expect_prev_min = prev.size() == MIN_BLOCK_SIZE as u64;
            if block.prev_alloc() != expect_prev_alloc || block.prev_min() != expect_prev_min {
                report(crate::error::CheckViolation::StatusBitMismatch { addr });
            }
        }

        prev_was_free = is_free;
        prev_addr = addr;
        block = navigate::next(block);
    }

    if block.addr() < lo || block.addr() > hi + 1 {
        report(crate::error::CheckViolation::BadSentinel { addr: block.addr() });
    }

    let mut listed_free_count = 0usize;
    for class in 0..NUM_CLASSES {
        let mut seen_in_class = 0usize;
        for entry in alloc.lists().iter_class(class) {
            seen_in_class += 1;
            listed_free_count += 1;
            if seen_in_class > physical_free_count + 1 {
                report(crate::error::CheckViolation::CyclicFreeList { class });
                break;
            }
            let addr = entry.addr();
            if entry.is_alloc() || addr < lo || addr > hi {
                report(crate::error::CheckViolation::MisplacedInFreeList { addr, class });
            }
            if get_class(entry.size()) != class {
                report(crate::error::CheckViolation::MisplacedInFreeList { addr, class });
            }
        }
    }

    if listed_free_count != physical_free_count {
        report(crate::error::CheckViolation::FreeCountMismatch {
            counted: physical_free_count,
            listed: listed_free_count,
        });
    }

    ok
}
