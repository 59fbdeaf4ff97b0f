//! End-to-end allocator scenarios, run against a `VecHeap`-backed
//! `Allocator`. Kept apart from the per-module unit tests: these drive
//! several calls in sequence and check the resulting heap shape, the way a
//! teacher crate's behavioral tests sit in `tests/` while unit tests stay
//! next to the code they exercise.

use segheap::block::Block;
use segheap::extend::VecHeap;
use segheap::freelist::get_class;
use segheap::Allocator;

const CHUNK: u64 = 4096;

fn new_allocator() -> Allocator<VecHeap> {
    Allocator::new(VecHeap::new())
}

fn block_size(ptr: core::ptr::NonNull<u8>) -> u64 {
    unsafe { Block::from_payload_addr(ptr).size() }
}

#[test]
fn init_and_first_allocation_leaves_one_free_tail() {
    let mut a = new_allocator();
    let p = a.allocate(24).unwrap();
    assert_eq!(p.as_ptr() as usize % 16, 0);
    assert_eq!(block_size(p), 32);
    assert!(a.check_heap(line!()));
}

#[test]
fn freeing_both_allocations_merges_to_one_full_chunk() {
    let mut a = new_allocator();
    let p1 = a.allocate(24).unwrap();
    let p2 = a.allocate(24).unwrap();
    a.free(Some(p1));
    a.free(Some(p2));

    let reused = a.allocate(CHUNK as usize - 8).unwrap();
    assert_eq!(reused, p1);
    assert!(a.check_heap(line!()));
}

#[test]
fn large_allocations_coalesce_through_both_adjacencies() {
    let mut a = new_allocator();
    let p = a.allocate(2040).unwrap();
    let q = a.allocate(2040).unwrap();
    a.free(Some(p));
    a.free(Some(q));

    let reused = a.allocate(4000).unwrap();
    assert_eq!(reused, p);
    assert!(a.check_heap(line!()));
}

#[test]
fn reallocate_after_freeing_neighbor_keeps_free_counts_consistent() {
    let mut a = new_allocator();
    let x = a.allocate(24).unwrap();
    let y = a.allocate(24).unwrap();
    a.free(Some(x));
    let z = a.reallocate(Some(y), 40).unwrap();
    assert!(a.check_heap(line!()));
    let _ = z;
}

#[test]
fn zero_allocate_returns_zeroed_region_and_free_is_idempotent() {
    let mut a = new_allocator();
    let p = a.zero_allocate(100, 4).unwrap();
    unsafe {
        for i in 0..400 {
            assert_eq!(p.as_ptr().add(i).read(), 0);
        }
    }
    a.free(Some(p));
    a.free(Some(p));
    assert!(a.check_heap(line!()));
}

#[test]
fn fragment_and_reuse_returns_a_freed_slot() {
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
    assert!(a.check_heap(line!()));
}

#[test]
fn every_free_block_is_in_the_class_its_size_maps_to() {
    let mut a = new_allocator();
    let mut ptrs = Vec::new();
    for size in [16usize, 40, 100, 500, 3000] {
        ptrs.push(a.allocate(size).unwrap());
    }
    for p in ptrs {
        a.free(Some(p));
    }
    for class in 0..15 {
        for block in a.lists().iter_class(class) {
            assert_eq!(get_class(block.size()), class);
        }
    }
    assert!(a.check_heap(line!()));
}
