//! Named failure reasons surfaced by the consistency checker.
//!
//! The allocation fast path never returns one of these: out-of-memory is
//! `None`, caller misuse is a silent no-op. `CheckViolation` exists purely
//! so a failing [`crate::checker::check_heap`] can log *what* broke instead
//! of a bare `false`.

use core::fmt;

/// A specific way the heap was found to be inconsistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckViolation {
    /// A block's payload address was not 16-byte aligned.
    Misaligned { addr: usize },
    /// A block's size was zero, not a multiple of 16, or below the minimum.
    BadSize { addr: usize, size: u64 },
    /// A free block's header and footer disagree on size or alloc bit.
    FooterMismatch { addr: usize },
    /// A block's `prev_alloc`/`prev_min` bits don't match its true
    /// physical predecessor.
    StatusBitMismatch { addr: usize },
    /// Two physically adjacent blocks are both free.
    UncoalescedNeighbors { first: usize, second: usize },
    /// A free block walked by physical traversal was not found in the
    /// size-class list its size maps to.
    MissingFromFreeList { addr: usize },
    /// The free-list entry count does not match the physically-counted
    /// number of free blocks.
    FreeCountMismatch { counted: usize, listed: usize },
    /// A segregated list contains a cycle.
    CyclicFreeList { class: usize },
    /// A segregated list holds a block that is not free, out of heap
    /// bounds, or in the wrong class.
    MisplacedInFreeList { addr: usize, class: usize },
    /// The prologue or epilogue sentinel is malformed.
    BadSentinel { addr: usize },
}

impl fmt::Display for CheckViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckViolation::Misaligned { addr } => {
                write!(f, "block at {addr:#x} is not 16-byte aligned")
            }
            CheckViolation::BadSize { addr, size } => {
                write!(f, "block at {addr:#x} has invalid size {size}")
            }
            CheckViolation::FooterMismatch { addr } => {
                write!(f, "block at {addr:#x} header/footer disagree")
            }
            CheckViolation::StatusBitMismatch { addr } => {
                write!(f, "block at {addr:#x} prev_alloc/prev_min mismatch")
            }
            CheckViolation::UncoalescedNeighbors { first, second } => {
                write!(f, "uncoalesced free neighbors at {first:#x} and {second:#x}")
            }
            CheckViolation::MissingFromFreeList { addr } => {
                write!(f, "free block at {addr:#x} missing from its free list")
            }
            CheckViolation::FreeCountMismatch { counted, listed } => {
                write!(
                    f,
                    "physical free-block count {counted} does not match free-list total {listed}"
                )
            }
            CheckViolation::CyclicFreeList { class } => {
                write!(f, "free list for class {class} is cyclic")
            }
            CheckViolation::MisplacedInFreeList { addr, class } => {
                write!(f, "block at {addr:#x} is not a valid entry for class {class}")
            }
            CheckViolation::BadSentinel { addr } => {
                write!(f, "sentinel at {addr:#x} is malformed")
            }
        }
    }
}
