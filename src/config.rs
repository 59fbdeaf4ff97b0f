//! Compile-time tunables. None of these are environment-configurable: a
//! `#![no_std]` target has no environment to read them from.

/// Width of a header/footer/link-pointer word.
pub const WORD_SIZE: usize = 8;

/// Smallest possible block: header plus one link pointer, no footer.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Bytes requested from the [`crate::HeapExtender`] when no free block fits
/// and the heap must grow.
pub const CHUNK_SIZE: usize = 4096;

/// Number of segregated size-class free lists.
pub const NUM_CLASSES: usize = 15;

/// Default cap on how many free-list candidates [`crate::allocator`]'s
/// bounded best-fit search inspects before settling for the best it has
/// seen. Tunable per [`crate::Allocator::with_search_bound`].
pub const DEFAULT_MAX_SEARCH: usize = 10;
