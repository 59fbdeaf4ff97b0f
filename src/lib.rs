//! A segregated free-list dynamic memory allocator over a single,
//! monotonically-extendable heap region.
//!
//! `segheap` implements the classic allocate/free/reallocate/calloc
//! quartet beneath whatever `sbrk`-style growth primitive the embedder
//! supplies through [`HeapExtender`]. It is built to sit under a C library
//! or a language runtime: single-mutator, no thread safety of its own, no
//! hardening against adversarial heap corruption.
//!
//! Drive it directly with one [`Allocator`] per heap, or enable the
//! `global` feature for a process-wide singleton behind
//! `#[global_allocator]`.
#![cfg_attr(not(test), no_std)]
#![allow(clippy::mut_from_ref)]

// `VecHeap` in the `extend` module is a `std`-backed test fixture, needed
// both by this crate's own unit tests (already `std`, via `cfg(test)`) and
// by `tests/scenarios.rs`, which links against a non-`cfg(test)` build of
// this crate and so needs `std` pulled in explicitly.
#[cfg(any(test, feature = "test-util"))]
extern crate std;

pub mod allocator;
pub mod block;
#[cfg(feature = "checker")]
pub mod checker;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod extend;
pub mod freelist;
#[cfg(feature = "global")]
pub mod global;
pub mod navigate;

pub use allocator::Allocator;
pub use error::CheckViolation;
pub use extend::HeapExtender;
#[cfg(feature = "global")]
pub use global::GlobalAllocHandle;
