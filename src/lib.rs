//! # fitalloc - A Best-Fit Boundary-Tag Memory Allocator
//!
//! This crate implements a free-list allocator over the raw heap memory
//! `sbrk(2)` hands out: best-fit search among free blocks, splitting when a
//! fit is larger than needed, and immediate boundary-tag coalescing on free.
//!
//! ## Overview
//!
//! Every block (free or allocated) carries a header and footer tag recording
//! its size and allocated bit, so any block can find its physical neighbors
//! in O(1) without a separate index:
//!
//! ```text
//!   Heap layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌───────┬───────────────┬───────┬───────────────┬────────────────┐ │
//!   │   │ alloc │     free      │ alloc │     free       │  (growable)    │ │
//!   │   └───────┴───────────────┴───────┴───────────────┴────────────────┘ │
//!   │   lo                                                             end │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Free blocks are additionally threaded onto a doubly-linked free list
//!   through the first two words of their own payload.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment macros (align!, align_to!, align_floor)
//!   ├── tag        - Packed header/footer word (size + allocated bit)
//!   ├── block      - Block metadata: neighbors, split, merge, free links
//!   ├── free_list  - The doubly-linked list of free blocks
//!   ├── heap       - HeapProvider trait; SbrkHeap and VecHeap
//!   ├── config     - AllocatorConfig
//!   ├── error      - AllocError, CheckReport
//!   └── allocator  - Allocator: alloc/free/realloc/check
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fitalloc::Allocator;
//!
//! let mut allocator = Allocator::new();
//! allocator.init().expect("heap init should succeed");
//!
//! unsafe {
//!     let p = allocator.alloc(64);
//!     assert!(!p.is_null());
//!     *(p as *mut u64) = 42;
//!     allocator.free(p);
//! }
//! ```
//!
//! ## How It Works
//!
//! The allocator uses `sbrk(2)` to extend the program's data segment, the
//! same mechanism a userspace allocator on a POSIX system always has
//! available:
//!
//! ```text
//!   Program Memory Layout:
//!
//!   High Address ┌─────────────────────┐
//!                │       Stack         │ ↓ grows down
//!                │         │           │
//!                │         ▼           │
//!                │                     │
//!                │         ▲           │
//!                │         │           │
//!                │       Heap          │ ↑ grows up (sbrk)
//!                ├─────────────────────┤ ← Program Break
//!                │   Uninitialized     │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │   Initialized       │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │       Text          │
//!   Low Address  └─────────────────────┘
//! ```
//!
//! Each block carries header and footer tags:
//!
//! ```text
//!   Single Block:
//!   ┌──────────┬──────────────────────────────────┬──────────┐
//!   │  header  │            payload                │  footer  │
//!   │ (8 bytes)│   (>= 2 pointers if free)          │ (8 bytes)│
//!   └──────────┴──────────────────────────────────┴──────────┘
//!              ▲
//!              └── Pointer returned to/received from the caller
//! ```
//!
//! ## Features
//!
//! - **Best-fit placement**: searches the whole free list for the tightest
//!   adequate block before falling back to growing the heap.
//! - **Splitting**: an over-large fit is split, and the remainder rejoins the
//!   free list, when the remainder is at least `block::BLOCK_MIN` bytes.
//! - **Immediate coalescing**: `free` merges with a free physical successor
//!   and/or predecessor before returning.
//! - **Pluggable heap provider**: [`HeapProvider`] abstracts the memory
//!   source; [`SbrkHeap`] drives the real process break, [`VecHeap`] backs
//!   tests with an owned, deterministic arena.
//! - **Consistency checking**: [`Allocator::check`] walks the whole heap and
//!   reports every invariant violation it finds.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Allocator` is `!Sync` and `!Send`.
//! - **Unix-only**: [`SbrkHeap`] requires `libc` and `sbrk` (POSIX systems).
//! - **No shrink-to-OS**: freed memory is never returned to `sbrk`; it stays
//!   on the free list for reuse by later allocations.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! [`Allocator::alloc`], [`Allocator::free`], and [`Allocator::realloc`] are
//! all `unsafe fn`: each dereferences block headers/footers via raw pointer
//! arithmetic, and `free`/`realloc` additionally trust that the pointer they
//! are given came from this same allocator instance. Passing a pointer that
//! did not is undefined behavior, exactly as with the system allocator.

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
mod free_list;
mod heap;
mod tag;

pub use allocator::Allocator;
pub use config::AllocatorConfig;
pub use error::{AllocError, CheckReport, Violation};
pub use heap::{HeapProvider, SbrkHeap, VecHeap};
