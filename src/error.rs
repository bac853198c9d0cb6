//! The allocator's error surface.
//!
//! `alloc`/`free`/`realloc` keep their contractual pointer-based surface
//! (null on failure), but route provider failures through [`AllocError`]
//! internally before collapsing to null at the public boundary. `check()`
//! returns `AllocError` directly, since a heap walk has no natural
//! "null pointer" fallback.

use thiserror::Error;

/// Failure modes the allocator can report.
#[derive(Debug, Error)]
pub enum AllocError {
  /// The heap provider refused to grow the heap (`sbrk` returned `-1`).
  #[error("heap provider is out of memory")]
  OutOfMemory,

  /// A heap walk (`check()`) found a violated invariant.
  #[error("heap consistency violation: {0}")]
  Consistency(String),
}

/// One invariant violation found during a [`crate::Allocator::check`] walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
  /// Address of the block the violation was found at (header address).
  pub at: usize,
  /// Human-readable description of the violated invariant.
  pub description: String,
}

/// Summary produced by walking the heap from `lo` to `hi`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
  /// Total number of blocks visited.
  pub block_count: usize,
  /// Number of those blocks that were free.
  pub free_count: usize,
  /// Sum of `blocksize` over all free blocks.
  pub free_bytes: usize,
  /// Every invariant violation found, in walk order. Empty means the heap is
  /// sound.
  pub violations: Vec<Violation>,
}

impl CheckReport {
  /// Whether the walk found no invariant violations.
  pub fn is_sound(&self) -> bool {
    self.violations.is_empty()
  }
}
