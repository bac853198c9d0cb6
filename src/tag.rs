//! The boundary-tag word stored at a block's header and footer.
//!
//! A tag packs two things into a single `usize`:
//!
//! ```text
//!   bit 63                                   bit 3  bits 2..0
//!   ┌───────────┬───────────────────────────┬────────┬───────┐
//!   │ allocated │          size >> 3         │ (pad)  │  000  │
//!   └───────────┴───────────────────────────┴────────┴───────┘
//! ```
//!
//! `size` is always a multiple of 8 (the allocator's alignment), so its three
//! low bits are always zero and never need to be stored; the allocated flag
//! reuses the top bit instead, since no block ever grows large enough to set
//! it legitimately. Header and footer of a quiescent block always carry an
//! identical `Tag`.

use std::mem;

/// Bit used to record whether a block's payload is in use by a client.
const ALLOC_BIT: usize = 1 << (usize::BITS - 1);

/// A single header/footer word: packed `(size, allocated)`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tag(usize);

impl Tag {
  /// Builds a tag for a block of `size` bytes with the given allocated state.
  ///
  /// `size` must already be a multiple of 8 and must not use the top bit.
  pub fn new(
    size: usize,
    allocated: bool,
  ) -> Self {
    debug_assert_eq!(size & (ALLOC_BIT | 0b111), 0, "block size must be 8-aligned and fit below the allocated bit");
    Tag(if allocated { size | ALLOC_BIT } else { size })
  }

  /// Reinterprets a raw word read from memory as a `Tag`.
  pub fn from_raw(raw: usize) -> Self {
    Tag(raw)
  }

  /// The raw word, suitable for writing back into a header or footer slot.
  pub fn raw(self) -> usize {
    self.0
  }

  /// Total block size (header + payload + footer), with the allocated bit
  /// masked off.
  pub fn size(self) -> usize {
    self.0 & !ALLOC_BIT
  }

  /// Whether the block's payload is currently in use.
  pub fn is_alloc(self) -> bool {
    self.0 & ALLOC_BIT != 0
  }

  /// Same tag with the allocated bit set.
  pub fn with_alloc(self) -> Self {
    Tag(self.0 | ALLOC_BIT)
  }

  /// Same tag with the allocated bit cleared.
  pub fn with_free(self) -> Self {
    Tag(self.0 & !ALLOC_BIT)
  }
}

/// Size in bytes of a single header or footer word.
pub const WORD: usize = mem::size_of::<usize>();

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_size_and_flag() {
    let t = Tag::new(64, false);
    assert_eq!(t.size(), 64);
    assert!(!t.is_alloc());

    let alloc = t.with_alloc();
    assert_eq!(alloc.size(), 64);
    assert!(alloc.is_alloc());

    let raw = alloc.raw();
    let back = Tag::from_raw(raw);
    assert_eq!(back.size(), 64);
    assert!(back.is_alloc());
  }

  #[test]
  fn free_clears_only_the_flag() {
    let t = Tag::new(128, true);
    let freed = t.with_free();
    assert_eq!(freed.size(), 128);
    assert!(!freed.is_alloc());
  }
}
