//! Block metadata: header/footer tag words, neighbor lookup, and the
//! free-list link pair threaded through a free block's payload.
//!
//! A block occupies `[b, b + size)`. Its header tag lives at `b`, its footer
//! tag at `b + size - WORD`, and its payload fills the space in between:
//!
//! ```text
//!   b                b+WORD                         b+size-WORD   b+size
//!   ┌─────────────────┬───────────────────────────────┬─────────────┐
//!   │  header (Tag)    │           payload             │ footer (Tag)│
//!   └─────────────────┴───────────────────────────────┴─────────────┘
//! ```
//!
//! When the block is free, the first two pointer-sized words of its payload
//! are reinterpreted as `FreeLinks { prev, next }`. This is never read or
//! written once the block's allocated bit is set.

use std::mem;
use std::ptr;

use crate::tag::{Tag, WORD};

/// Pointer size, used for the free-list link pair. Kept distinct from `WORD`
/// in the API even though both resolve to `size_of::<usize>()` today, so a
/// future target with a narrower tag word wouldn't need every call site
/// touched (see DESIGN.md's note on the `BLOCK_MIN` open question).
pub const PTR: usize = mem::size_of::<usize>();

/// Minimum bytes a block may ever occupy: header + footer + two free-list
/// pointers.
pub const BLOCK_MIN: usize = 2 * WORD + 2 * PTR;

/// Minimum usable payload: just enough to hold the two free-list pointers.
pub const INNER_MIN: usize = 2 * PTR;

/// A block handle: the address of its header word.
pub type BlockPtr = *mut u8;

#[inline]
fn read_tag(addr: *mut u8) -> Tag {
  Tag::from_raw(unsafe { ptr::read(addr as *const usize) })
}

#[inline]
fn write_tag(
  addr: *mut u8,
  tag: Tag,
) {
  unsafe { ptr::write(addr as *mut usize, tag.raw()) };
}

/// Reads `b`'s header and returns its total size (header + payload + footer).
pub fn blocksize(b: BlockPtr) -> usize {
  read_tag(b).size()
}

/// Reads `b`'s header allocated bit.
pub fn is_alloc(b: BlockPtr) -> bool {
  read_tag(b).is_alloc()
}

/// Whether `b`'s header and footer words currently carry identical contents.
/// Used by the heap walker; not needed on any hot path.
pub fn header_footer_agree(b: BlockPtr) -> bool {
  let header = read_tag(b);
  let footer_tag = read_tag(footer(b, header.size()));
  header == footer_tag
}

/// Sets `b`'s allocated bit in both header and footer.
pub fn set_alloc(b: BlockPtr) {
  let tag = read_tag(b).with_alloc();
  write_tag(b, tag);
  write_tag(footer(b, tag.size()), tag);
}

/// Clears `b`'s allocated bit in both header and footer.
pub fn set_free(b: BlockPtr) {
  let tag = read_tag(b).with_free();
  write_tag(b, tag);
  write_tag(footer(b, tag.size()), tag);
}

/// Writes a fresh, unallocated tag of size `size` into `b`'s header and
/// footer.
///
/// Only enforces 8-alignment; the `BLOCK_MIN` floor is a property the
/// allocation policy maintains at a higher level, not something this
/// primitive re-checks on every write.
pub fn format(
  b: BlockPtr,
  size: usize,
) {
  debug_assert_eq!(size % 8, 0, "block size must be 8-aligned: {size}");
  let tag = Tag::new(size, false);
  write_tag(b, tag);
  write_tag(footer(b, size), tag);
}

/// Bisects `b` into two adjacent blocks of `first_size` and
/// `blocksize(b) - first_size` bytes. Neither resulting block carries the
/// allocated bit; the caller is responsible for free-list bookkeeping and
/// for marking one of the two allocated.
///
/// Requires `blocksize(b) >= first_size + BLOCK_MIN`.
pub fn split(
  b: BlockPtr,
  first_size: usize,
) -> (BlockPtr, BlockPtr) {
  let total = blocksize(b);
  debug_assert!(total >= first_size + BLOCK_MIN, "split would leave a trailing block below the size floor");
  format(b, first_size);
  let second = next_block(b);
  format(second, total - first_size);
  (b, second)
}

/// Merges two physically adjacent free blocks into one occupying `b1`'s
/// address. Requires `next_block(b1) == b2` and that both blocks are free.
///
/// Does not touch the free list; the caller must ensure the surviving block
/// ends up on it exactly once.
pub fn merge(
  b1: BlockPtr,
  b2: BlockPtr,
) -> BlockPtr {
  debug_assert_eq!(next_block(b1), b2, "merge requires physically adjacent blocks");
  debug_assert!(!is_alloc(b1) && !is_alloc(b2), "merge requires both blocks to be free");
  let merged_size = blocksize(b1) + blocksize(b2);
  format(b1, merged_size);
  b1
}

/// Address of `b`'s footer word, given its size.
#[inline]
pub fn footer(
  b: BlockPtr,
  size: usize,
) -> BlockPtr {
  unsafe { b.add(size - WORD) }
}

/// Address of `b`'s payload (first byte after the header).
#[inline]
pub fn payload(b: BlockPtr) -> *mut u8 {
  unsafe { b.add(WORD) }
}

/// Recovers a block's header address from a payload pointer previously
/// returned to a client.
#[inline]
pub fn block_from_payload(p: *mut u8) -> BlockPtr {
  unsafe { p.sub(WORD) }
}

/// The block physically following `b`. Only valid when `b` is not the last
/// block in the heap.
#[inline]
pub fn next_block(b: BlockPtr) -> BlockPtr {
  unsafe { b.add(blocksize(b)) }
}

/// The block physically preceding `b`, found by reading the word just before
/// `b` (the predecessor's footer).
///
/// Only valid when `b` is not the lowest block in the heap; callers MUST
/// guard with `b > lo` before calling this (reading the footer word just
/// below `lo` would read outside the managed region).
pub fn prev_block(b: BlockPtr) -> BlockPtr {
  let prev_footer = unsafe { b.sub(WORD) };
  let prev_size = read_tag(prev_footer).size();
  unsafe { b.sub(prev_size) }
}

/// The two free-list pointers embedded in a free block's payload.
pub struct FreeLinks;

impl FreeLinks {
  /// Reads the `prev_free` link from `b`'s payload.
  pub fn prev(b: BlockPtr) -> *mut u8 {
    unsafe { ptr::read(payload(b) as *const *mut u8) }
  }

  /// Reads the `next_free` link from `b`'s payload.
  pub fn next(b: BlockPtr) -> *mut u8 {
    unsafe { ptr::read(payload(b).add(PTR) as *const *mut u8) }
  }

  /// Writes the `prev_free` link into `b`'s payload.
  pub fn set_prev(
    b: BlockPtr,
    prev: *mut u8,
  ) {
    unsafe { ptr::write(payload(b) as *mut *mut u8, prev) };
  }

  /// Writes the `next_free` link into `b`'s payload.
  pub fn set_next(
    b: BlockPtr,
    next: *mut u8,
  ) {
    unsafe { ptr::write(payload(b).add(PTR) as *mut *mut u8, next) };
  }
}
