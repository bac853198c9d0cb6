//! The doubly-linked list of free blocks.
//!
//! Links are threaded through each free block's payload via
//! [`block::FreeLinks`]; this module only owns the list head and the
//! insert/unlink/replace operations that keep the two directions consistent.
//! Order of traversal carries no meaning — only reachability and the
//! bidirectional `prev`/`next` agreement matter.

use std::ptr;

use crate::block::{BlockPtr, FreeLinks};

/// Head of the free list. Null iff no free block exists.
///
/// Lives as a field of `Allocator`, not as process-wide state, so multiple
/// independent allocators (and tests) never share a free list.
pub struct FreeList {
  head: *mut u8,
}

impl FreeList {
  pub fn new() -> Self {
    Self { head: ptr::null_mut() }
  }

  pub fn head(&self) -> *mut u8 {
    self.head
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_null()
  }

  /// Prepends `b` at the list head.
  pub fn insert_head(
    &mut self,
    b: BlockPtr,
  ) {
    FreeLinks::set_prev(b, ptr::null_mut());
    FreeLinks::set_next(b, self.head);
    if !self.head.is_null() {
      FreeLinks::set_prev(self.head, b);
    }
    self.head = b;
  }

  /// Removes `b` from the list, rewiring its neighbors around it.
  ///
  /// `b` must currently be a member of this list.
  pub fn unlink(
    &mut self,
    b: BlockPtr,
  ) {
    let prev = FreeLinks::prev(b);
    let next = FreeLinks::next(b);
    if !prev.is_null() {
      FreeLinks::set_next(prev, next);
    }
    if !next.is_null() {
      FreeLinks::set_prev(next, prev);
    }
    if b == self.head {
      self.head = next;
    }
  }

  /// Makes `new` occupy `old`'s position in the list: inherits `old`'s links,
  /// rewires `old`'s neighbors (and the head, if `old` was at the head) to
  /// point at `new` instead. Used when a merge produces a surviving block
  /// that must keep the absorbed block's list slot.
  ///
  /// `old` must currently be a member of this list. `new` is not assumed to
  /// be a member beforehand.
  pub fn replace(
    &mut self,
    old: BlockPtr,
    new: BlockPtr,
  ) {
    let prev = FreeLinks::prev(old);
    let next = FreeLinks::next(old);
    FreeLinks::set_prev(new, prev);
    FreeLinks::set_next(new, next);
    if !prev.is_null() {
      FreeLinks::set_next(prev, new);
    }
    if !next.is_null() {
      FreeLinks::set_prev(next, new);
    }
    if old == self.head {
      self.head = new;
    }
  }

  /// Walks the list from head to tail.
  pub fn iter(&self) -> FreeListIter {
    FreeListIter { cur: self.head }
  }
}

/// Forward iterator over a [`FreeList`]'s nodes.
pub struct FreeListIter {
  cur: *mut u8,
}

impl Iterator for FreeListIter {
  type Item = BlockPtr;

  fn next(&mut self) -> Option<BlockPtr> {
    if self.cur.is_null() {
      return None;
    }
    let cur = self.cur;
    self.cur = FreeLinks::next(cur);
    Some(cur)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{self, BLOCK_MIN};

  /// Lays out `n` contiguous, formatted (free) blocks of `BLOCK_MIN` bytes
  /// each in a fresh buffer, returning the buffer (kept alive by the caller)
  /// and the block pointers in physical order.
  fn blocks(n: usize) -> (Vec<u8>, Vec<BlockPtr>) {
    let mut buf = vec![0u8; BLOCK_MIN * n];
    let base = buf.as_mut_ptr();
    let mut ptrs = Vec::new();
    for i in 0..n {
      let b = unsafe { base.add(i * BLOCK_MIN) };
      block::format(b, BLOCK_MIN);
      ptrs.push(b);
    }
    (buf, ptrs)
  }

  #[test]
  fn new_list_is_empty() {
    let list = FreeList::new();
    assert!(list.is_empty());
    assert_eq!(list.iter().count(), 0);
  }

  #[test]
  fn insert_head_prepends_and_links_bidirectionally() {
    let (_buf, b) = blocks(3);
    let mut list = FreeList::new();

    list.insert_head(b[0]);
    list.insert_head(b[1]);
    list.insert_head(b[2]);

    assert_eq!(list.head(), b[2]);
    let walked: Vec<_> = list.iter().collect();
    assert_eq!(walked, vec![b[2], b[1], b[0]]);

    assert!(FreeLinks::prev(b[2]).is_null());
    assert_eq!(FreeLinks::next(b[2]), b[1]);
    assert_eq!(FreeLinks::prev(b[1]), b[2]);
    assert_eq!(FreeLinks::next(b[1]), b[0]);
    assert_eq!(FreeLinks::prev(b[0]), b[1]);
    assert!(FreeLinks::next(b[0]).is_null());
  }

  #[test]
  fn unlink_middle_rewires_neighbors() {
    let (_buf, b) = blocks(3);
    let mut list = FreeList::new();
    list.insert_head(b[0]);
    list.insert_head(b[1]);
    list.insert_head(b[2]);

    list.unlink(b[1]);

    let walked: Vec<_> = list.iter().collect();
    assert_eq!(walked, vec![b[2], b[0]]);
    assert_eq!(FreeLinks::next(b[2]), b[0]);
    assert_eq!(FreeLinks::prev(b[0]), b[2]);
  }

  #[test]
  fn unlink_head_updates_head() {
    let (_buf, b) = blocks(2);
    let mut list = FreeList::new();
    list.insert_head(b[0]);
    list.insert_head(b[1]);

    list.unlink(b[1]);

    assert_eq!(list.head(), b[0]);
    assert!(FreeLinks::prev(b[0]).is_null());
  }

  #[test]
  fn unlink_only_element_empties_list() {
    let (_buf, b) = blocks(1);
    let mut list = FreeList::new();
    list.insert_head(b[0]);

    list.unlink(b[0]);

    assert!(list.is_empty());
  }

  #[test]
  fn replace_inherits_links_and_updates_head() {
    let (_buf, b) = blocks(3);
    let mut list = FreeList::new();
    list.insert_head(b[0]);
    list.insert_head(b[1]);
    list.insert_head(b[2]);

    // Replace the middle element (not the head).
    let (mut repl_buf, repl) = blocks(1);
    let _ = &mut repl_buf;
    list.replace(b[1], repl[0]);

    let walked: Vec<_> = list.iter().collect();
    assert_eq!(walked, vec![b[2], repl[0], b[0]]);

    // Replace the head element.
    let (mut repl_buf2, repl2) = blocks(1);
    let _ = &mut repl_buf2;
    list.replace(b[2], repl2[0]);
    assert_eq!(list.head(), repl2[0]);
    let walked: Vec<_> = list.iter().collect();
    assert_eq!(walked, vec![repl2[0], repl[0], b[0]]);
  }
}
