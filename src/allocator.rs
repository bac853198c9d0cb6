//! The allocation policy: best-fit search, splitting on over-large fits, and
//! boundary-tag coalescing on free.
//!
//! Matches `BumpAllocator`'s struct-holds-state shape (`first`/`last` became
//! `last_block`), with a free list in place of an always-grow linked list of
//! every allocation, and the same unsafe-at-the-boundary, safe-by-construction-
//! inside style for the raw memory operations underneath.

use std::ptr;

use log::{debug, trace, warn};

use crate::block::{self, BlockPtr};
use crate::config::AllocatorConfig;
use crate::error::{AllocError, CheckReport, Violation};
use crate::free_list::FreeList;
use crate::heap::{HeapProvider, SbrkHeap};
use crate::tag::WORD;

/// A best-fit, boundary-tag allocator over a single [`HeapProvider`].
///
/// `Allocator` is intentionally `!Sync` and `!Send` (both fall out
/// automatically from the raw `*mut u8` fields below) — the concurrency
/// model is single-threaded, cooperative, and that is a compile-time
/// property here rather than only documentation.
pub struct Allocator<H: HeapProvider = SbrkHeap> {
  heap: H,
  free_list: FreeList,
  /// Physically last block in the heap, or null if the heap is empty.
  last_block: *mut u8,
  config: AllocatorConfig,
}

impl Allocator<SbrkHeap> {
  /// A new allocator over the real process heap (`sbrk`), with default
  /// configuration.
  pub fn new() -> Self {
    Self::with_provider_and_config(SbrkHeap::new(), AllocatorConfig::default())
  }

  /// A new allocator over the real process heap, with custom configuration.
  pub fn with_config(config: AllocatorConfig) -> Self {
    Self::with_provider_and_config(SbrkHeap::new(), config)
  }
}

impl Default for Allocator<SbrkHeap> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H: HeapProvider> Allocator<H> {
  /// A new allocator over a caller-supplied heap provider, with default
  /// configuration. Useful for tests (see [`crate::heap::VecHeap`]) or for
  /// embedding over a different growable-memory source entirely.
  pub fn with_provider(heap: H) -> Self {
    Self::with_provider_and_config(heap, AllocatorConfig::default())
  }

  /// A new allocator over a caller-supplied heap provider and configuration.
  pub fn with_provider_and_config(
    heap: H,
    config: AllocatorConfig,
  ) -> Self {
    Self { heap, free_list: FreeList::new(), last_block: ptr::null_mut(), config }
  }

  /// Resets the heap (via the provider) and the free list to empty, then
  /// applies `config.initial_reservation` if nonzero.
  pub fn init(&mut self) -> Result<(), AllocError> {
    self.heap.init()?;
    self.free_list = FreeList::new();
    self.last_block = ptr::null_mut();

    if self.config.initial_reservation > 0 {
      let block_min = self.block_min();
      let (b, _already_listed) = self.extend_heap(self.config.initial_reservation, block_min)?;
      self.free_list.insert_head(b);
    }
    Ok(())
  }

  fn block_min(&self) -> usize {
    match self.config.min_block_override {
      Some(v) if v > block::BLOCK_MIN => v,
      _ => block::BLOCK_MIN,
    }
  }

  fn is_last(
    &self,
    b: BlockPtr,
  ) -> bool {
    b == self.last_block
  }

  /// Heap extension policy. Returns the formatted, unallocated
  /// block along with whether it is already a member of the free list (true
  /// only when the last block was free and absorbed the new region — the
  /// caller must `unlink` it in that case before handing it out).
  fn extend_heap(
    &mut self,
    requested_payload_bytes: usize,
    block_min: usize,
  ) -> Result<(BlockPtr, bool), AllocError> {
    if !self.last_block.is_null() && !block::is_alloc(self.last_block) {
      // The last block is free: grow it in place rather than appending a
      // new block after it.
      let old = self.last_block;
      let old_size = block::blocksize(old);
      let needed_total = crate::align_to!(requested_payload_bytes + 2 * WORD, 8);
      if needed_total > old_size {
        let deficit = needed_total - old_size;
        self.heap.extend(deficit)?;
        block::format(old, needed_total);
        trace!("extend_heap: grew trailing free block at {old:?} by {deficit} bytes to {needed_total}");
      }
      Ok((old, true))
    } else {
      let bsize = crate::align::align_floor(requested_payload_bytes, block_min);
      let region = self.heap.extend(bsize)?;
      block::format(region, bsize);
      self.last_block = region;
      trace!("extend_heap: appended a fresh {bsize}-byte block at {region:?}");
      Ok((region, false))
    }
  }

  /// Smallest-fitting free block whose inner size covers `requested_size`,
  /// ties broken by first encountered.
  fn best_fit(
    &self,
    requested_size: usize,
  ) -> Option<BlockPtr> {
    let mut best: Option<BlockPtr> = None;
    let mut best_inner = usize::MAX;
    for candidate in self.free_list.iter() {
      let inner = block::blocksize(candidate) - 2 * WORD;
      if inner >= requested_size && inner < best_inner {
        best = Some(candidate);
        best_inner = inner;
      }
    }
    best
  }

  /// Allocates `size` bytes, returning an 8-byte-aligned payload pointer, or
  /// null on a zero-size request or provider exhaustion.
  ///
  /// # Safety
  ///
  /// This function is unsafe because:
  /// - It performs raw pointer arithmetic over the heap region and
  ///   dereferences block headers/footers without bounds checking.
  /// - It modifies process-global state via the heap provider (`sbrk` for
  ///   [`SbrkHeap`]).
  ///
  /// The caller must ensure:
  /// - `init()` has returned `Ok(())` on this allocator before the first
  ///   call.
  /// - No concurrent calls into this allocator instance (it is `!Sync`).
  pub unsafe fn alloc(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }
    let block_min = self.block_min();

    if let Some(found) = self.best_fit(size) {
      self.free_list.unlink(found);
      let split_size = crate::align::align_floor(size, block_min);
      let total = block::blocksize(found);
      let leftover = total - split_size;

      if leftover < block_min {
        block::set_alloc(found);
        trace!("alloc({size}): reused whole free block at {found:?} ({total} bytes)");
        return block::payload(found);
      }

      let (first, second) = block::split(found, split_size);
      block::set_alloc(first);
      if self.is_last(found) {
        self.last_block = second;
      }
      self.free_list.insert_head(second);
      trace!("alloc({size}): split free block at {found:?} into {split_size} + {leftover} bytes");
      return block::payload(first);
    }

    match self.extend_heap(size, block_min) {
      Ok((b, already_listed)) => {
        if already_listed {
          self.free_list.unlink(b);
        }
        block::set_alloc(b);
        trace!("alloc({size}): grew the heap for block at {b:?}");
        block::payload(b)
      }
      Err(e) => {
        warn!("alloc({size}) failed: {e}");
        ptr::null_mut()
      }
    }
  }

  /// Frees a previously allocated payload pointer. A null pointer is a
  /// no-op; a double free is tolerated as a no-op (logged).
  ///
  /// # Safety
  ///
  /// This function is unsafe because:
  /// - It performs raw pointer arithmetic and dereferences block
  ///   headers/footers without bounds checking.
  /// - It trusts that `payload` was returned by `alloc`/`realloc` on this
  ///   same allocator instance.
  ///
  /// The caller must ensure:
  /// - `payload` is null, or was previously returned by `alloc`/`realloc` on
  ///   this allocator and has not been passed to `free` since its last
  ///   allocation.
  /// - No concurrent calls into this allocator instance.
  pub unsafe fn free(
    &mut self,
    payload: *mut u8,
  ) {
    if payload.is_null() {
      return;
    }
    let b = block::block_from_payload(payload);
    if !block::is_alloc(b) {
      warn!("double free (or free of an unowned pointer) at {payload:?}; ignoring");
      return;
    }
    block::set_free(b);
    let lo = self.heap.lo();
    let mut on_free_list = false;

    // Coalesce with the physical successor first, so that whichever block
    // ends up retaining free-list identity through a double-coalesce is
    // always the leftmost one.
    if !self.is_last(b) {
      let succ = block::next_block(b);
      if !block::is_alloc(succ) {
        let succ_was_last = self.is_last(succ);
        self.free_list.replace(succ, b);
        block::merge(b, succ);
        if succ_was_last {
          self.last_block = b;
        }
        on_free_list = true;
        trace!("free({payload:?}): coalesced with successor at {succ:?}");
      }
    }

    if (b as usize) > (lo as usize) {
      let pred = block::prev_block(b);
      if !block::is_alloc(pred) {
        if on_free_list {
          self.free_list.unlink(b);
        }
        let b_was_last = self.is_last(b);
        block::merge(pred, b);
        if b_was_last {
          self.last_block = pred;
        }
        trace!("free({payload:?}): coalesced with predecessor at {pred:?}");
        return;
      }
    }

    if !on_free_list {
      self.free_list.insert_head(b);
    }
  }

  /// Reallocates `payload` to hold `size` bytes, preserving
  /// `min(old_inner_size, size)` leading bytes.
  ///
  /// # Safety
  ///
  /// This function is unsafe because:
  /// - It performs raw pointer arithmetic, copies raw memory, and
  ///   dereferences block headers/footers without bounds checking.
  /// - It trusts that `payload` was returned by `alloc`/`realloc` on this
  ///   same allocator instance.
  ///
  /// The caller must ensure the same preconditions as [`Allocator::free`]
  /// for `payload`.
  pub unsafe fn realloc(
    &mut self,
    payload: *mut u8,
    size: usize,
  ) -> *mut u8 {
    if payload.is_null() {
      return unsafe { self.alloc(size) };
    }
    if size == 0 {
      unsafe { self.free(payload) };
      return ptr::null_mut();
    }

    let b = block::block_from_payload(payload);
    let old_inner = block::blocksize(b) - 2 * WORD;

    let new_payload = unsafe { self.alloc(size) };
    if new_payload.is_null() {
      // Provider exhaustion: leave the old allocation untouched.
      return ptr::null_mut();
    }

    let copy_len = old_inner.min(size);
    unsafe {
      ptr::copy_nonoverlapping(payload, new_payload, copy_len);
    }
    unsafe { self.free(payload) };
    new_payload
  }

  /// Walks the heap from `lo` to `hi`, verifying tag agreement, alignment,
  /// free-list consistency, and coverage. Soft violations (tag mismatch,
  /// misalignment, wrong free-list membership, adjacent-free blocks) are
  /// collected into the returned report and the walk continues; a
  /// zero-size block forces an immediate `Err` to avoid looping forever. If
  /// `config.panic_on_check_failure` is set, the first violation of either
  /// kind panics instead.
  pub fn check(&self) -> Result<CheckReport, AllocError> {
    let mut report = CheckReport::default();
    if self.heap.size() == 0 {
      return Ok(report);
    }

    let lo = self.heap.lo();
    let end = self.heap.end();
    let free_members: Vec<usize> = self.free_list.iter().map(|b| b as usize).collect();

    let mut cur = lo;
    while (cur as usize) < (end as usize) {
      let size = block::blocksize(cur);
      if size == 0 {
        let msg = format!("zero-size block at {cur:?}; halting walk to avoid nontermination");
        self.fail_check(&mut report, cur, msg.clone());
        return Err(AllocError::Consistency(msg));
      }

      if !block::header_footer_agree(cur) {
        self.fail_check(&mut report, cur, format!("header/footer disagree at {cur:?}"));
      }
      if (block::payload(cur) as usize) % 8 != 0 {
        self.fail_check(&mut report, cur, format!("payload at {cur:?} is not 8-byte aligned"));
      }

      let alloc = block::is_alloc(cur);
      report.block_count += 1;
      if !alloc {
        report.free_count += 1;
        report.free_bytes += size;

        let occurrences = free_members.iter().filter(|&&a| a == cur as usize).count();
        if occurrences != 1 {
          self.fail_check(
            &mut report,
            cur,
            format!("free block at {cur:?} appears {occurrences} time(s) in the free list (expected exactly 1)"),
          );
        }

        if (cur as usize) > (lo as usize) {
          let pred = block::prev_block(cur);
          if !block::is_alloc(pred) {
            self.fail_check(&mut report, cur, format!("free block at {cur:?} has a free predecessor at {pred:?}"));
          }
        }
        let next_addr = unsafe { cur.add(size) };
        if (next_addr as usize) < (end as usize) && !block::is_alloc(next_addr) {
          self.fail_check(&mut report, cur, format!("free block at {cur:?} has a free successor at {next_addr:?}"));
        }
      }

      cur = unsafe { cur.add(size) };
    }

    if (cur as usize) != (end as usize) {
      let msg = format!("heap walk ended at {cur:?}, expected {end:?} (coverage violation)");
      self.fail_check(&mut report, cur, msg);
    }

    debug!(
      "check(): {} block(s), {} free ({} bytes), {} violation(s)",
      report.block_count,
      report.free_count,
      report.free_bytes,
      report.violations.len()
    );
    Ok(report)
  }

  fn fail_check(
    &self,
    report: &mut CheckReport,
    at: *mut u8,
    description: String,
  ) {
    if self.config.panic_on_check_failure {
      panic!("heap consistency violation: {description}");
    }
    report.violations.push(Violation { at: at as usize, description });
  }
}
