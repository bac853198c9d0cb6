//! The heap provider: the external collaborator that supplies raw, growable
//! memory. The allocator core is generic over anything implementing
//! [`HeapProvider`]; [`SbrkHeap`] is the one concrete body this crate ships,
//! driving `libc::sbrk` directly.

use libc::{intptr_t, sbrk};
use log::{debug, trace};

use crate::error::AllocError;

/// A source of raw, monotonically-extendable heap memory.
///
/// Implementors need not be thread-safe; the allocator built on top of this
/// trait is itself `!Sync`.
pub trait HeapProvider {
  /// Resets the heap region to empty. Must be called before any other
  /// method.
  fn init(&mut self) -> Result<(), AllocError>;

  /// Grows the heap by `delta_bytes` and returns the address of the first
  /// new byte.
  fn extend(&mut self, delta_bytes: usize) -> Result<*mut u8, AllocError>;

  /// Start address of the managed region (after any alignment pad).
  fn lo(&self) -> *mut u8;

  /// Address one past the last byte of the managed region (i.e. the current
  /// break). Equal to `lo()` when the heap is empty.
  fn end(&self) -> *mut u8;

  /// Total bytes currently available to the allocator (excludes the pad).
  fn size(&self) -> usize;
}

/// A [`HeapProvider`] backed by the POSIX `sbrk` system call.
pub struct SbrkHeap {
  lo: *mut u8,
  size: usize,
}

impl SbrkHeap {
  pub fn new() -> Self {
    Self { lo: std::ptr::null_mut(), size: 0 }
  }
}

impl Default for SbrkHeap {
  fn default() -> Self {
    Self::new()
  }
}

impl HeapProvider for SbrkHeap {
  fn init(&mut self) -> Result<(), AllocError> {
    // OFFSET = align8(current break) - current break: a pad so that
    // block_0's payload (which starts WORD bytes after block_0's header,
    // and WORD is itself 8-aligned) lands on an 8-byte boundary regardless
    // of where the OS initially placed the break.
    let raw = unsafe { sbrk(0) };
    if raw as usize == usize::MAX {
      return Err(AllocError::OutOfMemory);
    }
    let pad = crate::align_to!(raw as usize, 8) - raw as usize;
    if pad > 0 {
      let padded = unsafe { sbrk(pad as intptr_t) };
      if padded as usize == usize::MAX {
        return Err(AllocError::OutOfMemory);
      }
    }
    let lo = unsafe { sbrk(0) };
    if lo as usize == usize::MAX {
      return Err(AllocError::OutOfMemory);
    }
    self.lo = lo as *mut u8;
    self.size = 0;
    debug!("heap initialized: lo = {:?}, pad = {} bytes", self.lo, pad);
    Ok(())
  }

  fn extend(
    &mut self,
    delta_bytes: usize,
  ) -> Result<*mut u8, AllocError> {
    debug_assert_eq!(delta_bytes % 8, 0, "heap extension must be 8-aligned: {delta_bytes}");
    let raw = unsafe { sbrk(delta_bytes as intptr_t) };
    if raw as usize == usize::MAX {
      return Err(AllocError::OutOfMemory);
    }
    self.size += delta_bytes;
    trace!("heap extended by {} bytes at {:?}, total size {}", delta_bytes, raw, self.size);
    Ok(raw as *mut u8)
  }

  fn lo(&self) -> *mut u8 {
    self.lo
  }

  fn end(&self) -> *mut u8 {
    unsafe { self.lo.add(self.size) }
  }

  fn size(&self) -> usize {
    self.size
  }
}

/// A [`HeapProvider`] backed by a fixed-capacity, boxed arena instead of the
/// process break.
///
/// `sbrk` is process-global state shared by every thread and every other
/// `SbrkHeap` instance, which makes it awkward to exercise the allocator
/// deterministically (property tests in particular want many independent
/// heaps). `VecHeap` gives the allocator core the same `HeapProvider`
/// contract over memory it owns outright, so tests never touch the real
/// break and can run fully in parallel.
pub struct VecHeap {
  arena: Box<[u8]>,
  lo: *mut u8,
  size: usize,
}

impl VecHeap {
  /// Reserves `capacity` bytes up front; `extend` fails with
  /// `AllocError::OutOfMemory` once that capacity is exhausted.
  pub fn with_capacity(capacity: usize) -> Self {
    let mut arena = vec![0u8; capacity].into_boxed_slice();
    let lo = arena.as_mut_ptr();
    Self { arena, lo, size: 0 }
  }
}

impl HeapProvider for VecHeap {
  fn init(&mut self) -> Result<(), AllocError> {
    self.size = 0;
    Ok(())
  }

  fn extend(
    &mut self,
    delta_bytes: usize,
  ) -> Result<*mut u8, AllocError> {
    debug_assert_eq!(delta_bytes % 8, 0, "heap extension must be 8-aligned: {delta_bytes}");
    if self.size + delta_bytes > self.arena.len() {
      return Err(AllocError::OutOfMemory);
    }
    let start = unsafe { self.lo.add(self.size) };
    self.size += delta_bytes;
    Ok(start)
  }

  fn lo(&self) -> *mut u8 {
    self.lo
  }

  fn end(&self) -> *mut u8 {
    unsafe { self.lo.add(self.size) }
  }

  fn size(&self) -> usize {
    self.size
  }
}
