//! Property tests driving randomized alloc/free/realloc sequences through
//! `Allocator<VecHeap>` and asserting the heap stays internally consistent
//! after every operation.

use fitalloc::{Allocator, VecHeap};
use proptest::collection::vec;
use proptest::prelude::*;

const ARENA_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
enum Op {
  Alloc(usize),
  Free(usize),
  Realloc(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1usize..512).prop_map(Op::Alloc),
    (0usize..64).prop_map(Op::Free),
    ((0usize..64), (1usize..512)).prop_map(|(i, s)| Op::Realloc(i, s)),
  ]
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(256))]

  /// After any sequence of alloc/free/realloc calls (indices into a
  /// growing vector of live pointers, out-of-range indices simply skipped),
  /// `check()` must report a sound heap: no tag mismatches, no misaligned
  /// payloads, no free block adjacent to another free block, and the free
  /// list must match the heap walk exactly.
  #[test]
  fn heap_stays_sound_under_random_operations(ops in vec(op_strategy(), 1..200)) {
    let mut allocator = Allocator::with_provider(VecHeap::with_capacity(ARENA_BYTES));
    allocator.init().unwrap();
    let mut live: Vec<*mut u8> = Vec::new();

    for op in ops {
      let op_desc = format!("{op:?}");
      unsafe {
        match op {
          Op::Alloc(size) => {
            let p = allocator.alloc(size);
            if !p.is_null() {
              live.push(p);
            }
          }
          Op::Free(idx) => {
            if !live.is_empty() {
              let p = live.remove(idx % live.len());
              allocator.free(p);
            }
          }
          Op::Realloc(idx, size) => {
            if !live.is_empty() {
              let i = idx % live.len();
              let p = live[i];
              let q = allocator.realloc(p, size);
              if !q.is_null() {
                live[i] = q;
              } else {
                live.remove(i);
              }
            }
          }
        }
      }

      let report = allocator.check().expect("check() should not hit a hard violation");
      prop_assert!(report.is_sound(), "heap unsound after {op_desc}: {:#?}", report.violations);
    }

    unsafe {
      for p in live {
        allocator.free(p);
      }
    }
    let report = allocator.check().unwrap();
    prop_assert!(report.is_sound());
  }

  /// realloc must always preserve the leading min(old, new) bytes of the
  /// original allocation's content.
  #[test]
  fn realloc_preserves_leading_bytes(
    old_size in 1usize..256,
    new_size in 1usize..256,
    fill in any::<u8>(),
  ) {
    let mut allocator = Allocator::with_provider(VecHeap::with_capacity(ARENA_BYTES));
    allocator.init().unwrap();

    let p = unsafe { allocator.alloc(old_size) };
    prop_assume!(!p.is_null());
    unsafe { std::ptr::write_bytes(p, fill, old_size) };

    let q = unsafe { allocator.realloc(p, new_size) };
    prop_assume!(!q.is_null());

    let preserved = old_size.min(new_size);
    let bytes = unsafe { std::slice::from_raw_parts(q, preserved) };
    prop_assert!(bytes.iter().all(|&b| b == fill));

    unsafe { allocator.free(q) };
  }
}
