//! Tunable knobs for an [`crate::Allocator`] instance.
//!
//! Constructed via [`AllocatorConfig::default`]; `Allocator::new()` delegates
//! to `Allocator::with_config(AllocatorConfig::default())`.

/// Configuration for a single [`crate::Allocator`] instance.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
  /// Bytes to `extend` eagerly in `init()` before the first `alloc`. `0`
  /// (the default) means lazy growth: the heap only grows when an
  /// allocation actually needs it.
  pub initial_reservation: usize,

  /// Raises the effective minimum block size above the structural floor
  /// (`block::BLOCK_MIN`, fixed by the two free-list pointers every free
  /// block must have room for). Lets tests force coarser splitting/remainder
  /// behavior with small, humanly-countable block sizes without touching the
  /// structural floor itself. `None`, or any value `<= block::BLOCK_MIN`,
  /// leaves the floor at `block::BLOCK_MIN`.
  pub min_block_override: Option<usize>,

  /// If true, `check()` panics on the first invariant violation instead of
  /// collecting it into the returned `CheckReport`. Useful under fuzzing,
  /// where you want the process to die at the point of corruption rather
  /// than limp along.
  pub panic_on_check_failure: bool,
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self { initial_reservation: 0, min_block_override: None, panic_on_check_failure: false }
  }
}
