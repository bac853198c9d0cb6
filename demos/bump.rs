use std::io::Read;

use fitalloc::Allocator;
use libc::sbrk;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
/// The program break is the upper boundary of the heap managed via brk/sbrk.
unsafe fn print_program_break(label: &str) {
  println!("[{}] PID = {}, program break (sbrk(0)) = {:?}", label, std::process::id(), unsafe { sbrk(0) });
}

fn main() {
  env_logger::init();

  // Our allocator holds an `sbrk`-backed heap, a doubly-linked free list,
  // and a pointer to the physically last block, and places each request
  // with a best-fit search over the free list before ever growing the heap.
  let mut allocator = Allocator::new();
  allocator.init().expect("heap init should succeed");

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 1) Allocate three blocks back to back.
    // ------------------------------------------------------------------
    let a = allocator.alloc(32);
    let b = allocator.alloc(64);
    let c = allocator.alloc(16);
    println!("\n[1] a = {a:?}, b = {b:?}, c = {c:?}");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 2) Free the outer two. Since neither is adjacent to another free
    //    block yet, they just sit on the free list as two entries.
    // ------------------------------------------------------------------
    allocator.free(a);
    allocator.free(c);
    println!("\n[2] Freed a and c; check() reports:");
    println!("{:#?}", allocator.check().unwrap());
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 3) Free the middle block. It coalesces with both neighbors, which
    //    are now both free, producing one large free block.
    // ------------------------------------------------------------------
    allocator.free(b);
    println!("\n[3] Freed b; a, b, c are now one coalesced free block. check() reports:");
    println!("{:#?}", allocator.check().unwrap());
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 4) Allocate something smaller than the coalesced block. The
    //    allocator reuses it via a split instead of growing the heap.
    // ------------------------------------------------------------------
    print_program_break("before reuse");
    let d = allocator.alloc(16);
    print_program_break("after reuse");
    println!("\n[4] d = {d:?}, d == a? {} (reused the coalesced block via split)", d == a);
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 5) Allocate something larger than anything on the free list. This
    //    is the only point that actually moves the program break.
    // ------------------------------------------------------------------
    print_program_break("before growth");
    let e = allocator.alloc(64 * 1024);
    print_program_break("after growth");
    println!("\n[5] e = {e:?} (64 KiB, forced heap growth)");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 6) realloc preserves the leading bytes of the old allocation.
    // ------------------------------------------------------------------
    (d as *mut u64).write(0x1122334455667788);
    let d2 = allocator.realloc(d, 256);
    println!("\n[6] d2 = {d2:?}, preserved value = {:#X}", (d2 as *mut u64).read());
    block_until_enter_pressed();

    allocator.free(d2);
    allocator.free(e);
    println!("\n[7] End of demo. Final heap state:");
    println!("{:#?}", allocator.check().unwrap());
  }
}
