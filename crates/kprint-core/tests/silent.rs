#![cfg(not(feature = "log-execution"))]

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use kprint_core::{print_all, print_into, print_mask, print_single, try_print_all, Outcome};

struct Counting;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.with(|n| n.set(n.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

#[test]
fn gate_is_reported() {
    assert!(!kprint_core::INSTRUMENTED);
}

#[test]
fn disabled_calls_neither_evaluate_nor_allocate() {
    let mut evaluated = false;
    let before = allocations();

    print_all!(unit => 3, c"x=%d\n", {
        evaluated = true;
        1
    });
    print_mask!(unit => 0, 0b1, c"%s", vec![0u8; 64].as_ptr());
    print_single!(0, c"boom %d", panic!("argument evaluated"));
    print_into!(buf, unit => 0, policy, c"%d", panic!("argument evaluated"));

    assert_eq!(allocations(), before);
    assert!(!evaluated);
}

#[test]
fn try_forms_report_nothing_prepared() {
    let outcome = try_print_all!(unit => 1, c"never");
    assert_eq!(outcome, Ok(Outcome::Suppressed { prepared: 0 }));
}
