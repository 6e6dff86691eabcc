//! Allocators shared by the integration tests.

#![allow(dead_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use allocator_api2::alloc::{AllocError, Allocator, Global};

/// Forwards to the global allocator and tracks live allocations.
#[derive(Debug, Clone, Default)]
pub struct CountingAlloc {
    live: Rc<Cell<usize>>,
    total: Rc<Cell<usize>>,
}

impl CountingAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocations not yet returned.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Allocations ever made.
    pub fn total(&self) -> usize {
        self.total.get()
    }
}

unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let block = Global.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        self.total.set(self.total.get() + 1);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// Refuses every request, like an exhausted heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustedAlloc;

unsafe impl Allocator for ExhaustedAlloc {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

/// Reads the `T` at an address handed out by a traversal.
pub fn read<T: Copy>(p: *const u8) -> T {
    unsafe { p.cast::<T>().read_unaligned() }
}
