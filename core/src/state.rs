#![allow(unsafe_code)]

//! The opaque state block owned by an iterator handle.
//!
//! A traversal implementation keeps its bookkeeping (for arrays: base, count,
//! stride and cursor) in a block of bytes whose layout only it knows. The
//! handle allocates and frees the block; the implementation reinterprets it
//! through [`StateBlock::view_mut`].
//!
//! ```text
//! RawIter ──▶ StateBlock ──▶ [ implementation-defined bytes ... ]
//!                            └── zero-filled on allocation ──┘
//! ```
//!
//! The bytes are always initialized, so reading them is never undefined. What
//! they *mean* is up to the implementation that was bound.

use core::alloc::Layout;
use core::fmt;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use allocator_api2::alloc::Allocator;

use crate::error::IterError;

/// Alignment of every state block.
///
/// Large enough for any descriptor built from pointers and integers up to
/// 128 bits.
pub const STATE_ALIGN: usize = 16;

/// A zero-filled, exclusively owned block of iterator state.
///
/// Not `Send` or `Sync`: the block holds a mutable cursor that is never
/// synchronized.
pub struct StateBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

static_assertions::assert_not_impl_any!(StateBlock: Send, Sync, Clone);

impl StateBlock {
    /// Reserves `size` zeroed bytes from `alloc`.
    pub(crate) fn allocate<A: Allocator>(alloc: &A, size: usize) -> Result<Self, IterError> {
        let layout =
            Layout::from_size_align(size, STATE_ALIGN).map_err(|_| IterError::Alloc { size })?;
        let block = alloc
            .allocate_zeroed(layout)
            .map_err(|_| IterError::Alloc { size })?;
        Ok(StateBlock {
            ptr: block.cast(),
            layout,
        })
    }

    /// Returns the block to the allocator it came from.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator (or a clone of it) that produced this
    /// block in [`StateBlock::allocate`].
    pub(crate) unsafe fn release<A: Allocator>(self, alloc: &A) {
        // SAFETY: the caller guarantees `alloc` allocated `ptr` with `layout`.
        unsafe { alloc.deallocate(self.ptr, self.layout) }
    }

    /// Number of bytes in the block.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the first byte.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the block is `len` initialized bytes owned by `self`.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }

    /// Whether a `T` fits at the start of the block.
    pub fn fits<T>(&self) -> bool {
        size_of::<T>() <= self.len() && self.ptr.as_ptr().align_offset(align_of::<T>()) == 0
    }

    /// Reinterprets the start of the block as a `T`.
    ///
    /// Returns `None` if the block is too small or misaligned for `T`.
    ///
    /// # Safety
    ///
    /// Every initialized bit pattern of `size_of::<T>()` bytes must be a valid
    /// `T` (plain integers, raw pointers and `repr(C)` aggregates of them).
    pub unsafe fn view<T>(&self) -> Option<&T> {
        if !self.fits::<T>() {
            return None;
        }
        // SAFETY: size and alignment checked above; validity is the caller's contract.
        Some(unsafe { self.ptr.cast::<T>().as_ref() })
    }

    /// Mutable counterpart of [`StateBlock::view`].
    ///
    /// # Safety
    ///
    /// Same contract as [`StateBlock::view`].
    pub unsafe fn view_mut<T>(&mut self) -> Option<&mut T> {
        if !self.fits::<T>() {
            return None;
        }
        // SAFETY: size and alignment checked above; validity is the caller's contract.
        Some(unsafe { self.ptr.cast::<T>().as_mut() })
    }
}

impl fmt::Debug for StateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBlock")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .finish()
    }
}
