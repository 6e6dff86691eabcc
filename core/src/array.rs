#![allow(unsafe_code)]

//! Traversal of contiguous, fixed-stride buffers.
//!
//! The handle's state holds an [`ArrayDescriptor`]: the buffer's base address,
//! its element count and stride, and a cursor. The operations in
//! [`READ_ONLY_OPS`] and [`MUTABLE_OPS`] turn the cursor into addresses:
//!
//! ```text
//! begin ─▶ base + 0
//! next  ─▶ base + (++cursor) * stride
//! end   ─▶ base + count * stride        (past-the-end, never dereferenced)
//! ```
//!
//! The descriptor never owns the buffer. The caller keeps it alive, and
//! unaliased where mutable, for as long as the handle is traversed.
//!
//! # Example
//!
//! ```
//! use strider_core::array;
//! use strider_core::iter::RawIter;
//!
//! let values: [u32; 3] = [0xAAAA, 0xBBBB, 0xCCCC];
//! let mut iter = RawIter::new();
//! array::create_from_slice(&mut iter, &values).unwrap();
//!
//! let mut view = iter.read_only().unwrap();
//! let seen: Vec<u32> = view
//!     .walk()
//!     .map(|p| unsafe { p.cast::<u32>().read() })
//!     .collect();
//! assert_eq!(seen, values);
//! ```

use core::fmt;
use core::mem::{align_of, size_of};
use core::ptr;

use allocator_api2::alloc::Allocator;

use crate::error::{ConfigError, IterError};
use crate::iter::{Capability, MutableOps, RawIter, ReadOnlyOps};
use crate::state::{STATE_ALIGN, StateBlock};

// =============================================================================
// ArrayDescriptor
// =============================================================================

/// Start of the traversed buffer. Which field is meaningful follows the
/// handle's capability; both are plain addresses.
#[repr(C)]
#[derive(Clone, Copy)]
union BufferBase {
    read_only: *const u8,
    mutable: *mut u8,
}

/// The array implementation's view of a handle's state block.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ArrayDescriptor {
    base: BufferBase,
    count: usize,
    stride: usize,
    cursor: usize,
}

static_assertions::assert_eq_size!(ArrayDescriptor, [usize; 4]);
static_assertions::const_assert!(align_of::<ArrayDescriptor>() <= STATE_ALIGN);

/// State size to construct a handle with before binding a buffer.
pub const DESCRIPTOR_SIZE: usize = size_of::<ArrayDescriptor>();

impl ArrayDescriptor {
    pub fn base(&self) -> *const u8 {
        // SAFETY: both union fields are raw pointers of identical layout.
        unsafe { self.base.read_only }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Index of the element last returned by `begin` or `next`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Address of element `index`. Wraps instead of overflowing, so
    /// addresses past `end` can be computed but must not be dereferenced.
    fn read_only_at(&self, index: usize) -> *const u8 {
        self.base().wrapping_add(index.wrapping_mul(self.stride))
    }

    fn mutable_at(&self, index: usize) -> *mut u8 {
        // SAFETY: both union fields are raw pointers of identical layout.
        let base = unsafe { self.base.mutable };
        base.wrapping_add(index.wrapping_mul(self.stride))
    }
}

impl fmt::Debug for ArrayDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDescriptor")
            .field("base", &self.base())
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("cursor", &self.cursor)
            .finish()
    }
}

fn descriptor_mut(state: &mut StateBlock) -> Option<&mut ArrayDescriptor> {
    // SAFETY: ArrayDescriptor is repr(C) over raw pointers and usizes, valid
    // for any initialized bytes; state blocks are always initialized.
    unsafe { state.view_mut::<ArrayDescriptor>() }
}

/// Snapshot of the descriptor stored in `iter`'s state.
///
/// `None` if the handle is unconstructed or its state is too small.
pub fn descriptor<A: Allocator>(iter: &RawIter<A>) -> Option<ArrayDescriptor> {
    let state = iter.state()?;
    // SAFETY: see `descriptor_mut`.
    unsafe { state.view::<ArrayDescriptor>() }.copied()
}

// =============================================================================
// Operations
// =============================================================================

// A state block too small for a descriptor cannot have been populated by
// `bind_*_buffer`; the operations answer with a null address.

fn read_only_begin(state: &mut StateBlock) -> *const u8 {
    descriptor_mut(state).map_or(ptr::null(), |d| {
        d.cursor = 0;
        d.read_only_at(0)
    })
}

fn read_only_next(state: &mut StateBlock) -> *const u8 {
    descriptor_mut(state).map_or(ptr::null(), |d| {
        d.cursor = d.cursor.wrapping_add(1);
        d.read_only_at(d.cursor)
    })
}

fn read_only_end(state: &mut StateBlock) -> *const u8 {
    descriptor_mut(state).map_or(ptr::null(), |d| d.read_only_at(d.count))
}

fn mutable_begin(state: &mut StateBlock) -> *mut u8 {
    descriptor_mut(state).map_or(ptr::null_mut(), |d| {
        d.cursor = 0;
        d.mutable_at(0)
    })
}

fn mutable_next(state: &mut StateBlock) -> *mut u8 {
    descriptor_mut(state).map_or(ptr::null_mut(), |d| {
        d.cursor = d.cursor.wrapping_add(1);
        d.mutable_at(d.cursor)
    })
}

fn mutable_end(state: &mut StateBlock) -> *mut u8 {
    descriptor_mut(state).map_or(ptr::null_mut(), |d| d.mutable_at(d.count))
}

pub const READ_ONLY_OPS: ReadOnlyOps = ReadOnlyOps {
    begin: read_only_begin,
    next: read_only_next,
    end: read_only_end,
};

pub const MUTABLE_OPS: MutableOps = MutableOps {
    begin: mutable_begin,
    next: mutable_next,
    end: mutable_end,
};

// =============================================================================
// Binding buffers
// =============================================================================

/// Points a read-only handle at `count` elements of `stride` bytes at `base`.
///
/// The cursor keeps its value until the next `begin`. On error nothing in the
/// descriptor is written.
pub fn bind_read_only_buffer<A: Allocator>(
    iter: &mut RawIter<A>,
    base: *const u8,
    count: usize,
    stride: usize,
) -> Result<(), IterError> {
    if base.is_null() {
        return Err(IterError::InvalidArgument("buffer base is null"));
    }
    let descriptor = checked_descriptor(iter, Capability::ReadOnly, stride)?;
    descriptor.base = BufferBase { read_only: base };
    descriptor.count = count;
    descriptor.stride = stride;
    tracing::trace!(?base, count, stride, "Bound read-only buffer");
    Ok(())
}

/// Points a mutable handle at `count` elements of `stride` bytes at `base`.
///
/// The cursor keeps its value until the next `begin`. On error nothing in the
/// descriptor is written.
pub fn bind_mutable_buffer<A: Allocator>(
    iter: &mut RawIter<A>,
    base: *mut u8,
    count: usize,
    stride: usize,
) -> Result<(), IterError> {
    if base.is_null() {
        return Err(IterError::InvalidArgument("buffer base is null"));
    }
    let descriptor = checked_descriptor(iter, Capability::Mutable, stride)?;
    descriptor.base = BufferBase { mutable: base };
    descriptor.count = count;
    descriptor.stride = stride;
    tracing::trace!(?base, count, stride, "Bound mutable buffer");
    Ok(())
}

fn checked_descriptor<A: Allocator>(
    iter: &mut RawIter<A>,
    expected: Capability,
    stride: usize,
) -> Result<&mut ArrayDescriptor, IterError> {
    if !iter.is_constructed() {
        return Err(IterError::InvalidArgument("handle is not constructed"));
    }
    if stride == 0 {
        return Err(ConfigError::ZeroStride.into());
    }
    let state = iter.checked_state(expected)?;
    let size = state.len();
    descriptor_mut(state).ok_or(IterError::Config(ConfigError::StateTooSmall {
        size,
        needed: DESCRIPTOR_SIZE,
    }))
}

// =============================================================================
// One-call creation
// =============================================================================

/// Constructs, binds read-only and points `iter` at the buffer in one step.
///
/// On any failure the handle is destructed, leaving it unconstructed.
pub fn create_read_only<A: Allocator>(
    iter: &mut RawIter<A>,
    base: *const u8,
    count: usize,
    stride: usize,
) -> Result<(), IterError> {
    create(iter, |iter| {
        iter.bind_read_only(READ_ONLY_OPS)?;
        bind_read_only_buffer(iter, base, count, stride)
    })
}

/// Mutable counterpart of [`create_read_only`].
pub fn create_mutable<A: Allocator>(
    iter: &mut RawIter<A>,
    base: *mut u8,
    count: usize,
    stride: usize,
) -> Result<(), IterError> {
    create(iter, |iter| {
        iter.bind_mutable(MUTABLE_OPS)?;
        bind_mutable_buffer(iter, base, count, stride)
    })
}

/// [`create_read_only`] over a slice; the stride is `size_of::<T>()`.
///
/// Zero-sized `T` is rejected with [`ConfigError::ZeroStride`].
pub fn create_from_slice<T, A: Allocator>(
    iter: &mut RawIter<A>,
    elements: &[T],
) -> Result<(), IterError> {
    create_read_only(
        iter,
        elements.as_ptr().cast(),
        elements.len(),
        size_of::<T>(),
    )
}

/// [`create_mutable`] over a slice; the stride is `size_of::<T>()`.
pub fn create_from_mut_slice<T, A: Allocator>(
    iter: &mut RawIter<A>,
    elements: &mut [T],
) -> Result<(), IterError> {
    create_mutable(
        iter,
        elements.as_mut_ptr().cast(),
        elements.len(),
        size_of::<T>(),
    )
}

fn create<A: Allocator>(
    iter: &mut RawIter<A>,
    bind: impl FnOnce(&mut RawIter<A>) -> Result<(), IterError>,
) -> Result<(), IterError> {
    let result = iter.construct(DESCRIPTOR_SIZE).and_then(|()| bind(iter));
    if let Err(error) = &result {
        tracing::warn!(%error, "Array iterator creation failed; rolling back");
        iter.destruct();
    }
    result
}
