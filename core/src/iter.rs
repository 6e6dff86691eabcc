#![allow(unsafe_code)]

//! The generic iterator handle.
//!
//! A [`RawIter`] knows nothing about what it traverses. It owns an opaque
//! [`StateBlock`] and a table of three operations (`begin`, `next`, `end`)
//! supplied by a concrete implementation such as [`crate::array`]. The table
//! is either read-only or mutable; which one is the handle's [`Capability`].
//!
//! # Lifecycle
//!
//! ```text
//! new() ──▶ construct(size) ──▶ bind_*(ops) ──▶ implementation fills state
//!   ▲                                              │
//!   └──────────── destruct() / drop ◀── traverse ◀─┘ (any number of passes)
//! ```
//!
//! A handle is only traversable once it is both constructed and bound;
//! [`RawIter::read_only`] and [`RawIter::mutable`] enforce this by returning a
//! view only in that state. Dropping a handle releases its state block, so
//! early returns cannot leak it.
//!
//! # Example
//!
//! ```
//! use strider_core::iter::{RawIter, ReadOnlyOps};
//! use strider_core::state::StateBlock;
//!
//! fn first(state: &mut StateBlock) -> *const u8 {
//!     state.as_ptr().as_ptr()
//! }
//!
//! fn past(state: &mut StateBlock) -> *const u8 {
//!     state.as_ptr().as_ptr().wrapping_add(state.len())
//! }
//!
//! let mut iter = RawIter::with_state_size(4).unwrap();
//! iter.bind_read_only(ReadOnlyOps { begin: first, next: past, end: past }).unwrap();
//!
//! let mut view = iter.read_only().unwrap();
//! assert_eq!(view.walk().count(), 1);
//! ```

use core::fmt;

use allocator_api2::alloc::{Allocator, Global};

use crate::error::{ConfigError, IterError};
use crate::state::StateBlock;
use crate::walk::Walk;

// =============================================================================
// Capability and operation tables
// =============================================================================

/// Whether a handle hands out read-only or mutable element addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReadOnly,
    Mutable,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReadOnly => f.write_str("read-only"),
            Capability::Mutable => f.write_str("mutable"),
        }
    }
}

/// A read-only traversal step: returns the address of an immutable element.
pub type ReadOnlyFn = fn(&mut StateBlock) -> *const u8;

/// A mutable traversal step: returns the address of a mutable element.
pub type MutableFn = fn(&mut StateBlock) -> *mut u8;

/// Operation table for the read-only capability.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyOps {
    pub begin: ReadOnlyFn,
    pub next: ReadOnlyFn,
    pub end: ReadOnlyFn,
}

/// Operation table for the mutable capability.
#[derive(Debug, Clone, Copy)]
pub struct MutableOps {
    pub begin: MutableFn,
    pub next: MutableFn,
    pub end: MutableFn,
}

/// The table bound to a handle, tagged by capability.
#[derive(Debug, Clone, Copy)]
pub enum Ops {
    ReadOnly(ReadOnlyOps),
    Mutable(MutableOps),
}

impl Ops {
    pub fn capability(&self) -> Capability {
        match self {
            Ops::ReadOnly(_) => Capability::ReadOnly,
            Ops::Mutable(_) => Capability::Mutable,
        }
    }
}

mod private {
    pub trait Sealed {}
}

/// Common shape of [`ReadOnlyOps`] and [`MutableOps`].
///
/// Lets [`Traversal`] and [`Walk`] be written once for both capabilities.
/// This is a sealed trait - it cannot be implemented outside this crate.
pub trait Operations: private::Sealed + Copy {
    /// Element address type handed out by this capability.
    type Ptr: Copy + PartialEq + fmt::Debug;

    const CAPABILITY: Capability;

    fn begin(&self, state: &mut StateBlock) -> Self::Ptr;
    fn next(&self, state: &mut StateBlock) -> Self::Ptr;
    fn end(&self, state: &mut StateBlock) -> Self::Ptr;

    #[doc(hidden)]
    fn select(ops: Ops) -> Option<Self>;
}

impl private::Sealed for ReadOnlyOps {}

impl Operations for ReadOnlyOps {
    type Ptr = *const u8;

    const CAPABILITY: Capability = Capability::ReadOnly;

    #[inline]
    fn begin(&self, state: &mut StateBlock) -> *const u8 {
        (self.begin)(state)
    }

    #[inline]
    fn next(&self, state: &mut StateBlock) -> *const u8 {
        (self.next)(state)
    }

    #[inline]
    fn end(&self, state: &mut StateBlock) -> *const u8 {
        (self.end)(state)
    }

    fn select(ops: Ops) -> Option<Self> {
        match ops {
            Ops::ReadOnly(ops) => Some(ops),
            Ops::Mutable(_) => None,
        }
    }
}

impl private::Sealed for MutableOps {}

impl Operations for MutableOps {
    type Ptr = *mut u8;

    const CAPABILITY: Capability = Capability::Mutable;

    #[inline]
    fn begin(&self, state: &mut StateBlock) -> *mut u8 {
        (self.begin)(state)
    }

    #[inline]
    fn next(&self, state: &mut StateBlock) -> *mut u8 {
        (self.next)(state)
    }

    #[inline]
    fn end(&self, state: &mut StateBlock) -> *mut u8 {
        (self.end)(state)
    }

    fn select(ops: Ops) -> Option<Self> {
        match ops {
            Ops::Mutable(ops) => Some(ops),
            Ops::ReadOnly(_) => None,
        }
    }
}

// =============================================================================
// RawIter - the handle
// =============================================================================

/// A type-erased iterator handle.
///
/// Owns its state block (allocated from `A`) but never the sequence it
/// traverses. Not thread-safe: the state holds an unsynchronized cursor.
pub struct RawIter<A: Allocator = Global> {
    state: Option<StateBlock>,
    ops: Option<Ops>,
    alloc: A,
}

static_assertions::assert_not_impl_any!(RawIter: Send, Sync);

impl RawIter<Global> {
    /// An empty (unconstructed, unbound) handle using the global allocator.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a handle and constructs `state_size` bytes of state with the
    /// global allocator.
    pub fn with_state_size(state_size: usize) -> Result<Self, IterError> {
        Self::with_state_size_in(state_size, Global)
    }
}

impl Default for RawIter<Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> RawIter<A> {
    /// An empty handle that will allocate its state from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        RawIter {
            state: None,
            ops: None,
            alloc,
        }
    }

    pub fn with_state_size_in(state_size: usize, alloc: A) -> Result<Self, IterError> {
        let mut iter = Self::new_in(alloc);
        iter.construct(state_size)?;
        Ok(iter)
    }

    /// Reserves `state_size` zero-filled bytes of state.
    ///
    /// Capability and operations are cleared; call one of the `bind_*`
    /// methods afterwards. If the handle was already constructed, its old
    /// block is released once the new one has been allocated. On error the
    /// handle is left exactly as it was.
    pub fn construct(&mut self, state_size: usize) -> Result<(), IterError> {
        let block = StateBlock::allocate(&self.alloc, state_size)?;
        if self.state.is_some() {
            tracing::warn!(
                old = self.state.as_ref().map(StateBlock::len),
                new = state_size,
                "Re-constructing a live iterator; releasing previous state"
            );
            self.destruct();
        }
        tracing::debug!(size = state_size, ptr = ?block.as_ptr(), "Constructed iterator state");
        self.state = Some(block);
        self.ops = None;
        Ok(())
    }

    /// Releases the state block and unbinds the operations.
    ///
    /// Safe to call on an empty handle, where it does nothing.
    pub fn destruct(&mut self) {
        self.ops = None;
        if let Some(block) = self.state.take() {
            tracing::debug!(size = block.len(), ptr = ?block.as_ptr(), "Releasing iterator state");
            // SAFETY: every block stored in `self.state` came from `self.alloc`.
            unsafe { block.release(&self.alloc) };
        }
    }

    /// Whether the handle currently owns a state block.
    pub fn is_constructed(&self) -> bool {
        self.state.is_some()
    }

    pub fn capability(&self) -> Option<Capability> {
        self.ops.as_ref().map(Ops::capability)
    }

    pub fn ops(&self) -> Option<&Ops> {
        self.ops.as_ref()
    }

    /// Installs a read-only operation table.
    ///
    /// Overwrites any previous binding; the state block is not touched.
    pub fn bind_read_only(&mut self, ops: ReadOnlyOps) -> Result<(), IterError> {
        self.bind(Ops::ReadOnly(ops))
    }

    /// Installs a mutable operation table.
    ///
    /// Overwrites any previous binding; the state block is not touched.
    pub fn bind_mutable(&mut self, ops: MutableOps) -> Result<(), IterError> {
        self.bind(Ops::Mutable(ops))
    }

    fn bind(&mut self, ops: Ops) -> Result<(), IterError> {
        if self.state.is_none() {
            return Err(IterError::InvalidArgument(
                "cannot bind operations before state is constructed",
            ));
        }
        tracing::trace!(capability = %ops.capability(), "Bound iterator operations");
        self.ops = Some(ops);
        Ok(())
    }

    pub fn state(&self) -> Option<&StateBlock> {
        self.state.as_ref()
    }

    /// Mutable access to the state block, for implementations populating it.
    pub fn state_mut(&mut self) -> Option<&mut StateBlock> {
        self.state.as_mut()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Read-only traversal view. Requires a constructed, read-only handle.
    pub fn read_only(&mut self) -> Result<ReadOnlyTraversal<'_>, IterError> {
        self.traversal()
    }

    /// Mutable traversal view. Requires a constructed, mutable handle.
    pub fn mutable(&mut self) -> Result<MutableTraversal<'_>, IterError> {
        self.traversal()
    }

    fn traversal<O: Operations>(&mut self) -> Result<Traversal<'_, O>, IterError> {
        let (state, ops) = self.checked_parts(O::CAPABILITY)?;
        let ops = O::select(ops).ok_or(IterError::mismatch(O::CAPABILITY, ops.capability()))?;
        Ok(Traversal { state, ops })
    }

    /// State block of a constructed handle bound with `expected` capability.
    pub(crate) fn checked_state(
        &mut self,
        expected: Capability,
    ) -> Result<&mut StateBlock, IterError> {
        self.checked_parts(expected).map(|(state, _)| state)
    }

    fn checked_parts(
        &mut self,
        expected: Capability,
    ) -> Result<(&mut StateBlock, Ops), IterError> {
        let state = self
            .state
            .as_mut()
            .ok_or(IterError::InvalidArgument("handle is not constructed"))?;
        let ops = self.ops.ok_or(ConfigError::Unbound)?;
        if ops.capability() != expected {
            return Err(IterError::mismatch(expected, ops.capability()));
        }
        Ok((state, ops))
    }
}

impl<A: Allocator> Drop for RawIter<A> {
    fn drop(&mut self) {
        self.destruct();
    }
}

impl<A: Allocator> fmt::Debug for RawIter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawIter")
            .field("state", &self.state)
            .field("capability", &self.capability())
            .finish()
    }
}

// =============================================================================
// Traversal views
// =============================================================================

/// A borrowed view of a constructed, bound handle.
///
/// Only obtainable through [`RawIter::read_only`] or [`RawIter::mutable`], so
/// state and operations are always both present.
pub struct Traversal<'a, O: Operations> {
    state: &'a mut StateBlock,
    ops: O,
}

pub type ReadOnlyTraversal<'a> = Traversal<'a, ReadOnlyOps>;
pub type MutableTraversal<'a> = Traversal<'a, MutableOps>;

impl<'a, O: Operations> Traversal<'a, O> {
    /// Rewinds to the first element and returns its address.
    pub fn begin(&mut self) -> O::Ptr {
        self.ops.begin(self.state)
    }

    /// Advances one element and returns its address.
    ///
    /// Performs no bounds check. Stop once the returned address equals
    /// [`Traversal::end`]; stepping further yields addresses outside the
    /// sequence, which must never be dereferenced.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> O::Ptr {
        self.ops.next(self.state)
    }

    /// The past-the-end address. Never dereference it.
    pub fn end(&mut self) -> O::Ptr {
        self.ops.end(self.state)
    }

    /// Walks `[begin, end)` as a Rust iterator of element addresses.
    ///
    /// Each call starts a fresh pass from `begin`.
    pub fn walk(&mut self) -> Walk<'_, O> {
        Walk::new(self.state, self.ops)
    }

    pub fn state(&self) -> &StateBlock {
        &*self.state
    }
}

impl<O: Operations> fmt::Debug for Traversal<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("capability", &O::CAPABILITY)
            .field("state", &self.state)
            .finish()
    }
}
