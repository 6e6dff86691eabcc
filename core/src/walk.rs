//! Half-open walks over a bound handle.
//!
//! [`Walk`] drives the three operations of a handle the canonical way:
//!
//! ```text
//! end = end(); p = begin();
//! while p != end { yield p; p = next(); }
//! ```
//!
//! so a sequence of `count` elements yields exactly `count` addresses, and an
//! empty one yields none. `next` is never called once `end` has been reached.

use core::fmt;
use core::iter::FusedIterator;

use crate::iter::{MutableOps, Operations, ReadOnlyOps};
use crate::state::StateBlock;

/// Iterator over the element addresses of one traversal pass.
///
/// Created by [`Traversal::walk`](crate::iter::Traversal::walk).
pub struct Walk<'a, O: Operations> {
    state: &'a mut StateBlock,
    ops: O,
    end: O::Ptr,
    started: bool,
    done: bool,
}

pub type ReadOnlyWalk<'a> = Walk<'a, ReadOnlyOps>;
pub type MutableWalk<'a> = Walk<'a, MutableOps>;

impl<'a, O: Operations> Walk<'a, O> {
    pub(crate) fn new(state: &'a mut StateBlock, ops: O) -> Self {
        let end = ops.end(state);
        Walk {
            state,
            ops,
            end,
            started: false,
            done: false,
        }
    }

    /// The past-the-end address this walk stops at.
    pub fn end(&self) -> O::Ptr {
        self.end
    }
}

impl<O: Operations> Iterator for Walk<'_, O> {
    type Item = O::Ptr;

    fn next(&mut self) -> Option<O::Ptr> {
        if self.done {
            return None;
        }
        let position = if self.started {
            self.ops.next(self.state)
        } else {
            self.started = true;
            self.ops.begin(self.state)
        };
        if position == self.end {
            self.done = true;
            return None;
        }
        Some(position)
    }
}

impl<O: Operations> FusedIterator for Walk<'_, O> {}

impl<O: Operations> fmt::Debug for Walk<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walk")
            .field("capability", &O::CAPABILITY)
            .field("end", &self.end)
            .field("done", &self.done)
            .finish()
    }
}
