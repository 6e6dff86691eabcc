//! Strider - type-erased traversal of contiguous sequences
//!
//! # Overview
//!
//! Strider walks any contiguous buffer of homogeneous elements without the
//! walking code knowing the element type. A handle owns a small block of
//! bookkeeping state, allocated from an allocator you choose, and a table of
//! `begin` / `next` / `end` operations. The array implementation fills that
//! state with a base address, an element count and a stride.
//!
//! # Quick Start
//!
//! ```
//! use strider::{RawIter, array};
//!
//! let mut values = [1u32, 2, 3];
//!
//! let mut iter = RawIter::new();
//! array::create_from_mut_slice(&mut iter, &mut values).unwrap();
//!
//! for p in iter.mutable().unwrap().walk() {
//!     // SAFETY: the buffer outlives the handle and holds u32s.
//!     unsafe { *p.cast::<u32>() += 1 };
//! }
//! drop(iter);
//! assert_eq!(values, [2, 3, 4]);
//! ```
//!
//! # Custom Allocators
//!
//! State blocks come from any [`allocator_api2`] allocator, such as a
//! `bumpalo` arena:
//!
//! ```
//! use bumpalo::Bump;
//! use strider::{RawIter, array};
//!
//! let arena = Bump::new();
//! let values = [0xAAAAu32, 0xBBBB, 0xCCCC];
//!
//! let mut iter = RawIter::new_in(&arena);
//! array::create_from_slice(&mut iter, &values).unwrap();
//! assert_eq!(iter.read_only().unwrap().walk().count(), 3);
//! ```
//!
//! # Safety Model
//!
//! Handles never own the buffers they traverse. Binding and walking are safe;
//! dereferencing a yielded address is `unsafe` and requires the buffer to
//! still be alive and, for mutable handles, not otherwise borrowed. `next`
//! does no bounds check: stop at `end`, as [`walk::Walk`] does.

#![cfg_attr(not(feature = "std"), no_std)]

pub use allocator_api2;

pub use strider_core::{array, error, iter, state, walk};
pub use strider_core::{Capability, ConfigError, IterError, RawIter};
