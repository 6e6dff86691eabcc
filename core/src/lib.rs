#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![deny(unsafe_code)]

//! Type-erased traversal of contiguous sequences.
//!
//! Two layers:
//!
//! - [`iter`]: a generic handle ([`iter::RawIter`]) owning an opaque state
//!   block and a read-only or mutable table of `begin`/`next`/`end`
//!   operations. It knows nothing about element types or storage.
//! - [`array`]: one implementation of those operations for buffers described
//!   by a base address, an element count and a stride.
//!
//! [`walk`] turns a bound handle into an ordinary Rust iterator of element
//! addresses. Dereferencing those addresses is always the caller's business.

extern crate alloc;

pub mod array;
pub mod error;
pub mod iter;
pub mod state;
pub mod walk;

pub use error::{ConfigError, IterError};
pub use iter::{Capability, RawIter};
