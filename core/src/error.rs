//! Error types returned by every fallible handle and traversal operation.
//!
//! Errors fall into three kinds, each reported by a distinct variant of
//! [`IterError`] so callers can tell a caller mistake from environment
//! exhaustion:
//!
//! - [`IterError::InvalidArgument`]: something essential is missing (a null
//!   buffer base, a handle without state or operations).
//! - [`IterError::Alloc`]: the allocator could not provide a state block.
//! - [`IterError::Config`]: parameters are structurally invalid for the
//!   implementation being bound (see [`ConfigError`]).
//!
//! Every check runs before any state is written, so an `Err` always means the
//! operation was a no-op.

use thiserror::Error;

use crate::iter::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IterError {
    /// A required argument or precondition is absent.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The allocator failed to reserve the state block.
    #[error("failed to allocate {size} bytes of iterator state")]
    Alloc { size: usize },

    /// Parameters are invalid for the implementation being bound.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("element stride must be non-zero")]
    ZeroStride,

    #[error("handle has no capability bound")]
    Unbound,

    #[error("handle is bound {found}, expected {expected}")]
    CapabilityMismatch {
        expected: Capability,
        found: Capability,
    },

    #[error("state block of {size} bytes cannot hold a {needed}-byte descriptor")]
    StateTooSmall { size: usize, needed: usize },
}

impl IterError {
    pub(crate) fn mismatch(expected: Capability, found: Capability) -> Self {
        IterError::Config(ConfigError::CapabilityMismatch { expected, found })
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::string::ToString;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            IterError::InvalidArgument("buffer base is null").to_string(),
            "invalid argument: buffer base is null"
        );
        assert_eq!(
            IterError::Alloc { size: 32 }.to_string(),
            "failed to allocate 32 bytes of iterator state"
        );
        assert_eq!(
            IterError::mismatch(Capability::Mutable, Capability::ReadOnly).to_string(),
            "configuration error: handle is bound read-only, expected mutable"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: IterError = ConfigError::ZeroStride.into();
        assert_eq!(err, IterError::Config(ConfigError::ZeroStride));
    }
}
