// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Error types for trajectory storage and following.

use thiserror::Error;

/// Main error type for trajectory and follower operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FollowError {
    /// A trajectory must carry 1, 2 or 3 position components.
    #[error("Degrees of freedom must be 1, 2, or 3, got {0}")]
    InvalidDof(usize),

    /// A time, coordinate or parameter was NaN or infinite.
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// Wrong number of components for a position or optional row.
    #[error("Expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Optional data set index outside `1..=num_optional`.
    #[error("Optional set {set} out of range (trajectory has {available})")]
    OptionalOutOfRange { set: usize, available: usize },

    /// Optional data was supplied before any position.
    #[error("Cannot set optional data on a trajectory without positions")]
    NoPosition,

    /// Quaternion was near-zero or far from unit length.
    #[error("Invalid attitude quaternion: {0}")]
    InvalidQuaternion(String),

    /// The time search inside a trajectory did not terminate on a bracket.
    #[error("Requested time {time} not found in a reasonable number of iterations")]
    SearchFailed { time: f64 },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for trajectory and follower operations.
pub type Result<T> = std::result::Result<T, FollowError>;

impl FollowError {
    /// Create a non-finite value error.
    #[must_use]
    pub const fn non_finite(what: &'static str, value: f64) -> Self {
        Self::NonFinite { what, value }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an invalid quaternion error.
    #[must_use]
    pub fn invalid_quaternion(msg: impl Into<String>) -> Self {
        Self::InvalidQuaternion(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Reject NaN and infinities with a named error.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FollowError::non_finite(what, value))
    }
}
