// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! DataSource: selects which trajectory channel feeds a position axis.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of data a [`DataSource`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceKind {
    /// Constant zero. Always available, for any number of samples.
    #[default]
    Zero,
    /// The sample's timestamp.
    Time,
    /// A position component, or a component of one of the optional sets.
    PosOpt,
}

/// Descriptor of the channel feeding one position axis.
///
/// Two sources are the same source iff all fields are equal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataSource {
    pub kind: SourceKind,
    /// Component index within the position/optional row.
    pub element: usize,
    /// 0 selects positions, `k >= 1` selects optional set `k`.
    pub optional: usize,
    /// Multiplier applied to the selected value.
    pub scale: f64,
}

impl Default for DataSource {
    fn default() -> Self {
        Self::zero()
    }
}

impl DataSource {
    pub const fn zero() -> Self {
        Self {
            kind: SourceKind::Zero,
            element: 0,
            optional: 0,
            scale: 1.0,
        }
    }

    pub const fn time() -> Self {
        Self {
            kind: SourceKind::Time,
            element: 0,
            optional: 0,
            scale: 1.0,
        }
    }

    /// Position component `element` (0 = x, 1 = y, 2 = z).
    pub const fn position(element: usize) -> Self {
        Self {
            kind: SourceKind::PosOpt,
            element,
            optional: 0,
            scale: 1.0,
        }
    }

    /// Component `element` of optional set `set` (1-based).
    pub const fn optional(set: usize, element: usize) -> Self {
        Self {
            kind: SourceKind::PosOpt,
            element,
            optional: set,
            scale: 1.0,
        }
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.kind == SourceKind::Zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert_eq!(DataSource::position(1), DataSource::position(1));
        assert_ne!(DataSource::position(1), DataSource::position(2));
        assert_ne!(DataSource::position(0), DataSource::optional(1, 0));
        assert_ne!(DataSource::time(), DataSource::time().with_scale(2.0));
        assert_eq!(DataSource::default(), DataSource::zero());
        assert!(DataSource::default().is_zero());
    }
}
