// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Configuration for trajectory following.
//!
//! # Example
//!
//! ```
//! use trajectory_follower::{FollowData, FollowMode, FollowerConfig};
//!
//! let config = FollowerConfig::default();
//! assert_eq!(config.mode, FollowMode::Loop);
//! assert_eq!(config.data, FollowData::all());
//!
//! let replay = FollowerConfig::replay(4.0).with_offset_time(120.0);
//! replay.validate()?;
//! # Ok::<(), trajectory_follower::FollowError>(())
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FollowError, Result};

/// How simulation time outside the followed time range is handled.
///
/// Inside the range the trajectory's data is used regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FollowMode {
    /// Wrap time around the union of all followed ranges.
    #[default]
    Loop,
    /// Hold the first/last sample outside the range.
    Limit,
}

bitflags::bitflags! {
    /// Which parts of the trajectory state are applied to the target.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct FollowData: u8 {
        const POSITION = 0b0000_0001;
        const ATTITUDE = 0b0000_0010;
    }
}

impl Default for FollowData {
    fn default() -> Self {
        Self::all()
    }
}

/// Initial parameters of a [`TrajectoryFollower`](crate::TrajectoryFollower).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FollowerConfig {
    pub mode: FollowMode,
    pub data: FollowData,
    /// Simulation seconds per raw second. May be zero or negative.
    pub time_scale: f64,
    /// Simulation time at the first tick (and after every reset).
    pub offset_time: f64,
    /// Start paused.
    pub paused: bool,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            mode: FollowMode::Loop,
            data: FollowData::all(),
            time_scale: 1.0,
            offset_time: 0.0,
            paused: false,
        }
    }
}

impl FollowerConfig {
    /// Play once at `time_scale`, holding the ends of the trajectory.
    pub fn replay(time_scale: f64) -> Self {
        Self {
            mode: FollowMode::Limit,
            time_scale,
            ..Self::default()
        }
    }

    /// Follow positions only, leaving the target's attitude alone.
    pub fn position_only() -> Self {
        Self {
            data: FollowData::POSITION,
            ..Self::default()
        }
    }

    /// Start paused at `offset_time`.
    pub fn frozen_at(offset_time: f64) -> Self {
        Self {
            offset_time,
            paused: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: FollowMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: FollowData) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    #[must_use]
    pub fn with_offset_time(mut self, offset_time: f64) -> Self {
        self.offset_time = offset_time;
        self
    }

    /// Check that all numeric parameters are finite.
    pub fn validate(&self) -> Result<()> {
        if !self.time_scale.is_finite() {
            return Err(FollowError::invalid_config(format!(
                "time_scale must be finite, got {}",
                self.time_scale
            )));
        }
        if !self.offset_time.is_finite() {
            return Err(FollowError::invalid_config(format!(
                "offset_time must be finite, got {}",
                self.offset_time
            )));
        }
        Ok(())
    }
}
