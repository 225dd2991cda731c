// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Apply one set of time changes to many followers at once.

use crate::error::Result;
use crate::follower::TrajectoryFollower;

/// Pending pause, offset, scale and reset changes.
///
/// Unset fields leave the corresponding follower setting alone. Changes are
/// applied in the order pause, offset, scale, reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeManagement {
    pub paused: Option<bool>,
    pub offset_time: Option<f64>,
    pub time_scale: Option<f64>,
    pub reset: bool,
}

impl TimeManagement {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pause(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    #[must_use]
    pub fn offset_time(mut self, offset_time: f64) -> Self {
        self.offset_time = Some(offset_time);
        self
    }

    #[must_use]
    pub fn time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = Some(time_scale);
        self
    }

    #[must_use]
    pub fn reset(mut self) -> Self {
        self.reset = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, follower: &TrajectoryFollower) -> Result<()> {
        if let Some(paused) = self.paused {
            follower.set_paused(paused);
        }
        if let Some(offset_time) = self.offset_time {
            follower.set_offset_time(offset_time)?;
        }
        if let Some(time_scale) = self.time_scale {
            follower.set_time_scale(time_scale)?;
        }
        if self.reset {
            follower.reset();
        }
        Ok(())
    }

    /// Apply to every follower, stopping at the first rejected value.
    pub fn apply_all<'a, I>(&self, followers: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TrajectoryFollower>,
    {
        followers.into_iter().try_for_each(|f| self.apply(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    #[test]
    fn test_empty_changes_nothing() {
        let tm = TimeManagement::new();
        assert!(tm.is_empty());
        let follower = TrajectoryFollower::default();
        tm.apply(&follower).unwrap();
        assert!(!follower.paused());
        assert_eq!(follower.time_scale(), 1.0);
    }

    #[test]
    fn test_apply_all() {
        let followers = [TrajectoryFollower::default(), TrajectoryFollower::default()];
        let tm = TimeManagement::new().pause(true).offset_time(12.0).time_scale(3.0);
        assert!(!tm.is_empty());
        tm.apply_all(&followers).unwrap();
        for f in &followers {
            assert!(f.paused());
            assert_eq!(f.offset_time(), 12.0);
            assert_eq!(f.time_scale(), 3.0);
        }
    }

    #[test]
    fn test_reset_reanchors_after_offset() {
        let follower = TrajectoryFollower::default();
        let mut pose = Pose::default();
        follower.tick(0.0, &mut pose);
        follower.tick(50.0, &mut pose);
        assert_eq!(follower.simulation_time(), 50.0);

        TimeManagement::new().offset_time(-2.0).reset().apply(&follower).unwrap();
        assert_eq!(follower.simulation_time(), -2.0);
    }

    #[test]
    fn test_invalid_value_stops_broadcast() {
        let followers = [TrajectoryFollower::default(), TrajectoryFollower::default()];
        let tm = TimeManagement::new().time_scale(f64::NAN);
        assert!(tm.apply_all(&followers).is_err());
        assert_eq!(followers[1].time_scale(), 1.0);
    }
}
