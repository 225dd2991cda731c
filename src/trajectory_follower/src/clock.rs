// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Simulation time: maps a raw reference clock through offset, scale and
//! pause state, and wraps it into the followed time range.
//!
//! ```text
//! sim = offset + delta + scale * (paused ? pause_time : latest)
//! ```
//!
//! `delta` absorbs every scale and pause change so that simulation time is
//! continuous across the change.

use crate::config::FollowMode;

/// Ranges narrower than this collapse to their start time.
pub const MIN_WRAP_RANGE: f64 = 8.0 * f64::MIN_POSITIVE;

/// Offset/scale/pause state of one follower's simulation time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    offset_time: f64,
    time_scale: f64,
    paused: bool,
    pause_time: f64,
    delta_time: f64,
    /// Most recent raw time; `None` until the first observation.
    latest_time: Option<f64>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(0.0, 1.0, false)
    }
}

impl SimulationClock {
    pub fn new(offset_time: f64, time_scale: f64, paused: bool) -> Self {
        Self {
            offset_time,
            time_scale,
            paused,
            pause_time: 0.0,
            delta_time: 0.0,
            latest_time: None,
        }
    }

    #[inline]
    pub fn offset_time(&self) -> f64 {
        self.offset_time
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn latest_time(&self) -> Option<f64> {
        self.latest_time
    }

    /// Record a raw time. Returns `false` if it equals the previous one.
    ///
    /// The first observation also resets, anchoring simulation time to the
    /// offset.
    pub fn observe(&mut self, raw_time: f64) -> bool {
        match self.latest_time {
            Some(latest) if latest == raw_time => false,
            Some(_) => {
                self.latest_time = Some(raw_time);
                true
            }
            None => {
                self.latest_time = Some(raw_time);
                self.reset();
                true
            }
        }
    }

    /// The raw time the scaled term is evaluated at.
    #[inline]
    fn reference_time(&self) -> Option<f64> {
        if self.paused {
            self.latest_time.map(|_| self.pause_time)
        } else {
            self.latest_time
        }
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        if self.time_scale == time_scale {
            return;
        }
        if let Some(reference) = self.reference_time() {
            self.delta_time += reference * (self.time_scale - time_scale);
        }
        self.time_scale = time_scale;
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if let Some(latest) = self.latest_time {
            if paused {
                self.pause_time = latest;
            } else {
                self.delta_time += self.time_scale * (self.pause_time - latest);
            }
        }
    }

    pub fn set_offset_time(&mut self, offset_time: f64) {
        self.offset_time = offset_time;
    }

    /// Re-anchor so that simulation time equals the offset at the latest raw time.
    pub fn reset(&mut self) {
        let latest = self.latest_time.unwrap_or(0.0);
        self.delta_time = -self.time_scale * latest;
        self.pause_time = latest;
    }

    /// Current simulation time.
    ///
    /// Before any raw time is observed this is the offset.
    pub fn simulation_time(&self) -> f64 {
        match self.reference_time() {
            Some(reference) => self.offset_time + self.delta_time + self.time_scale * reference,
            None => self.offset_time,
        }
    }
}

/// Union of time ranges, each reordered so that `t0 <= tf`.
pub fn union_time_range<I>(ranges: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<(f64, f64)>>,
{
    ranges
        .into_iter()
        .flatten()
        .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
        .reduce(|(t0, tf), (a, b)| (t0.min(a), tf.max(b)))
}

/// Apply the follow mode's wrap policy to `time`.
///
/// Without a range, or in [`FollowMode::Limit`], `time` is returned unchanged.
/// In [`FollowMode::Loop`] the result lies in `[t0, tf)`, or is `t0` for a
/// degenerate range.
pub fn wrap_time(time: f64, mode: FollowMode, range: Option<(f64, f64)>) -> f64 {
    let Some((t0, tf)) = range else {
        return time;
    };

    match mode {
        FollowMode::Limit => time,
        FollowMode::Loop => {
            let span = tf - t0;
            if span <= MIN_WRAP_RANGE {
                return t0;
            }
            time - ((time - t0) / span).floor() * span
        }
    }
}
