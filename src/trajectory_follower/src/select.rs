// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Choosing which of several trajectories to follow at a given time.

use crate::trajectory::TrajectoryData;

/// Anything with a signed distance from a time to its time range.
///
/// Zero or negative means the time is contained; positive measures how far
/// outside the range it falls.
pub trait TimeSpan {
    fn time_distance(&self, time: f64) -> f64;
}

impl TimeSpan for TrajectoryData {
    #[inline]
    fn time_distance(&self, time: f64) -> f64 {
        TrajectoryData::time_distance(self, time)
    }
}

/// Pick the span to follow at `time`, as an index into `spans`.
///
/// - A single span is always chosen.
/// - The `current` span is kept while it contains `time`.
/// - Otherwise the first span containing `time` wins, then the closest one;
///   ties go to the earlier span.
///
/// Returns `None` only for an empty slice.
pub fn choose_trajectory<S>(spans: &[&S], current: Option<usize>, time: f64) -> Option<usize>
where
    S: TimeSpan + ?Sized,
{
    if spans.len() <= 1 {
        return if spans.is_empty() { None } else { Some(0) };
    }

    if let Some(idx) = current {
        if spans.get(idx).is_some_and(|s| s.time_distance(time) <= 0.0) {
            return Some(idx);
        }
    }

    let mut closest = 0;
    let mut min_distance = f64::MAX;
    for (idx, span) in spans.iter().enumerate() {
        let distance = span.time_distance(time);
        if distance <= 0.0 {
            return Some(idx);
        }
        if distance < min_distance {
            min_distance = distance;
            closest = idx;
        }
    }
    Some(closest)
}
