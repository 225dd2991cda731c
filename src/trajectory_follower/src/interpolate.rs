// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Interpolating a trajectory's position or attitude at a time.
//!
//! Positions are blended linearly, attitudes along the shortest arc. Outside
//! the time range the first or last sample is held.

use glam::{DQuat, DVec3};

use crate::data_source::DataSource;
use crate::error::{FollowError, Result};
use crate::trajectory::{TimeIndex, TrajectoryData};

/// Position at `time`, read through `sources`.
///
/// Returns the zero vector if the trajectory has no readable points or every
/// source is [`Zero`](crate::SourceKind::Zero).
pub fn interpolate_position(
    data: &TrajectoryData,
    sources: &[DataSource; 3],
    time: f64,
) -> Result<DVec3> {
    interpolate_with(
        data,
        data.num_points(sources),
        time,
        DVec3::ZERO,
        |i| data.point(i, sources),
        |a, b, alpha| a.lerp(b, alpha),
    )
}

/// Attitude at `time`.
///
/// Returns the identity quaternion if the trajectory has no attitudes.
pub fn interpolate_attitude(data: &TrajectoryData, time: f64) -> Result<DQuat> {
    let count = data.num_attitudes().min(data.num_times());
    interpolate_with(
        data,
        Some(count),
        time,
        DQuat::IDENTITY,
        |i| data.attitude(i),
        |a, b, alpha| a.slerp(b, alpha),
    )
}

/// Shared bracket-and-blend logic.
///
/// `count` is the number of samples `fetch` can serve (`None` = unbounded).
fn interpolate_with<T: Copy>(
    data: &TrajectoryData,
    count: Option<usize>,
    time: f64,
    empty: T,
    fetch: impl Fn(usize) -> Option<T>,
    blend: impl Fn(T, T, f64) -> T,
) -> Result<T> {
    let n = match count {
        Some(n) if n > 0 => n,
        _ => return Ok(empty),
    };
    let times = data.times();
    let missing = || FollowError::SearchFailed { time };

    match data.time_index(time) {
        TimeIndex::Found(idx) if idx < n => {
            let v0 = fetch(idx).ok_or_else(missing)?;
            let (t0, t1) = match times.get(idx + 1) {
                Some(&t1) if idx + 1 < n => (times[idx], t1),
                _ => return Ok(v0),
            };
            // Equal neighbours would divide by zero
            if t1 == t0 {
                return Ok(v0);
            }
            let v1 = fetch(idx + 1).ok_or_else(missing)?;
            let alpha = (time - t0) / (t1 - t0);
            Ok(blend(v0, v1, alpha))
        }
        TimeIndex::Found(_) | TimeIndex::AfterRange => fetch(n - 1).ok_or_else(missing),
        TimeIndex::BeforeRange => fetch(0).ok_or_else(missing),
        TimeIndex::SearchFailed => Err(missing()),
    }
}
