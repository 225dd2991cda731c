// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Trajectory: append-only store of timestamped positions and attitudes.
//!
//! Times, positions and attitudes are appended independently, so a producer
//! may add a time before the matching position arrives. Readers take the
//! shared lock via [`Trajectory::read`] and see a consistent
//! [`TrajectoryData`] snapshot for as long as they hold the guard.

use std::sync::Weak;

use glam::{DQuat, DVec3};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::array_utils::ensure_unit_quat;
use crate::data_source::{DataSource, SourceKind};
use crate::error::{ensure_finite, FollowError, Result};

/// Result of locating a time within a trajectory's time list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeIndex {
    /// `times[index] <= t`, and `index` is the last sample or `t < times[index + 1]`
    /// (comparisons flipped for a decreasing list).
    Found(usize),
    /// `t` lies outside the range on the first sample's side (or there are no
    /// samples).
    BeforeRange,
    /// `t` lies outside the range on the last sample's side.
    AfterRange,
    /// No bracketing pair exists; the time list is out of order or `t` is NaN.
    SearchFailed,
}

/// Receives notifications when a trajectory's data changes.
pub trait TrajectoryObserver: Send + Sync {
    fn data_changed(&self);
}

/// The lockable contents of a [`Trajectory`].
#[derive(Debug, Clone)]
pub struct TrajectoryData {
    dof: usize,
    num_optional: usize,
    times: Vec<f64>,
    /// `1 + num_optional` rows per position sample; row 0 is the position.
    points: Vec<[f64; 3]>,
    attitudes: Vec<DQuat>,
}

impl TrajectoryData {
    fn new(dof: usize, num_optional: usize) -> Self {
        Self {
            dof,
            num_optional,
            times: Vec::new(),
            points: Vec::new(),
            attitudes: Vec::new(),
        }
    }

    /// Number of position components per sample (1, 2 or 3).
    #[inline]
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// Number of optional data sets stored alongside each position.
    #[inline]
    pub fn num_optional(&self) -> usize {
        self.num_optional
    }

    #[inline]
    fn stride(&self) -> usize {
        1 + self.num_optional
    }

    /// Time list in insertion order.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn num_positions(&self) -> usize {
        self.points.len() / self.stride()
    }

    #[inline]
    pub fn num_attitudes(&self) -> usize {
        self.attitudes.len()
    }

    /// First and last sample times. `None` if there are no samples.
    ///
    /// The pair is reported in storage order and may be reversed.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.times.first(), self.times.last()) {
            (Some(&t0), Some(&tf)) => Some((t0, tf)),
            _ => None,
        }
    }

    /// Signed distance from `t` to this trajectory's time range.
    ///
    /// Zero or negative means `t` is contained (the magnitude is the depth to
    /// the nearest end); positive is the gap to the nearest end. An empty
    /// trajectory is infinitely far away.
    pub fn time_distance(&self, t: f64) -> f64 {
        let Some((a, b)) = self.time_range() else {
            return f64::MAX;
        };
        let (t0, tf) = if a <= b { (a, b) } else { (b, a) };

        if t < t0 {
            t0 - t
        } else if t > tf {
            t - tf
        } else {
            -(t - t0).min(tf - t)
        }
    }

    /// Locate `t` in the time list.
    ///
    /// Lists stored in decreasing order (first time after the last) are
    /// searched in that direction: `Found(i)` then means
    /// `times[i] >= t > times[i + 1]`, and `BeforeRange`/`AfterRange` still
    /// refer to the first/last stored sample.
    pub fn time_index(&self, t: f64) -> TimeIndex {
        let n = self.times.len();
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return TimeIndex::BeforeRange;
        };
        let descending = first > last;

        // `reached(ti)`: ti is at or before t in storage direction
        let reached = |ti: f64| if descending { ti >= t } else { ti <= t };
        // `passed(ti)`: ti is strictly beyond t in storage direction
        let passed = |ti: f64| if descending { ti < t } else { ti > t };

        if passed(first) {
            return TimeIndex::BeforeRange;
        }
        let past_last = if descending { t < last } else { t > last };
        if past_last {
            return TimeIndex::AfterRange;
        }

        // Largest i such that times[i] has been reached
        let idx = self.times.partition_point(|&ti| reached(ti)).saturating_sub(1);

        let lower_ok = reached(self.times[idx]);
        let upper_ok = idx + 1 == n || passed(self.times[idx + 1]);
        if lower_ok && upper_ok {
            TimeIndex::Found(idx)
        } else {
            TimeIndex::SearchFailed
        }
    }

    /// Check that every source can be read from this trajectory.
    pub fn verify_sources(&self, sources: &[DataSource; 3]) -> bool {
        sources.iter().all(|src| match src.kind {
            SourceKind::Zero | SourceKind::Time => true,
            SourceKind::PosOpt => src.optional <= self.num_optional && src.element < self.dof,
        })
    }

    /// Number of samples readable through all three sources.
    ///
    /// `None` means unbounded: every source is [`SourceKind::Zero`].
    pub fn num_points(&self, sources: &[DataSource; 3]) -> Option<usize> {
        sources
            .iter()
            .filter_map(|src| match src.kind {
                SourceKind::Zero => None,
                SourceKind::Time => Some(self.num_times()),
                SourceKind::PosOpt => Some(self.num_positions().min(self.num_times())),
            })
            .min()
    }

    /// Position at `index` assembled from the three sources.
    ///
    /// Returns `None` if any non-zero source cannot be read at `index`.
    pub fn point(&self, index: usize, sources: &[DataSource; 3]) -> Option<DVec3> {
        let mut out = [0.0; 3];
        for (value, src) in out.iter_mut().zip(sources) {
            *value = match src.kind {
                SourceKind::Zero => 0.0,
                SourceKind::Time => *self.times.get(index)? * src.scale,
                SourceKind::PosOpt => {
                    if src.element >= self.dof || src.optional > self.num_optional {
                        return None;
                    }
                    let row = self.points.get(index * self.stride() + src.optional)?;
                    row[src.element] * src.scale
                }
            };
        }
        Some(DVec3::from_array(out))
    }

    #[inline]
    pub fn attitude(&self, index: usize) -> Option<DQuat> {
        self.attitudes.get(index).copied()
    }

    // =========================================================================
    // Mutation (reached through Trajectory's write lock)
    // =========================================================================

    fn add_time(&mut self, t: f64) -> Result<()> {
        self.times.push(ensure_finite("time", t)?);
        Ok(())
    }

    fn check_row(&self, values: &[f64], what: &'static str) -> Result<[f64; 3]> {
        if values.len() != self.dof {
            return Err(FollowError::dimension_mismatch(self.dof, values.len()));
        }
        let mut row = [0.0; 3];
        for (dst, &v) in row.iter_mut().zip(values) {
            *dst = ensure_finite(what, v)?;
        }
        Ok(row)
    }

    fn add_position(&mut self, values: &[f64]) -> Result<()> {
        let row = self.check_row(values, "position")?;
        self.points.push(row);
        self.points
            .extend(std::iter::repeat([0.0; 3]).take(self.num_optional));
        Ok(())
    }

    fn set_optional(&mut self, set: usize, values: &[f64]) -> Result<()> {
        if set == 0 || set > self.num_optional {
            return Err(FollowError::OptionalOutOfRange {
                set,
                available: self.num_optional,
            });
        }
        let row = self.check_row(values, "optional")?;
        let count = self.num_positions();
        if count == 0 {
            return Err(FollowError::NoPosition);
        }
        let slot = (count - 1) * self.stride() + set;
        self.points[slot] = row;
        Ok(())
    }

    fn add_attitude(&mut self, q: DQuat) -> Result<()> {
        let q = ensure_unit_quat(q, "attitude")?;
        self.attitudes.push(q);
        Ok(())
    }

    fn clear(&mut self) {
        self.times.clear();
        self.points.clear();
        self.attitudes.clear();
    }
}

/// A shared, lockable trajectory.
///
/// Trajectories are shared as `Arc<Trajectory>`; followers keep the `Arc`
/// alive while following. Observers are held weakly and pruned once dropped.
pub struct Trajectory {
    data: RwLock<TrajectoryData>,
    observers: Mutex<Vec<Weak<dyn TrajectoryObserver>>>,
}

impl std::fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("Trajectory")
            .field("dof", &data.dof)
            .field("num_optional", &data.num_optional)
            .field("num_times", &data.num_times())
            .field("num_positions", &data.num_positions())
            .field("num_attitudes", &data.num_attitudes())
            .finish()
    }
}

impl Trajectory {
    /// Create an empty trajectory with `dof` position components and
    /// `num_optional` extra data sets per position.
    pub fn new(dof: usize, num_optional: usize) -> Result<Self> {
        if !(1..=3).contains(&dof) {
            return Err(FollowError::InvalidDof(dof));
        }
        Ok(Self {
            data: RwLock::new(TrajectoryData::new(dof, num_optional)),
            observers: Mutex::new(Vec::new()),
        })
    }

    /// Build a trajectory from parallel time/position lists.
    ///
    /// Every position must have `dof` components.
    pub fn from_samples(dof: usize, times: &[f64], positions: &[&[f64]]) -> Result<Self> {
        if times.len() != positions.len() {
            return Err(FollowError::dimension_mismatch(times.len(), positions.len()));
        }
        let traj = Self::new(dof, 0)?;
        {
            let mut data = traj.data.write();
            for (&t, pos) in times.iter().zip(positions) {
                data.add_time(t)?;
                data.add_position(pos)?;
            }
        }
        Ok(traj)
    }

    /// Acquire the shared lock for reading.
    ///
    /// Writers block until every read guard is dropped.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, TrajectoryData> {
        self.data.read()
    }

    #[inline]
    pub fn dof(&self) -> usize {
        self.data.read().dof
    }

    /// Apply a mutation under the write lock, then notify observers.
    fn modify<R>(&self, f: impl FnOnce(&mut TrajectoryData) -> Result<R>) -> Result<R> {
        let out = {
            let mut data = self.data.write();
            f(&mut data)?
        };
        self.notify_observers();
        Ok(out)
    }

    /// Append a sample time.
    pub fn add_time(&self, t: f64) -> Result<()> {
        self.modify(|d| d.add_time(t))
    }

    /// Append a position with exactly `dof` components.
    pub fn add_position(&self, values: &[f64]) -> Result<()> {
        self.modify(|d| d.add_position(values))
    }

    /// Set optional data set `set` (1-based) of the most recent position.
    pub fn set_optional(&self, set: usize, values: &[f64]) -> Result<()> {
        self.modify(|d| d.set_optional(set, values))
    }

    /// Append an attitude. Near-unit quaternions are normalized.
    pub fn add_attitude(&self, q: DQuat) -> Result<()> {
        self.modify(|d| d.add_attitude(q))
    }

    /// Append a time with its position and attitude in one locked step.
    pub fn add_sample(&self, t: f64, position: &[f64], attitude: DQuat) -> Result<()> {
        self.modify(|d| {
            // Validate everything before touching the lists
            let row = d.check_row(position, "position")?;
            let q = ensure_unit_quat(attitude, "attitude")?;
            d.add_time(t)?;
            d.points.push(row);
            d.points
                .extend(std::iter::repeat([0.0; 3]).take(d.num_optional));
            d.attitudes.push(q);
            Ok(())
        })
    }

    /// Remove all samples.
    pub fn clear(&self) {
        self.data.write().clear();
        self.notify_observers();
    }

    // =========================================================================
    // Observer registry
    // =========================================================================

    /// Register an observer. Registering the same observer twice has no effect.
    pub fn register_observer(&self, observer: Weak<dyn TrajectoryObserver>) {
        let mut observers = self.observers.lock();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    pub fn unregister_observer(&self, observer: &Weak<dyn TrajectoryObserver>) {
        self.observers.lock().retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Number of live registered observers.
    pub fn num_observers(&self) -> usize {
        self.observers
            .lock()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    fn notify_observers(&self) {
        let live: Vec<_> = {
            let mut observers = self.observers.lock();
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.data_changed();
        }
    }
}
