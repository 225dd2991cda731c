// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! TrajectoryFollower: drives a [`FollowTarget`] from a set of trajectories.
//!
//! The host calls [`TrajectoryFollower::tick`] once per frame with its
//! reference clock. Given the followed set `{T}` and simulation time `t`:
//!
//! - if `t` is within some `T_i`, follow `T_i` (keeping the previous choice
//!   while it still contains `t`);
//! - otherwise follow the closest `T_i`;
//! - in [`FollowMode::Loop`], `t` is first wrapped into the union of the
//!   ranges of `{T}`.
//!
//! Configuration calls may come from any thread; they serialize with each
//! other and with the bookkeeping part of `tick` through one mutex. Trajectory
//! read locks are only taken while that mutex is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use glam::{DQuat, DVec3};
use log::{debug, error, trace, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::clock::{union_time_range, wrap_time, SimulationClock};
use crate::config::{FollowData, FollowMode, FollowerConfig};
use crate::data_source::DataSource;
use crate::error::{FollowError, Result};
use crate::interpolate::{interpolate_attitude, interpolate_position};
use crate::select::choose_trajectory;
use crate::trajectory::{Trajectory, TrajectoryData, TrajectoryObserver};
use crate::transform::FollowTarget;

/// Position axis fed by a [`DataSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

/// State applied by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpdate {
    /// Simulation time after wrapping.
    pub time: f64,
    /// Index of the followed trajectory in the follow list.
    pub index: usize,
    /// Position applied to the target, if any.
    pub position: Option<DVec3>,
    /// Attitude applied to the target, if any.
    pub attitude: Option<DQuat>,
}

/// Outcome of [`TrajectoryFollower::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResult {
    /// Same raw time as the previous tick; nothing was done.
    RepeatedTime,
    /// Nothing to follow, or paused with no pending update.
    Idle,
    Updated(FollowUpdate),
}

impl UpdateResult {
    pub fn updated(&self) -> Option<&FollowUpdate> {
        match self {
            Self::Updated(update) => Some(update),
            _ => None,
        }
    }
}

/// Raised by followed trajectories when their data changes.
#[derive(Debug, Default)]
struct DataChanged(AtomicBool);

impl TrajectoryObserver for DataChanged {
    fn data_changed(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl DataChanged {
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

#[derive(Debug)]
struct FollowerState {
    trajectories: Vec<Arc<Trajectory>>,
    /// Trajectory chosen on the last tick. Never owns it.
    following: Option<Weak<Trajectory>>,
    mode: FollowMode,
    data: FollowData,
    sources: [DataSource; 3],
    using_default_data: bool,
    data_valid: bool,
    needs_update: bool,
    clock: SimulationClock,
}

impl FollowerState {
    fn position_of(&self, traj: &Arc<Trajectory>) -> Option<usize> {
        self.trajectories.iter().position(|t| Arc::ptr_eq(t, traj))
    }

    fn current_index(&self) -> Option<usize> {
        let following = self.following.as_ref()?;
        self.trajectories
            .iter()
            .position(|t| std::ptr::eq(Arc::as_ptr(t), following.as_ptr()))
    }

    fn verify_sources(&self) -> bool {
        self.trajectories
            .iter()
            .all(|t| t.read().verify_sources(&self.sources))
    }

    /// Derive X/Y/Z from the first trajectory's DOF.
    fn apply_default_sources(&mut self) {
        let dof = self.trajectories.first().map_or(0, |t| t.dof());
        for (element, source) in self.sources.iter_mut().enumerate() {
            *source = if element < dof {
                DataSource::position(element)
            } else {
                DataSource::zero()
            };
        }
        self.using_default_data = true;
    }

    /// Re-derive defaults if in effect, then recheck validity.
    fn refresh_sources(&mut self) {
        if self.using_default_data {
            self.apply_default_sources();
        }
        self.data_valid = self.verify_sources();
        self.needs_update = true;
    }
}

/// Everything a tick needs once the state mutex is released.
struct TickSnapshot {
    trajectories: Vec<Arc<Trajectory>>,
    current: Option<usize>,
    mode: FollowMode,
    data: FollowData,
    sources: [DataSource; 3],
    data_valid: bool,
    time: f64,
}

/// Follows one or more trajectories over time.
#[derive(Debug)]
pub struct TrajectoryFollower {
    state: Mutex<FollowerState>,
    data_changed: Arc<DataChanged>,
}

impl Default for TrajectoryFollower {
    fn default() -> Self {
        Self::from_valid_config(FollowerConfig::default())
    }
}

impl Drop for TrajectoryFollower {
    fn drop(&mut self) {
        let handle = self.observer_handle();
        for traj in &self.state.get_mut().trajectories {
            traj.unregister_observer(&handle);
        }
    }
}

impl TrajectoryFollower {
    /// Create a follower with no trajectories.
    pub fn new(config: FollowerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Create a default follower following `traj`.
    pub fn with_trajectory(traj: Arc<Trajectory>) -> Self {
        let follower = Self::default();
        follower.set_follow_trajectory(Some(traj));
        follower
    }

    fn from_valid_config(config: FollowerConfig) -> Self {
        Self {
            state: Mutex::new(FollowerState {
                trajectories: Vec::new(),
                following: None,
                mode: config.mode,
                data: config.data,
                sources: [DataSource::zero(); 3],
                using_default_data: true,
                data_valid: true,
                needs_update: false,
                clock: SimulationClock::new(config.offset_time, config.time_scale, config.paused),
            }),
            data_changed: Arc::new(DataChanged::default()),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, FollowerState> {
        self.state.lock()
    }

    fn observer_handle(&self) -> Weak<dyn TrajectoryObserver> {
        let observer: Arc<dyn TrajectoryObserver> = self.data_changed.clone();
        Arc::downgrade(&observer)
    }

    // =========================================================================
    // Follow list
    // =========================================================================

    /// Follow only `traj`, dropping every other trajectory.
    ///
    /// `None` stops following everything.
    pub fn set_follow_trajectory(&self, traj: Option<Arc<Trajectory>>) {
        let handle = self.observer_handle();
        let mut state = self.lock();

        if let Some(t) = &traj {
            if state.trajectories.len() == 1 && Arc::ptr_eq(&state.trajectories[0], t) {
                return;
            }
        }

        state.following = None;
        for old in std::mem::take(&mut state.trajectories) {
            if !traj.as_ref().is_some_and(|t| Arc::ptr_eq(t, &old)) {
                old.unregister_observer(&handle);
            }
        }
        if let Some(t) = traj {
            t.register_observer(handle);
            state.trajectories.push(t);
        }

        debug!("Following {} trajectory(ies)", state.trajectories.len());
        state.refresh_sources();
    }

    /// Add `traj` to the follow list. No effect if already followed.
    pub fn follow_trajectory(&self, traj: Arc<Trajectory>) {
        let handle = self.observer_handle();
        let mut state = self.lock();
        if state.position_of(&traj).is_some() {
            return;
        }

        traj.register_observer(handle);
        state.trajectories.push(traj);

        debug!("Following {} trajectory(ies)", state.trajectories.len());
        state.refresh_sources();
    }

    /// Remove `traj` from the follow list. No effect if not followed.
    pub fn unfollow_trajectory(&self, traj: &Arc<Trajectory>) {
        let handle = self.observer_handle();
        let mut state = self.lock();
        let Some(idx) = state.position_of(traj) else {
            return;
        };

        if state.current_index() == Some(idx) {
            state.following = None;
        }
        state.trajectories.remove(idx);
        traj.unregister_observer(&handle);

        debug!("Following {} trajectory(ies)", state.trajectories.len());
        state.refresh_sources();
    }

    /// Stop following every trajectory.
    pub fn unfollow_all(&self) {
        self.set_follow_trajectory(None);
    }

    /// Snapshot of the follow list, in follow order.
    pub fn followed_trajectories(&self) -> Vec<Arc<Trajectory>> {
        self.lock().trajectories.clone()
    }

    pub fn num_followed(&self) -> usize {
        self.lock().trajectories.len()
    }

    /// The trajectory chosen on the most recent tick, if still followed.
    pub fn following(&self) -> Option<Arc<Trajectory>> {
        let state = self.lock();
        state
            .current_index()
            .map(|idx| Arc::clone(&state.trajectories[idx]))
    }

    // =========================================================================
    // Follow type and data sources
    // =========================================================================

    pub fn set_follow_type(&self, data: FollowData, mode: FollowMode) {
        let mut state = self.lock();
        state.data = data;
        state.mode = mode;
        state.needs_update = true;
    }

    pub fn follow_type(&self) -> (FollowData, FollowMode) {
        let state = self.lock();
        (state.data, state.mode)
    }

    /// Set the source of one position axis. Returns whether every followed
    /// trajectory supports the current sources.
    ///
    /// Any explicit source disables default sources for this follower.
    pub fn set_data_source(&self, axis: Axis, source: DataSource) -> bool {
        let mut state = self.lock();
        state.using_default_data = false;

        let idx = axis as usize;
        if state.sources[idx] == source {
            return state.data_valid;
        }
        state.sources[idx] = source;

        state.data_valid = state.verify_sources();
        state.needs_update = true;
        if !state.data_valid {
            warn!("{axis:?} source {source:?} is not supported by every followed trajectory");
        }
        state.data_valid
    }

    pub fn set_x_data(&self, source: DataSource) -> bool {
        self.set_data_source(Axis::X, source)
    }

    pub fn set_y_data(&self, source: DataSource) -> bool {
        self.set_data_source(Axis::Y, source)
    }

    pub fn set_z_data(&self, source: DataSource) -> bool {
        self.set_data_source(Axis::Z, source)
    }

    /// Return to sources derived from the first followed trajectory's DOF.
    pub fn set_default_data(&self) {
        let mut state = self.lock();
        state.apply_default_sources();
        state.data_valid = state.verify_sources();
        state.needs_update = true;
    }

    pub fn data_sources(&self) -> [DataSource; 3] {
        self.lock().sources
    }

    pub fn using_default_data(&self) -> bool {
        self.lock().using_default_data
    }

    /// Whether every followed trajectory supports the position sources.
    pub fn is_data_valid(&self) -> bool {
        self.lock().data_valid
    }

    // =========================================================================
    // Time management
    // =========================================================================

    pub fn set_time_scale(&self, time_scale: f64) -> Result<()> {
        if !time_scale.is_finite() {
            warn!("Rejected time_scale={time_scale}");
            return Err(FollowError::invalid_config(format!(
                "time_scale must be finite, got {time_scale}"
            )));
        }
        let mut state = self.lock();
        state.clock.set_time_scale(time_scale);
        state.needs_update = true;
        Ok(())
    }

    pub fn time_scale(&self) -> f64 {
        self.lock().clock.time_scale()
    }

    pub fn set_paused(&self, paused: bool) {
        let mut state = self.lock();
        state.clock.set_paused(paused);
        state.needs_update = true;
    }

    pub fn paused(&self) -> bool {
        self.lock().clock.is_paused()
    }

    pub fn set_offset_time(&self, offset_time: f64) -> Result<()> {
        if !offset_time.is_finite() {
            warn!("Rejected offset_time={offset_time}");
            return Err(FollowError::invalid_config(format!(
                "offset_time must be finite, got {offset_time}"
            )));
        }
        let mut state = self.lock();
        state.clock.set_offset_time(offset_time);
        state.needs_update = true;
        Ok(())
    }

    pub fn offset_time(&self) -> f64 {
        self.lock().clock.offset_time()
    }

    /// Restart simulation time at the offset time.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.clock.reset();
        state.needs_update = true;
    }

    /// Simulation time at the most recent tick, before wrapping.
    pub fn simulation_time(&self) -> f64 {
        self.lock().clock.simulation_time()
    }

    // =========================================================================
    // Update cycle
    // =========================================================================

    /// Advance to `raw_time` and apply the followed state to `target`.
    pub fn tick<T>(&self, raw_time: f64, target: &mut T) -> UpdateResult
    where
        T: FollowTarget + ?Sized,
    {
        let snapshot = {
            let mut state = self.lock();
            if !state.clock.observe(raw_time) {
                return UpdateResult::RepeatedTime;
            }

            let data_changed = self.data_changed.take();
            if state.trajectories.is_empty() {
                return UpdateResult::Idle;
            }
            if state.clock.is_paused() && !state.needs_update && !data_changed {
                return UpdateResult::Idle;
            }
            state.needs_update = false;

            TickSnapshot {
                trajectories: state.trajectories.clone(),
                current: state.current_index(),
                mode: state.mode,
                data: state.data,
                sources: state.sources,
                data_valid: state.data_valid,
                time: state.clock.simulation_time(),
            }
        };

        // Hold every trajectory while choosing, then only the chosen one
        let guards: Vec<_> = snapshot.trajectories.iter().map(|t| t.read()).collect();
        let range = union_time_range(guards.iter().map(|g| g.time_range()));
        let time = wrap_time(snapshot.time, snapshot.mode, range);

        let chosen = {
            let views: Vec<&TrajectoryData> = guards.iter().map(|g| &**g).collect();
            choose_trajectory(&views, snapshot.current, time)
        };
        let Some(index) = chosen else {
            return UpdateResult::Idle;
        };
        let Some(data) = guards.into_iter().nth(index) else {
            return UpdateResult::Idle;
        };

        let mut update = FollowUpdate {
            time,
            index,
            position: None,
            attitude: None,
        };

        if snapshot.data_valid && snapshot.data.contains(FollowData::POSITION) {
            match interpolate_position(&data, &snapshot.sources, time) {
                Ok(position) => {
                    target.set_position(position);
                    update.position = Some(position);
                }
                Err(err) => error!("Position not updated: {err}"),
            }
        }

        if snapshot.data.contains(FollowData::ATTITUDE) {
            match interpolate_attitude(&data, time) {
                Ok(attitude) => {
                    target.set_attitude(attitude);
                    update.attitude = Some(attitude);
                }
                Err(err) => error!("Attitude not updated: {err}"),
            }
        }
        drop(data);

        let chosen_traj = &snapshot.trajectories[index];
        {
            let mut state = self.lock();
            let switched = state
                .following
                .as_ref()
                .is_none_or(|w| !std::ptr::eq(w.as_ptr(), Arc::as_ptr(chosen_traj)));
            if switched {
                debug!("Switched to trajectory {index} at t={time}");
            }
            state.following = Some(Arc::downgrade(chosen_traj));
        }

        trace!("raw={raw_time} sim={} wrapped={time}", snapshot.time);
        UpdateResult::Updated(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    fn xyz_trajectory(t0: f64, tf: f64) -> Arc<Trajectory> {
        let traj = Trajectory::new(3, 0).unwrap();
        traj.add_sample(t0, &[t0, 0.0, 0.0], DQuat::IDENTITY).unwrap();
        traj.add_sample(tf, &[tf, 0.0, 0.0], DQuat::IDENTITY).unwrap();
        Arc::new(traj)
    }

    #[test]
    fn test_follow_list_has_no_duplicates() {
        let a = xyz_trajectory(0.0, 10.0);
        let b = xyz_trajectory(5.0, 15.0);
        let follower = TrajectoryFollower::default();
        follower.follow_trajectory(a.clone());
        follower.follow_trajectory(a.clone());
        follower.follow_trajectory(b.clone());
        assert_eq!(follower.num_followed(), 2);
        assert_eq!(a.num_observers(), 1);

        follower.unfollow_trajectory(&a);
        follower.unfollow_trajectory(&a);
        assert_eq!(follower.num_followed(), 1);
        assert_eq!(a.num_observers(), 0);
        assert!(Arc::ptr_eq(&follower.followed_trajectories()[0], &b));
    }

    #[test]
    fn test_set_follow_trajectory_replaces_list() {
        let a = xyz_trajectory(0.0, 10.0);
        let b = xyz_trajectory(5.0, 15.0);
        let follower = TrajectoryFollower::default();
        follower.follow_trajectory(a.clone());
        follower.follow_trajectory(b.clone());

        follower.set_follow_trajectory(Some(b.clone()));
        assert_eq!(follower.num_followed(), 1);
        assert_eq!(a.num_observers(), 0);
        assert_eq!(b.num_observers(), 1);

        follower.unfollow_all();
        assert_eq!(follower.num_followed(), 0);
        assert_eq!(b.num_observers(), 0);
    }

    #[test]
    fn test_drop_unregisters() {
        let a = xyz_trajectory(0.0, 10.0);
        {
            let _follower = TrajectoryFollower::with_trajectory(a.clone());
            assert_eq!(a.num_observers(), 1);
        }
        assert_eq!(a.num_observers(), 0);
        assert_eq!(Arc::strong_count(&a), 1);
    }

    #[test]
    fn test_default_sources_follow_first_dof() {
        let planar = Arc::new(Trajectory::new(2, 0).unwrap());
        let follower = TrajectoryFollower::with_trajectory(planar);
        assert_eq!(
            follower.data_sources(),
            [DataSource::position(0), DataSource::position(1), DataSource::zero()]
        );
        assert!(follower.using_default_data());
        assert!(follower.is_data_valid());

        // Replacing the first trajectory re-derives defaults
        follower.set_follow_trajectory(Some(xyz_trajectory(0.0, 1.0)));
        assert_eq!(follower.data_sources()[2], DataSource::position(2));
    }

    #[test]
    fn test_explicit_source_disables_defaults() {
        let planar = Arc::new(Trajectory::new(2, 0).unwrap());
        let follower = TrajectoryFollower::with_trajectory(planar);

        // Same value as the default still counts as explicit
        assert!(follower.set_x_data(DataSource::position(0)));
        assert!(!follower.using_default_data());

        follower.set_follow_trajectory(Some(xyz_trajectory(0.0, 1.0)));
        assert_eq!(follower.data_sources()[2], DataSource::zero());

        follower.set_default_data();
        assert!(follower.using_default_data());
        assert_eq!(follower.data_sources()[2], DataSource::position(2));
    }

    #[test]
    fn test_invalid_source_gates_position() {
        let planar = Arc::new(Trajectory::new(2, 0).unwrap());
        planar.add_sample(0.0, &[1.0, 2.0], DQuat::IDENTITY).unwrap();
        let follower = TrajectoryFollower::with_trajectory(planar);

        assert!(!follower.set_z_data(DataSource::position(2)));
        assert!(!follower.is_data_valid());

        let mut pose = Pose::new(DVec3::splat(9.0), DQuat::IDENTITY);
        let result = follower.tick(0.0, &mut pose);
        let update = result.updated().unwrap();
        assert_eq!(update.position, None);
        assert_eq!(update.attitude, Some(DQuat::IDENTITY));
        assert_eq!(pose.position(), DVec3::splat(9.0));

        assert!(follower.set_z_data(DataSource::zero()));
        follower.tick(1.0, &mut pose);
        assert_eq!(pose.position(), DVec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_repeated_tick_is_noop() {
        let follower = TrajectoryFollower::with_trajectory(xyz_trajectory(0.0, 10.0));
        let mut pose = Pose::default();
        assert!(follower.tick(3.0, &mut pose).updated().is_some());
        let after_first = pose;
        assert_eq!(follower.tick(3.0, &mut pose), UpdateResult::RepeatedTime);
        assert_eq!(pose, after_first);
    }

    #[test]
    fn test_empty_follower_idles() {
        let follower = TrajectoryFollower::default();
        let mut pose = Pose::default();
        assert_eq!(follower.tick(0.0, &mut pose), UpdateResult::Idle);
        assert_eq!(follower.tick(1.0, &mut pose), UpdateResult::Idle);
    }

    #[test]
    fn test_paused_follower_updates_once_per_change() {
        let traj = xyz_trajectory(0.0, 10.0);
        let config = FollowerConfig::frozen_at(4.0);
        let follower = TrajectoryFollower::new(config).unwrap();
        follower.follow_trajectory(traj.clone());

        let mut pose = Pose::default();
        let first = follower.tick(100.0, &mut pose);
        assert_eq!(first.updated().unwrap().time, 4.0);
        assert_eq!(follower.tick(101.0, &mut pose), UpdateResult::Idle);

        follower.set_offset_time(6.0).unwrap();
        assert_eq!(follower.tick(102.0, &mut pose).updated().unwrap().time, 6.0);
        assert!((pose.position().x - 6.0).abs() < 1e-12);
        assert_eq!(follower.tick(103.0, &mut pose), UpdateResult::Idle);
    }

    #[test]
    fn test_data_change_wakes_paused_follower() {
        let traj = Arc::new(Trajectory::new(1, 0).unwrap());
        traj.add_time(0.0).unwrap();
        traj.add_position(&[1.0]).unwrap();

        let follower = TrajectoryFollower::new(FollowerConfig::frozen_at(5.0)).unwrap();
        follower.follow_trajectory(traj.clone());
        let mut pose = Pose::default();
        follower.tick(0.0, &mut pose);
        assert_eq!(pose.position().x, 1.0);
        assert_eq!(follower.tick(1.0, &mut pose), UpdateResult::Idle);

        traj.add_time(10.0).unwrap();
        traj.add_position(&[3.0]).unwrap();
        let update = follower.tick(2.0, &mut pose);
        assert!(update.updated().is_some());
        assert!((pose.position().x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_time_parameters_rejected() {
        let follower = TrajectoryFollower::default();
        assert!(follower.set_time_scale(f64::NAN).is_err());
        assert!(follower.set_offset_time(f64::NEG_INFINITY).is_err());
        assert_eq!(follower.time_scale(), 1.0);
        assert_eq!(follower.offset_time(), 0.0);
        assert!(TrajectoryFollower::new(FollowerConfig::default().with_time_scale(f64::NAN)).is_err());
    }

    #[test]
    fn test_following_tracks_selection() {
        let a = xyz_trajectory(0.0, 10.0);
        let b = xyz_trajectory(20.0, 30.0);
        let follower = TrajectoryFollower::new(FollowerConfig::replay(1.0)).unwrap();
        follower.follow_trajectory(a.clone());
        follower.follow_trajectory(b.clone());
        assert!(follower.following().is_none());

        let mut pose = Pose::default();
        follower.tick(0.0, &mut pose);
        assert!(Arc::ptr_eq(&follower.following().unwrap(), &a));
        follower.tick(22.0, &mut pose);
        assert!(Arc::ptr_eq(&follower.following().unwrap(), &b));

        follower.unfollow_trajectory(&b);
        assert!(follower.following().is_none());
    }
}
