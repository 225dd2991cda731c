// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! End-to-end follower scenarios driven through the public API.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::thread;

use glam::{DMat4, DQuat, DVec3};
use trajectory_follower::{
    DataSource, FollowData, FollowMode, FollowTarget, FollowerConfig, FrameTransform, Pose,
    TimeManagement, Trajectory, TrajectoryFollower, UpdateResult,
};

const EPS: f64 = 1e-9;

/// One-DOF trajectory whose x moves linearly from `x0` to `x1` over `[t0, t1]`.
fn ramp(t0: f64, t1: f64, x0: f64, x1: f64) -> Arc<Trajectory> {
    Arc::new(Trajectory::from_samples(1, &[t0, t1], &[&[x0], &[x1]]).unwrap())
}

/// Three-DOF trajectory moving along +X while yawing a quarter turn.
fn yawing_line() -> Arc<Trajectory> {
    let traj = Trajectory::new(3, 0).unwrap();
    traj.add_sample(0.0, &[0.0, 0.0, 0.0], DQuat::IDENTITY).unwrap();
    traj.add_sample(10.0, &[10.0, 0.0, 0.0], DQuat::from_rotation_z(FRAC_PI_2))
        .unwrap();
    Arc::new(traj)
}

fn limit() -> FollowerConfig {
    FollowerConfig::default().with_mode(FollowMode::Limit)
}

fn x_at<T: FollowTarget + ?Sized>(follower: &TrajectoryFollower, raw: f64, target: &mut T) -> f64 {
    match follower.tick(raw, target) {
        UpdateResult::Updated(update) => update.position.map_or(f64::NAN, |p| p.x),
        other => panic!("expected an update at raw={raw}, got {other:?}"),
    }
}

fn assert_x<T: FollowTarget + ?Sized>(
    follower: &TrajectoryFollower,
    raw: f64,
    target: &mut T,
    expected: f64,
) {
    let x = x_at(follower, raw, target);
    assert!((x - expected).abs() < EPS, "raw={raw}: x={x}, expected {expected}");
}

#[test]
fn loop_mode_wraps_into_frame_transform() {
    let follower = TrajectoryFollower::with_trajectory(yawing_line());
    let mut frame = FrameTransform::new();

    follower.tick(0.0, &mut frame);
    follower.tick(25.0, &mut frame);

    assert!((frame.position() - DVec3::new(5.0, 0.0, 0.0)).length() < EPS);
    let half_turn = DQuat::from_rotation_z(FRAC_PI_2 / 2.0);
    assert!(frame.attitude().angle_between(half_turn) < EPS);

    let world = frame.local_to_world(DMat4::IDENTITY).unwrap();
    let tip = world.transform_point3(DVec3::X);
    let h = FRAC_PI_2 / 2.0;
    assert!((tip - DVec3::new(5.0 + h.cos(), h.sin(), 0.0)).length() < EPS);
}

#[test]
fn limit_mode_holds_end_samples() {
    let follower = TrajectoryFollower::new(limit()).unwrap();
    follower.follow_trajectory(ramp(0.0, 10.0, 0.0, 10.0));
    let mut pose = Pose::default();

    assert_x(&follower, 0.0, &mut pose, 0.0);
    assert_x(&follower, 25.0, &mut pose, 10.0);
    assert!((pose.position() - DVec3::new(10.0, 0.0, 0.0)).length() < EPS);
}

#[test]
fn reversed_trajectory_holds_nearest_end() {
    // Stored newest-first; x equals the sample time
    let reversed = ramp(10.0, 0.0, 10.0, 0.0);
    let follower = TrajectoryFollower::new(limit().with_offset_time(-4.0)).unwrap();
    follower.follow_trajectory(reversed);
    let mut pose = Pose::default();

    assert_x(&follower, 0.0, &mut pose, 0.0);
    assert_x(&follower, 10.0, &mut pose, 6.0);
    assert_x(&follower, 19.0, &mut pose, 10.0);
}

#[test]
fn overlapping_trajectories_keep_current_selection() {
    let a = ramp(0.0, 10.0, 1.0, 1.0);
    let b = ramp(5.0, 15.0, 2.0, 2.0);
    let follower = TrajectoryFollower::new(limit()).unwrap();
    follower.follow_trajectory(Arc::clone(&a));
    follower.follow_trajectory(Arc::clone(&b));
    let mut pose = Pose::default();

    assert_x(&follower, 0.0, &mut pose, 1.0);
    assert_x(&follower, 7.0, &mut pose, 1.0);
    // A no longer covers 12
    assert_x(&follower, 12.0, &mut pose, 2.0);
    // Back inside the overlap, B stays selected
    assert_x(&follower, 7.0, &mut pose, 2.0);
    assert!(Arc::ptr_eq(&follower.following().unwrap(), &b));
}

#[test]
fn gap_between_trajectories_uses_closest() {
    let a = ramp(0.0, 10.0, 1.0, 1.0);
    let b = ramp(20.0, 30.0, 2.0, 2.0);
    let follower = TrajectoryFollower::new(limit()).unwrap();
    follower.follow_trajectory(Arc::clone(&a));
    follower.follow_trajectory(Arc::clone(&b));
    let mut pose = Pose::default();

    assert_x(&follower, 0.0, &mut pose, 1.0);
    assert_x(&follower, 13.0, &mut pose, 1.0);
    assert!(Arc::ptr_eq(&follower.following().unwrap(), &a));
    assert_x(&follower, 18.0, &mut pose, 2.0);
    assert!(Arc::ptr_eq(&follower.following().unwrap(), &b));
}

#[test]
fn offset_and_reset_anchor_simulation_time() {
    let follower = TrajectoryFollower::new(limit().with_offset_time(3.0)).unwrap();
    follower.follow_trajectory(ramp(0.0, 100.0, 0.0, 100.0));
    let mut pose = Pose::default();

    assert_x(&follower, 1000.0, &mut pose, 3.0);
    assert_x(&follower, 1002.0, &mut pose, 5.0);

    follower.reset();
    assert_eq!(follower.simulation_time(), 3.0);
    assert_x(&follower, 1003.0, &mut pose, 4.0);
}

#[test]
fn time_scale_change_is_continuous() {
    let follower = TrajectoryFollower::new(limit().with_time_scale(2.0)).unwrap();
    follower.follow_trajectory(ramp(0.0, 100.0, 0.0, 100.0));
    let mut pose = Pose::default();

    assert_x(&follower, 0.0, &mut pose, 0.0);
    assert_x(&follower, 2.0, &mut pose, 4.0);

    follower.set_time_scale(1.0).unwrap();
    assert_eq!(follower.simulation_time(), 4.0);
    assert_x(&follower, 3.0, &mut pose, 5.0);
}

#[test]
fn position_only_leaves_attitude_alone() {
    let follower = TrajectoryFollower::with_trajectory(yawing_line());
    follower.set_follow_type(FollowData::POSITION, FollowMode::Limit);
    let marker = DQuat::from_rotation_x(1.0);
    let mut pose = Pose::new(DVec3::ZERO, marker);

    let UpdateResult::Updated(update) = follower.tick(0.0, &mut pose) else {
        panic!("expected an update");
    };
    assert!(update.attitude.is_none());
    assert_eq!(pose.attitude(), marker);
    assert_x(&follower, 4.0, &mut pose, 4.0);
}

#[test]
fn optional_data_drives_an_axis() {
    let traj = Trajectory::new(1, 1).unwrap();
    for (t, x, extra) in [(0.0, 0.0, 100.0), (10.0, 10.0, 200.0)] {
        traj.add_time(t).unwrap();
        traj.add_position(&[x]).unwrap();
        traj.set_optional(1, &[extra]).unwrap();
    }
    let follower = TrajectoryFollower::new(limit()).unwrap();
    follower.follow_trajectory(Arc::new(traj));
    assert!(follower.set_y_data(DataSource::optional(1, 0)));
    assert!(!follower.using_default_data());

    let mut pose = Pose::default();
    follower.tick(0.0, &mut pose);
    follower.tick(5.0, &mut pose);
    assert!((pose.position() - DVec3::new(5.0, 150.0, 0.0)).length() < EPS);

    // A set the trajectory does not have blocks position updates only
    assert!(!follower.set_z_data(DataSource::optional(2, 0)));
    let UpdateResult::Updated(update) = follower.tick(7.0, &mut pose) else {
        panic!("expected an update");
    };
    assert!(update.position.is_none());
    assert!(update.attitude.is_some());
    assert!((pose.position() - DVec3::new(5.0, 150.0, 0.0)).length() < EPS);
}

#[test]
fn failed_search_leaves_target_untouched() {
    let follower = TrajectoryFollower::with_trajectory(yawing_line());
    let mut pose = Pose::default();
    follower.tick(0.0, &mut pose);

    let marker = Pose::new(DVec3::new(-1.0, -2.0, -3.0), DQuat::from_rotation_y(0.5));
    pose = marker;
    let UpdateResult::Updated(update) = follower.tick(f64::NAN, &mut pose) else {
        panic!("expected an update");
    };
    assert!(update.position.is_none());
    assert!(update.attitude.is_none());
    assert_eq!(pose, marker);

    // The next valid time recovers
    assert_x(&follower, 5.0, &mut pose, 5.0);
}

#[test]
fn broadcast_time_changes_to_followers() {
    let traj = ramp(0.0, 100.0, 0.0, 100.0);
    let followers = [
        TrajectoryFollower::new(limit()).unwrap(),
        TrajectoryFollower::new(limit()).unwrap(),
    ];
    let mut poses = [Pose::default(), Pose::default()];
    for (f, pose) in followers.iter().zip(&mut poses) {
        f.follow_trajectory(Arc::clone(&traj));
        assert_x(f, 0.0, pose, 0.0);
    }

    TimeManagement::new()
        .offset_time(4.0)
        .reset()
        .apply_all(&followers)
        .unwrap();

    for (f, pose) in followers.iter().zip(&mut poses) {
        assert_x(f, 1.0, pose, 5.0);
    }
    assert_eq!(traj.num_observers(), 2);
    drop(followers);
    assert_eq!(traj.num_observers(), 0);
}

#[test]
fn concurrent_ticks_edits_and_list_changes() {
    let a = ramp(0.0, 10.0, 0.0, 10.0);
    let b = ramp(20.0, 30.0, 20.0, 30.0);
    let follower = TrajectoryFollower::new(limit()).unwrap();
    follower.follow_trajectory(Arc::clone(&a));

    thread::scope(|s| {
        s.spawn(|| {
            // Every sample of A and B has x equal to its time, all within [0, 30]
            let mut pose = Pose::default();
            for i in 1..=500 {
                let raw = f64::from(i) * 0.1;
                let UpdateResult::Updated(update) = follower.tick(raw, &mut pose) else {
                    panic!("expected an update at raw={raw}");
                };
                let x = update.position.map(|p| p.x).unwrap_or(f64::NAN);
                assert!((0.0..=30.0).contains(&x), "raw={raw}: x={x} outside followed data");
                assert_eq!(pose.position().x, x);
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                follower.follow_trajectory(Arc::clone(&b));
                follower.unfollow_trajectory(&b);
            }
        });
        s.spawn(|| {
            for i in 0..200 {
                let t = 10.0 + f64::from(i + 1) * 0.05;
                a.add_time(t).unwrap();
                a.add_position(&[t]).unwrap();
            }
        });
    });

    assert_eq!(follower.num_followed(), 1);
    assert_eq!(a.num_observers(), 1);
    assert_eq!(b.num_observers(), 0);
    assert_eq!(a.read().num_times(), 202);
    assert_eq!(a.read().num_positions(), 202);
}
