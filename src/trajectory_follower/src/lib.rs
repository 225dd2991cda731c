// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! trajectory_follower: drive a frame transform along timestamped trajectories.
//!
//! A [`TrajectoryFollower`] maps raw (wall) time onto a simulation time,
//! picks one of its followed [`Trajectory`]s, and writes the interpolated
//! position and attitude into a [`FollowTarget`] on every [`tick`].
//!
//! [`tick`]: TrajectoryFollower::tick

mod array_utils;
mod clock;
mod config;
mod data_source;
mod error;
mod follower;
mod interpolate;
mod pose;
mod select;
mod time_management;
mod trajectory;
mod transform;

#[cfg(feature = "python")]
mod python;

pub use array_utils::{ensure_unit_quat, quat_from_scipy, quat_to_scipy};
pub use clock::{union_time_range, wrap_time, SimulationClock, MIN_WRAP_RANGE};
pub use config::{FollowData, FollowMode, FollowerConfig};
pub use data_source::{DataSource, SourceKind};
pub use error::{FollowError, Result};
pub use follower::{Axis, FollowUpdate, TrajectoryFollower, UpdateResult};
pub use interpolate::{interpolate_attitude, interpolate_position};
pub use pose::Pose;
pub use select::{choose_trajectory, TimeSpan};
pub use time_management::TimeManagement;
pub use trajectory::{TimeIndex, Trajectory, TrajectoryData, TrajectoryObserver};
pub use transform::{FollowTarget, FrameTransform};

#[cfg(feature = "python")]
mod module {
    use pyo3::prelude::*;

    use crate::python::{PyFrameTransform, PyTrajectory, PyTrajectoryFollower};

    /// Returns the version of this Rust extension.
    #[pyfunction]
    fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// A Python module implemented in Rust.
    #[pymodule]
    fn trajectory_follower(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<PyTrajectory>()?;
        m.add_class::<PyFrameTransform>()?;
        m.add_class::<PyTrajectoryFollower>()?;
        m.add_function(wrap_pyfunction!(version, m)?)?;
        Ok(())
    }
}
