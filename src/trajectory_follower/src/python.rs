// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Python bindings for trajectories, frame transforms and followers.

use std::sync::Arc;

use glam::DVec3;
use numpy::{PyArray1, PyArray2, PyArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::array_utils::{
    extract_array1_f64, extract_array2_f64, extract_quat_scipy, quat_from_scipy, quat_to_scipy,
};
use crate::config::{FollowData, FollowMode, FollowerConfig};
use crate::data_source::DataSource;
use crate::error::FollowError;
use crate::follower::{TrajectoryFollower, UpdateResult};
use crate::trajectory::Trajectory;
use crate::transform::{FollowTarget, FrameTransform};

impl From<FollowError> for PyErr {
    fn from(err: FollowError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_mode(mode: &str) -> PyResult<FollowMode> {
    match mode {
        "loop" => Ok(FollowMode::Loop),
        "limit" => Ok(FollowMode::Limit),
        other => Err(PyValueError::new_err(format!(
            "mode must be 'loop' or 'limit', got '{other}'"
        ))),
    }
}

/// A shared trajectory of timestamped positions and attitudes.
#[pyclass(name = "Trajectory")]
#[derive(Clone)]
pub struct PyTrajectory {
    inner: Arc<Trajectory>,
}

#[pymethods]
impl PyTrajectory {
    /// Create an empty trajectory.
    ///
    /// Args:
    ///     dof: Number of position components (1, 2 or 3)
    ///     num_optional: Number of optional data sets per position
    #[new]
    #[pyo3(signature = (dof, num_optional = 0))]
    fn new(dof: usize, num_optional: usize) -> PyResult<Self> {
        Ok(Self {
            inner: Arc::new(Trajectory::new(dof, num_optional)?),
        })
    }

    /// Create a trajectory from numpy arrays.
    ///
    /// Args:
    ///     times: 1D array of N sample times
    ///     positions: 2D array of shape (N, dof)
    ///     quaternions: optional 2D array of shape (N, 4) in scipy order (x, y, z, w)
    #[staticmethod]
    #[pyo3(signature = (times, positions, quaternions = None))]
    fn from_arrays(
        py: Python<'_>,
        times: PyObject,
        positions: PyObject,
        quaternions: Option<PyObject>,
    ) -> PyResult<Self> {
        let ts = extract_array1_f64(py, &times, "times")?;
        let (pos, [rows, dof]) = extract_array2_f64(py, &positions, "positions")?;
        if rows != ts.len() {
            return Err(PyValueError::new_err(format!(
                "positions has {} rows but times has {} elements",
                rows,
                ts.len()
            )));
        }

        let traj = Trajectory::new(dof, 0)?;
        for (i, &t) in ts.iter().enumerate() {
            traj.add_time(t)?;
            traj.add_position(&pos[i * dof..(i + 1) * dof])?;
        }

        if let Some(quaternions) = quaternions {
            let (quat, [qrows, qcols]) = extract_array2_f64(py, &quaternions, "quaternions")?;
            if qcols != 4 || qrows != ts.len() {
                return Err(PyValueError::new_err(format!(
                    "quaternions must have shape ({}, 4), got ({}, {})",
                    ts.len(),
                    qrows,
                    qcols
                )));
            }
            for q in quat.chunks_exact(4) {
                traj.add_attitude(quat_from_scipy(q[0], q[1], q[2], q[3]))?;
            }
        }

        Ok(Self {
            inner: Arc::new(traj),
        })
    }

    fn add_time(&self, t: f64) -> PyResult<()> {
        Ok(self.inner.add_time(t)?)
    }

    fn add_position(&self, py: Python<'_>, position: PyObject) -> PyResult<()> {
        let values = extract_array1_f64(py, &position, "position")?;
        Ok(self.inner.add_position(&values)?)
    }

    /// Set optional data set `set` (1-based) of the most recent position.
    fn set_optional(&self, py: Python<'_>, set: usize, values: PyObject) -> PyResult<()> {
        let values = extract_array1_f64(py, &values, "values")?;
        Ok(self.inner.set_optional(set, &values)?)
    }

    /// Append an attitude quaternion in scipy order (x, y, z, w).
    fn add_attitude(&self, py: Python<'_>, quaternion: PyObject) -> PyResult<()> {
        let q = extract_quat_scipy(py, &quaternion, "quaternion")?;
        Ok(self.inner.add_attitude(q)?)
    }

    fn clear(&self) {
        self.inner.clear();
    }

    #[getter]
    fn dof(&self) -> usize {
        self.inner.dof()
    }

    fn __len__(&self) -> usize {
        self.inner.read().num_times()
    }

    /// (first, last) sample time, or None if empty.
    fn time_range(&self) -> Option<(f64, f64)> {
        self.inner.read().time_range()
    }

    fn time_distance(&self, t: f64) -> f64 {
        self.inner.read().time_distance(t)
    }

    /// Sample times as numpy array.
    #[getter]
    fn times<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, self.inner.read().times())
    }

    /// Positions as numpy array of shape (N, dof).
    #[getter]
    fn positions<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let data = self.inner.read();
        let dof = data.dof();
        let n = data.num_positions();
        let sources = [
            DataSource::position(0),
            if dof > 1 { DataSource::position(1) } else { DataSource::zero() },
            if dof > 2 { DataSource::position(2) } else { DataSource::zero() },
        ];
        let mut flat = Vec::with_capacity(n * dof);
        for p in (0..n).filter_map(|i| data.point(i, &sources)) {
            flat.extend_from_slice(&p.to_array()[..dof]);
        }
        PyArray1::from_vec(py, flat).reshape([n, dof])
    }

    fn __repr__(&self) -> String {
        let data = self.inner.read();
        format!(
            "Trajectory(dof={}, n_times={}, n_positions={}, n_attitudes={})",
            data.dof(),
            data.num_times(),
            data.num_positions(),
            data.num_attitudes()
        )
    }
}

/// Position/attitude/scale/pivot transform of a reference frame.
#[pyclass(name = "FrameTransform")]
#[derive(Clone, Default)]
pub struct PyFrameTransform {
    inner: FrameTransform,
}

#[pymethods]
impl PyFrameTransform {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.inner.set_position(DVec3::new(x, y, z));
    }

    /// Position as numpy array of shape (3,).
    #[getter]
    fn position<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, &self.inner.position().to_array())
    }

    /// Set attitude from a quaternion in scipy order (x, y, z, w).
    fn set_attitude(&mut self, py: Python<'_>, quaternion: PyObject) -> PyResult<()> {
        let q = extract_quat_scipy(py, &quaternion, "quaternion")?;
        self.inner.set_attitude(q);
        Ok(())
    }

    /// Attitude as numpy array of shape (4,) in scipy order (x, y, z, w).
    #[getter]
    fn attitude<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, &quat_to_scipy(self.inner.attitude()))
    }

    fn set_scale(&mut self, sx: f64, sy: f64, sz: f64) {
        self.inner.set_scale(DVec3::new(sx, sy, sz));
    }

    fn set_pivot(&mut self, px: f64, py_: f64, pz: f64) {
        self.inner.set_pivot(DVec3::new(px, py_, pz));
    }

    #[getter]
    fn disabled(&self) -> bool {
        self.inner.is_disabled()
    }

    #[setter]
    fn set_disabled(&mut self, disabled: bool) {
        self.inner.set_disabled(disabled);
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Follows trajectories and writes the result into its own FrameTransform.
#[pyclass(name = "TrajectoryFollower")]
pub struct PyTrajectoryFollower {
    inner: TrajectoryFollower,
    transform: FrameTransform,
}

#[pymethods]
impl PyTrajectoryFollower {
    /// Args:
    ///     trajectory: Optional trajectory to follow
    ///     mode: 'loop' or 'limit'
    ///     time_scale: Simulation seconds per raw second
    ///     offset_time: Simulation time at the first tick
    #[new]
    #[pyo3(signature = (trajectory = None, mode = "loop", time_scale = 1.0, offset_time = 0.0))]
    fn new(
        trajectory: Option<PyRef<'_, PyTrajectory>>,
        mode: &str,
        time_scale: f64,
        offset_time: f64,
    ) -> PyResult<Self> {
        let config = FollowerConfig::default()
            .with_mode(parse_mode(mode)?)
            .with_time_scale(time_scale)
            .with_offset_time(offset_time);
        let inner = TrajectoryFollower::new(config)?;
        if let Some(traj) = trajectory {
            inner.follow_trajectory(Arc::clone(&traj.inner));
        }
        Ok(Self {
            inner,
            transform: FrameTransform::new(),
        })
    }

    fn follow_trajectory(&self, trajectory: PyRef<'_, PyTrajectory>) {
        self.inner.follow_trajectory(Arc::clone(&trajectory.inner));
    }

    /// Follow only `trajectory`; None stops following everything.
    #[pyo3(signature = (trajectory = None))]
    fn set_follow_trajectory(&self, trajectory: Option<PyRef<'_, PyTrajectory>>) {
        self.inner
            .set_follow_trajectory(trajectory.map(|t| Arc::clone(&t.inner)));
    }

    fn unfollow_trajectory(&self, trajectory: PyRef<'_, PyTrajectory>) {
        self.inner.unfollow_trajectory(&trajectory.inner);
    }

    fn unfollow_all(&self) {
        self.inner.unfollow_all();
    }

    /// Choose what to follow and how to treat times outside the range.
    #[pyo3(signature = (position = true, attitude = true, mode = "loop"))]
    fn set_follow_type(&self, position: bool, attitude: bool, mode: &str) -> PyResult<()> {
        let mut data = FollowData::empty();
        data.set(FollowData::POSITION, position);
        data.set(FollowData::ATTITUDE, attitude);
        self.inner.set_follow_type(data, parse_mode(mode)?);
        Ok(())
    }

    fn set_time_scale(&self, time_scale: f64) -> PyResult<()> {
        Ok(self.inner.set_time_scale(time_scale)?)
    }

    fn set_offset_time(&self, offset_time: f64) -> PyResult<()> {
        Ok(self.inner.set_offset_time(offset_time)?)
    }

    fn set_paused(&self, paused: bool) {
        self.inner.set_paused(paused);
    }

    #[getter]
    fn paused(&self) -> bool {
        self.inner.paused()
    }

    fn reset(&self) {
        self.inner.reset();
    }

    #[getter]
    fn simulation_time(&self) -> f64 {
        self.inner.simulation_time()
    }

    /// Advance to `raw_time`. Returns True if the transform was updated.
    fn tick(&mut self, raw_time: f64) -> bool {
        matches!(
            self.inner.tick(raw_time, &mut self.transform),
            UpdateResult::Updated(_)
        )
    }

    /// Followed position as numpy array of shape (3,).
    #[getter]
    fn position<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, &self.transform.position().to_array())
    }

    /// Followed attitude as numpy array of shape (4,) in scipy order.
    #[getter]
    fn attitude<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, &quat_to_scipy(self.transform.attitude()))
    }
}
