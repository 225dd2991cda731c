// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Shared quaternion checks, plus numpy extraction helpers for the bindings.
//!
//! The numpy helpers accept float32 or float64 input and always produce f64,
//! with clear error messages for invalid dtypes.

use glam::DQuat;

use crate::error::{FollowError, Result};

// ============================================================================
// Quaternion conversion utilities
// ============================================================================

/// Convert scipy quaternion (x, y, z, w) to glam quaternion.
#[inline]
pub fn quat_from_scipy(x: f64, y: f64, z: f64, w: f64) -> DQuat {
    DQuat::from_xyzw(x, y, z, w)
}

/// Convert glam quaternion to scipy format array [x, y, z, w].
#[inline]
pub fn quat_to_scipy(q: DQuat) -> [f64; 4] {
    [q.x, q.y, q.z, q.w]
}

/// Maximum allowed deviation of quaternion length² from 1.0.
///
/// Quaternions within this tolerance are silently normalized to correct for
/// floating-point drift. Quaternions outside it are rejected.
const UNIT_QUAT_LEN_SQ_TOL: f64 = 1e-4;

/// Ensure a quaternion is unit-length, normalizing if within tolerance.
///
/// - Non-finite or near-zero quaternions (length² < 1e-12) are rejected.
/// - Quaternions within [`UNIT_QUAT_LEN_SQ_TOL`] of unit length are
///   normalized and returned.
/// - Quaternions far from unit length are rejected.
pub fn ensure_unit_quat(q: DQuat, name: &str) -> Result<DQuat> {
    if !q.is_finite() {
        return Err(FollowError::invalid_quaternion(format!(
            "{name}: quaternion has non-finite components"
        )));
    }

    let len_sq = q.length_squared();
    if len_sq < 1e-12 {
        return Err(FollowError::invalid_quaternion(format!(
            "{name}: quaternion is near-zero (length²={len_sq:.2e})"
        )));
    }

    if (len_sq - 1.0).abs() <= UNIT_QUAT_LEN_SQ_TOL {
        return Ok(q.normalize());
    }

    Err(FollowError::invalid_quaternion(format!(
        "{name}: quaternion is not unit-length (length={:.6})",
        len_sq.sqrt()
    )))
}

// ============================================================================
// numpy extraction (bindings only)
// ============================================================================

#[cfg(feature = "python")]
pub(crate) use numpy_extract::{extract_array1_f64, extract_array2_f64, extract_quat_scipy};

#[cfg(feature = "python")]
mod numpy_extract {
    use glam::DQuat;
    use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyUntypedArrayMethods};
    use pyo3::prelude::*;

    use super::{ensure_unit_quat, quat_from_scipy};

    /// Extract a 1D array as `Vec<f64>`, accepting f32 or f64.
    pub(crate) fn extract_array1_f64(
        py: Python<'_>,
        obj: &PyObject,
        name: &str,
    ) -> PyResult<Vec<f64>> {
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, f64>>(py) {
            return Ok(arr.as_slice()?.to_vec());
        }
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, f32>>(py) {
            return Ok(arr.as_slice()?.iter().map(|&v| f64::from(v)).collect());
        }
        Err(dtype_error(py, obj, name, "float32 or float64"))
    }

    /// Extract a 2D array as (flat row-major `Vec<f64>`, [rows, cols]).
    pub(crate) fn extract_array2_f64(
        py: Python<'_>,
        obj: &PyObject,
        name: &str,
    ) -> PyResult<(Vec<f64>, [usize; 2])> {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<'_, f64>>(py) {
            let shape = arr.shape();
            let data = arr.as_array().iter().copied().collect();
            return Ok((data, [shape[0], shape[1]]));
        }
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<'_, f32>>(py) {
            let shape = arr.shape();
            let data = arr.as_array().iter().map(|&v| f64::from(v)).collect();
            return Ok((data, [shape[0], shape[1]]));
        }
        Err(dtype_error(py, obj, name, "2D float32 or float64"))
    }

    /// Extract a quaternion in scipy format (x, y, z, w) from a 1D array of length 4.
    pub(crate) fn extract_quat_scipy(
        py: Python<'_>,
        obj: &PyObject,
        name: &str,
    ) -> PyResult<DQuat> {
        let data = extract_array1_f64(py, obj, name)?;
        if data.len() != 4 {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "{} must have 4 elements, got {}",
                name,
                data.len()
            )));
        }
        let q = quat_from_scipy(data[0], data[1], data[2], data[3]);
        Ok(ensure_unit_quat(q, name)?)
    }

    fn dtype_error(py: Python<'_>, obj: &PyObject, name: &str, expected: &str) -> PyErr {
        let dtype_str = obj
            .getattr(py, "dtype")
            .and_then(|d| d.bind(py).str().map(|s| s.to_string()))
            .unwrap_or_else(|_| "unknown".to_string());
        PyErr::new::<pyo3::exceptions::PyTypeError, _>(format!(
            "{} must be a numpy array with dtype {}, got dtype={}",
            name, expected, dtype_str
        ))
    }
}
