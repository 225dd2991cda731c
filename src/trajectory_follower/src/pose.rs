// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! Pose: a single rigid transform (position + attitude quaternion).

use glam::{DMat4, DQuat, DVec3};

/// A single rigid transform: position + quaternion rotation.
///
/// Quaternions use glam's (x, y, z, w) storage order; identity is (0, 0, 0, 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    position: DVec3,
    attitude: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Zero position, identity rotation.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        attitude: DQuat::IDENTITY,
    };

    #[inline]
    pub fn new(position: DVec3, attitude: DQuat) -> Self {
        Self { position, attitude }
    }

    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    #[inline]
    pub fn attitude(&self) -> DQuat {
        self.attitude
    }

    #[inline]
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    #[inline]
    pub fn set_attitude(&mut self, attitude: DQuat) {
        self.attitude = attitude;
    }

    /// Compute pose composition: self @ other.
    #[inline]
    pub fn compose(&self, other: &Pose) -> Pose {
        // new_pos = self.att * other.pos + self.pos
        // new_att = self.att * other.att
        Pose {
            position: self.position + self.attitude * other.position,
            attitude: self.attitude * other.attitude,
        }
    }

    /// Compute the inverse of this pose.
    #[inline]
    pub fn inverse(&self) -> Pose {
        let inv_att = self.attitude.inverse();
        Pose {
            position: -(inv_att * self.position),
            attitude: inv_att,
        }
    }

    /// Rotation followed by translation, as a 4x4 matrix.
    #[inline]
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.attitude, self.position)
    }

    /// Apply this pose to a point.
    #[inline]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.position + self.attitude * p
    }
}
