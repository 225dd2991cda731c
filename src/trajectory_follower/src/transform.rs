// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 NVIDIA Corporation

//! The transform a follower drives, and a concrete frame transform.

use glam::{DMat4, DQuat, DVec3};

use crate::pose::Pose;

/// Receives the state computed by a follower on each tick.
pub trait FollowTarget {
    fn set_position(&mut self, position: DVec3);
    fn set_attitude(&mut self, attitude: DQuat);
}

impl FollowTarget for Pose {
    fn set_position(&mut self, position: DVec3) {
        Pose::set_position(self, position);
    }

    fn set_attitude(&mut self, attitude: DQuat) {
        Pose::set_attitude(self, attitude);
    }
}

/// Local-to-parent transform of a reference frame.
///
/// A point is first translated relative to the pivot, scaled in the local
/// frame, rotated into the parent frame, then translated by the position.
/// While disabled the transform reports identity values and produces no
/// matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
    pose: Pose,
    scale: DVec3,
    pivot: DVec3,
    disabled: bool,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            scale: DVec3::ONE,
            pivot: DVec3::ZERO,
            disabled: false,
        }
    }
}

impl FrameTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore identity position, attitude, scale and pivot, and enable.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn position(&self) -> DVec3 {
        if self.disabled {
            DVec3::ZERO
        } else {
            self.pose.position()
        }
    }

    pub fn attitude(&self) -> DQuat {
        if self.disabled {
            DQuat::IDENTITY
        } else {
            self.pose.attitude()
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position(), self.attitude())
    }

    pub fn set_scale(&mut self, scale: DVec3) {
        self.scale = scale;
    }

    pub fn scale(&self) -> DVec3 {
        if self.disabled {
            DVec3::ONE
        } else {
            self.scale
        }
    }

    pub fn set_pivot(&mut self, pivot: DVec3) {
        self.pivot = pivot;
    }

    pub fn pivot(&self) -> DVec3 {
        if self.disabled {
            DVec3::ZERO
        } else {
            self.pivot
        }
    }

    /// Matrix taking local points to world, given the parent's local-to-world matrix.
    pub fn local_to_world(&self, parent: DMat4) -> Option<DMat4> {
        if self.disabled {
            return None;
        }
        Some(
            parent
                * self.pose.to_matrix()
                * DMat4::from_scale(self.scale)
                * DMat4::from_translation(-self.pivot),
        )
    }

    /// Matrix taking world points to local, given the parent's world-to-local matrix.
    ///
    /// `None` while disabled, or if any scale component is zero.
    pub fn world_to_local(&self, parent: DMat4) -> Option<DMat4> {
        if self.disabled || self.scale.cmpeq(DVec3::ZERO).any() {
            return None;
        }
        Some(
            DMat4::from_translation(self.pivot)
                * DMat4::from_scale(self.scale.recip())
                * self.pose.inverse().to_matrix()
                * parent,
        )
    }
}

impl FollowTarget for FrameTransform {
    fn set_position(&mut self, position: DVec3) {
        self.pose.set_position(position);
    }

    fn set_attitude(&mut self, attitude: DQuat) {
        self.pose.set_attitude(attitude);
    }
}
