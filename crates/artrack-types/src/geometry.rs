//! Rigid-body geometry shared by every ArTrack crate.
//!
//! Poses follow the usual robotics convention: a [`Pose`] describes frame B
//! relative to frame A, so to convert a point expressed in B into A, rotate it
//! by `orientation` then add `position`.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }

    /// Euclidean length.
    pub fn norm(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1); see [`Quaternion::normalized`].
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` around the Z axis.
    pub fn from_yaw(angle_rad: f32) -> Self {
        let half = angle_rad * 0.5;
        Self::new(half.cos(), 0.0, 0.0, half.sin())
    }

    /// Rescale to unit length.  A degenerate (all-zero) quaternion becomes the
    /// identity.
    pub fn normalized(self) -> Self {
        let n = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if n < f32::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Smallest rotation angle (radians, in `[0, π]`) taking `self` to `other`.
    pub fn angle_to(self, other: Self) -> f32 {
        let dot = (self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z)
            .abs()
            .min(1.0);
        2.0 * dot.acos()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body transform: the position and orientation of one frame inside
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    /// Create a pose from a position and orientation.
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The identity pose.
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// A pure translation.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, y, z), Quaternion::identity())
    }

    /// Compose two poses: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.position.add(self.orientation.rotate(other.position));
        let rotated = self.orientation.mul(other.orientation);
        Self::new(translated, rotated)
    }

    /// The inverse transform: T_A_B becomes T_B_A.
    pub fn inverse(self) -> Self {
        let inv_rot = self.orientation.conjugate();
        Self::new(inv_rot.rotate(self.position).neg(), inv_rot)
    }

    /// Express this pose relative to `frame`, where both are given in the same
    /// parent frame.
    pub fn transform_in(self, frame: Self) -> Self {
        frame.inverse().compose(self)
    }

    /// Same pose with a unit orientation.
    pub fn normalized(self) -> Self {
        Self::new(self.position, self.orientation.normalized())
    }

    /// Distance between the origins of two poses.
    pub fn distance_to(self, other: Self) -> f32 {
        self.position.sub(other.position).norm()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn quaternion_90deg_yaw_rotates_x_to_y() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let r = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-5, "x should be ~0, got {}", r.x);
        assert!((r.y - 1.0).abs() < 1e-5, "y should be ~1, got {}", r.y);
        assert!(r.z.abs() < 1e-5);
    }

    #[test]
    fn from_yaw_matches_explicit_quaternion() {
        let q = Quaternion::from_yaw(FRAC_PI_2);
        assert!((q.w - FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((q.z - FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn normalized_degenerate_is_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn angle_to_measures_yaw_difference() {
        let a = Quaternion::identity();
        let b = Quaternion::from_yaw(FRAC_PI_2);
        assert!((a.angle_to(b) - FRAC_PI_2).abs() < 1e-4);
        assert!(a.angle_to(a) < 1e-3);
    }

    // ── Pose ────────────────────────────────────────────────────────────────

    #[test]
    fn compose_translations_add() {
        let t = Pose::from_translation(1.0, 0.0, 0.0).compose(Pose::from_translation(2.0, 0.0, 0.0));
        assert!((t.position.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let p = Pose::new(Vec3::new(1.0, -2.0, 0.5), Quaternion::from_yaw(0.7));
        let id = p.compose(p.inverse());
        assert!(id.position.norm() < 1e-5);
        assert!(id.orientation.angle_to(Quaternion::identity()) < 1e-3);
    }

    #[test]
    fn transform_in_expresses_relative_pose() {
        // Object at (2, 0, 0) rotated 90° about Z; marker 1 m along world +Y
        // from it sits 1 m along the object's local +X.
        let object = Pose::new(Vec3::new(2.0, 0.0, 0.0), Quaternion::from_yaw(FRAC_PI_2));
        let marker = Pose::from_translation(2.0, 1.0, 0.0);
        let rel = marker.transform_in(object);
        assert!((rel.position.x - 1.0).abs() < 1e-5, "x={}", rel.position.x);
        assert!(rel.position.y.abs() < 1e-5, "y={}", rel.position.y);
    }

    #[test]
    fn normalized_pose_keeps_position_and_fixes_orientation() {
        let p = Pose::new(Vec3::new(0.5, 0.0, 1.0), Quaternion::new(2.0, 0.0, 0.0, 0.0)).normalized();
        assert_eq!(p.orientation, Quaternion::identity());
        assert!((p.position.x - 0.5).abs() < 1e-5);

        // A scaled quaternion would stretch composed offsets by |q|².
        let child = p.compose(Pose::from_translation(1.0, 0.0, 0.0));
        assert!((child.position.x - 1.5).abs() < 1e-5);
    }
}
