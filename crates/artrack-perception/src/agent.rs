//! Robot agent model: head pose tracking and camera field of view.
//!
//! The perception adapter only needs three things from the robot it runs on:
//! whether the head is located, whether it moved since the previous check,
//! and whether a point seen from the head lies inside the camera frustum.
//! [`RobotAgent`] captures that; [`Agent`] is a self-contained implementation.

use artrack_types::{Pose, Vec3};
use serde::{Deserialize, Serialize};

/// Head translation (metres) above which the head counts as moved.
pub const HEAD_TRANSLATION_EPSILON: f32 = 1e-3;

/// Head rotation (radians, ~0.1°) above which the head counts as moved.
pub const HEAD_ROTATION_EPSILON: f32 = 1.75e-3;

// ────────────────────────────────────────────────────────────────────────────
// FieldOfView
// ────────────────────────────────────────────────────────────────────────────

/// Camera frustum in the optical convention: +Z forward, +X right, +Y down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    /// Full vertical opening angle (degrees).
    pub height_deg: f32,
    /// Full horizontal opening angle (degrees).
    pub width_deg: f32,
    /// Closest visible distance along +Z (metres).
    pub clip_near: f32,
    /// Farthest visible distance along +Z (metres).
    pub clip_far: f32,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self::new(45.0, 60.0, 0.1, 12.0)
    }
}

impl FieldOfView {
    pub fn new(height_deg: f32, width_deg: f32, clip_near: f32, clip_far: f32) -> Self {
        Self {
            height_deg,
            width_deg,
            clip_near,
            clip_far,
        }
    }

    /// True when `point`, expressed in the head frame, lies inside the frustum
    /// (boundaries included).
    pub fn contains(&self, point: Vec3) -> bool {
        if point.z < self.clip_near || point.z > self.clip_far {
            return false;
        }
        let half_width = self.width_deg.to_radians() * 0.5;
        let half_height = self.height_deg.to_radians() * 0.5;
        point.x.atan2(point.z).abs() <= half_width && point.y.atan2(point.z).abs() <= half_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Head
// ────────────────────────────────────────────────────────────────────────────

/// Pose of the robot's sensor head and whether it moved at the last update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Head {
    pose: Option<Pose>,
    moved: bool,
}

impl Head {
    /// A head whose pose is not known yet.
    pub fn unlocated() -> Self {
        Self::default()
    }

    /// A head resting at `pose`.
    pub fn located(pose: Pose) -> Self {
        Self {
            pose: Some(pose),
            moved: false,
        }
    }

    /// Record a new head pose.
    ///
    /// The head counts as moved when the new pose differs from the previous
    /// one by more than [`HEAD_TRANSLATION_EPSILON`] or
    /// [`HEAD_ROTATION_EPSILON`].  Locating a previously unlocated head does
    /// not count as a move.
    pub fn update_pose(&mut self, pose: Pose) {
        self.moved = match self.pose {
            Some(previous) => {
                previous.distance_to(pose) > HEAD_TRANSLATION_EPSILON
                    || previous.orientation.angle_to(pose.orientation) > HEAD_ROTATION_EPSILON
            }
            None => false,
        };
        self.pose = Some(pose);
    }

    /// Forget the head pose (e.g. after losing the joint states).
    pub fn set_unlocated(&mut self) {
        self.pose = None;
        self.moved = false;
    }

    pub fn is_located(&self) -> bool {
        self.pose.is_some()
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RobotAgent
// ────────────────────────────────────────────────────────────────────────────

/// The robot a perception module runs on.
pub trait RobotAgent {
    fn id(&self) -> &str;

    /// `None` for robots without a sensor head.
    fn head(&self) -> Option<&Head>;

    fn field_of_view(&self) -> &FieldOfView;

    /// True when `pose` (in the same frame as the head pose) is visible from
    /// the head.  Always false while the head is missing or unlocated.
    fn can_see(&self, pose: Pose) -> bool {
        match self.head().and_then(Head::pose) {
            Some(head_pose) => self
                .field_of_view()
                .contains(pose.transform_in(head_pose).position),
            None => false,
        }
    }
}

/// A robot with an optional head and a fixed camera frustum.
#[derive(Debug, Clone)]
pub struct Agent {
    id: String,
    head: Option<Head>,
    field_of_view: FieldOfView,
}

impl Agent {
    /// A headless agent.
    pub fn new(id: impl Into<String>, field_of_view: FieldOfView) -> Self {
        Self {
            id: id.into(),
            head: None,
            field_of_view,
        }
    }

    /// Attach a head resting at `pose`.
    pub fn with_head(mut self, pose: Pose) -> Self {
        self.head = Some(Head::located(pose));
        self
    }

    pub fn head_mut(&mut self) -> Option<&mut Head> {
        self.head.as_mut()
    }

    /// Update the head pose, creating an (unmoved) head if there was none.
    pub fn set_head_pose(&mut self, pose: Pose) {
        match self.head.as_mut() {
            Some(head) => head.update_pose(pose),
            None => self.head = Some(Head::located(pose)),
        }
    }
}

impl RobotAgent for Agent {
    fn id(&self) -> &str {
        &self.id
    }

    fn head(&self) -> Option<&Head> {
        self.head.as_ref()
    }

    fn field_of_view(&self) -> &FieldOfView {
        &self.field_of_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artrack_types::Quaternion;

    #[test]
    fn point_straight_ahead_is_visible() {
        let fov = FieldOfView::default();
        assert!(fov.contains(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn points_behind_or_beyond_clip_are_not_visible() {
        let fov = FieldOfView::new(45.0, 60.0, 0.1, 5.0);
        assert!(!fov.contains(Vec3::new(0.0, 0.0, -1.0)));
        assert!(!fov.contains(Vec3::new(0.0, 0.0, 0.05)));
        assert!(!fov.contains(Vec3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn lateral_limit_uses_half_width() {
        let fov = FieldOfView::new(45.0, 60.0, 0.1, 12.0);
        // atan2(0.5, 1) ≈ 26.6° < 30°, atan2(0.7, 1) ≈ 35° > 30°
        assert!(fov.contains(Vec3::new(0.5, 0.0, 1.0)));
        assert!(!fov.contains(Vec3::new(0.7, 0.0, 1.0)));
        // Vertical half angle is 22.5°: atan2(0.5, 1) is outside.
        assert!(!fov.contains(Vec3::new(0.0, 0.5, 1.0)));
    }

    #[test]
    fn head_detects_motion_beyond_epsilon() {
        let mut head = Head::located(Pose::identity());
        head.update_pose(Pose::from_translation(0.0005, 0.0, 0.0));
        assert!(!head.has_moved());
        head.update_pose(Pose::from_translation(0.1, 0.0, 0.0));
        assert!(head.has_moved());
        head.update_pose(Pose::from_translation(0.1, 0.0, 0.0));
        assert!(!head.has_moved(), "holding still clears the moved flag");
        head.update_pose(Pose::new(Vec3::new(0.1, 0.0, 0.0), Quaternion::from_yaw(0.1)));
        assert!(head.has_moved());
    }

    #[test]
    fn first_fix_is_not_a_move() {
        let mut head = Head::unlocated();
        assert!(!head.is_located());
        head.update_pose(Pose::identity());
        assert!(head.is_located());
        assert!(!head.has_moved());
    }

    #[test]
    fn can_see_projects_into_head_frame() {
        // Head at the map origin looking along +Z.
        let agent = Agent::new("pr2", FieldOfView::default()).with_head(Pose::identity());
        assert!(agent.can_see(Pose::from_translation(0.0, 0.0, 2.0)));
        assert!(!agent.can_see(Pose::from_translation(0.0, 0.0, -2.0)));

        let headless = Agent::new("turtle", FieldOfView::default());
        assert!(!headless.can_see(Pose::from_translation(0.0, 0.0, 2.0)));
    }

    #[test]
    fn set_head_pose_creates_head() {
        let mut agent = Agent::new("pr2", FieldOfView::default());
        assert!(agent.head().is_none());
        agent.set_head_pose(Pose::identity());
        assert!(agent.head().is_some_and(Head::is_located));
        assert_eq!(agent.id(), "pr2");
    }
}
