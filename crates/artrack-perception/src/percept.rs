//! World-model entities produced by perception.
//!
//! A [`Percept`] is the robot's belief about one physical object: where it is,
//! what it looks like, and whether it was seen during the current cycle.
//! [`PointOfInterest`]s are named pose sets rigidly attached to a percept
//! (grasp points, marker corners, …) and expressed in the percept's frame.

use artrack_types::{Pose, Shape};
use serde::Serialize;

// ────────────────────────────────────────────────────────────────────────────
// PointOfInterest
// ────────────────────────────────────────────────────────────────────────────

/// A named set of poses expressed in the owning percept's local frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    id: String,
    points: Vec<Pose>,
    seen: bool,
}

impl PointOfInterest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            points: Vec::new(),
            seen: false,
        }
    }

    pub fn add_point(&mut self, pose: Pose) {
        self.points.push(pose);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[Pose] {
        &self.points
    }

    pub fn is_seen(&self) -> bool {
        self.seen
    }

    pub fn set_seen(&mut self) {
        self.seen = true;
    }

    pub fn set_unseen(&mut self) {
        self.seen = false;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Percept
// ────────────────────────────────────────────────────────────────────────────

/// A perceived real-world object.
///
/// Visibility is tracked per cycle: [`Percept::set_unseen`] opens a cycle and
/// [`Percept::set_seen`] confirms the object during it.
/// [`Percept::frames_unseen`] is the number of consecutive earlier cycles in
/// which the object was not confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percept {
    id: String,
    pose: Option<Pose>,
    shape: Shape,
    mass: f32,
    seen: bool,
    frames_unseen: u32,
    points_of_interest: Vec<PointOfInterest>,
}

impl Percept {
    /// A percept with no pose and no shape information.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pose: None,
            shape: Shape::default(),
            mass: 0.0,
            seen: false,
            frames_unseen: 0,
            points_of_interest: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current pose in the reference frame, once located.
    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }

    pub fn is_located(&self) -> bool {
        self.pose.is_some()
    }

    pub fn update_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
    }

    pub fn is_seen(&self) -> bool {
        self.seen
    }

    pub fn frames_unseen(&self) -> u32 {
        self.frames_unseen
    }

    pub fn set_seen(&mut self) {
        self.seen = true;
    }

    /// Start a new cycle with the percept unconfirmed.
    pub fn set_unseen(&mut self) {
        if self.seen {
            self.frames_unseen = 0;
        } else {
            self.frames_unseen = self.frames_unseen.saturating_add(1);
        }
        self.seen = false;
    }

    pub fn points_of_interest(&self) -> &[PointOfInterest] {
        &self.points_of_interest
    }

    pub fn point_of_interest(&self, id: &str) -> Option<&PointOfInterest> {
        self.points_of_interest.iter().find(|p| p.id() == id)
    }

    pub fn has_point_of_interest(&self, id: &str) -> bool {
        self.point_of_interest(id).is_some()
    }

    /// Attach a point of interest.  Returns `false` (and keeps the existing
    /// one) when a point of interest with the same id is already attached.
    pub fn add_point_of_interest(&mut self, poi: PointOfInterest) -> bool {
        if self.has_point_of_interest(poi.id()) {
            return false;
        }
        self.points_of_interest.push(poi);
        true
    }

    pub fn set_point_of_interest_seen(&mut self, id: &str) {
        if let Some(poi) = self.points_of_interest.iter_mut().find(|p| p.id() == id) {
            poi.set_seen();
        }
    }

    pub fn set_all_poi_unseen(&mut self) {
        for poi in &mut self.points_of_interest {
            poi.set_unseen();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_percept_is_unlocated_and_unseen() {
        let p = Percept::new("cube_1");
        assert_eq!(p.id(), "cube_1");
        assert!(!p.is_located());
        assert!(!p.is_seen());
        assert_eq!(p.frames_unseen(), 0);
    }

    #[test]
    fn frames_unseen_counts_consecutive_missed_cycles() {
        let mut p = Percept::new("cube_1");
        p.set_unseen();
        p.set_seen();
        p.set_unseen();
        assert_eq!(p.frames_unseen(), 0, "seen in the previous cycle");
        p.set_unseen();
        assert_eq!(p.frames_unseen(), 1);
        p.set_unseen();
        assert_eq!(p.frames_unseen(), 2);
        p.set_seen();
        p.set_unseen();
        assert_eq!(p.frames_unseen(), 0);
    }

    #[test]
    fn duplicate_point_of_interest_is_rejected() {
        let mut p = Percept::new("cube_1");
        let mut poi = PointOfInterest::new("ar_3");
        poi.add_point(Pose::identity());
        assert!(p.add_point_of_interest(poi));
        assert!(!p.add_point_of_interest(PointOfInterest::new("ar_3")));
        assert_eq!(p.points_of_interest().len(), 1);
        assert_eq!(p.point_of_interest("ar_3").unwrap().points().len(), 1);
    }

    #[test]
    fn poi_seen_flags_follow_the_cycle() {
        let mut p = Percept::new("cube_1");
        p.add_point_of_interest(PointOfInterest::new("ar_3"));
        p.set_point_of_interest_seen("ar_3");
        assert!(p.point_of_interest("ar_3").unwrap().is_seen());
        p.set_all_poi_unseen();
        assert!(!p.point_of_interest("ar_3").unwrap().is_seen());
    }
}
