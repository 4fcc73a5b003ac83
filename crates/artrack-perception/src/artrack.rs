//! AR-tag perception module.
//!
//! [`ArTrackPerception`] turns fiducial-marker detections into persistent
//! [`Percept`]s.  Every cycle receives the tracker's main marker poses and the
//! per-sub-marker visibility reports for one camera frame and:
//!
//! 1. **Validates** each visible marker: it must project inside the head's
//!    field of view and its confidence must be strictly below
//!    `min_track_err`.  A single bad sighting rejects its main marker for the
//!    cycle.
//! 2. **Updates entities**: unknown marker ids are resolved through the
//!    ontology (`hasArId → real#<id>`); ids without an individual are
//!    blacklisted for good.  Resolved markers overwrite their percept's pose.
//! 3. **Books visibility**: all percepts start the cycle unseen; valid
//!    sightings confirm them (attaching corner points of interest the first
//!    time), and any sighting at all confirms a percept that was missing for
//!    at most one earlier cycle.
//!
//! A cycle is dropped before touching anything when no robot is bound or the
//! robot's head is unlocated or moving.
//!
//! # Example
//!
//! ```rust
//! use artrack_perception::agent::{Agent, FieldOfView};
//! use artrack_perception::artrack::ArTrackPerception;
//! use artrack_perception::config::ArTrackConfig;
//! use artrack_perception::ontology::{InMemoryOntology, Individual};
//! use artrack_perception::transform::TfEngine;
//! use artrack_types::{MarkerDetection, Pose, PoseStamped, VisibleMarkerObservation};
//!
//! let onto = InMemoryOntology::from_individuals([Individual {
//!     id: "cube_1".into(),
//!     ar_id: Some(7),
//!     ..Default::default()
//! }]);
//! let mut tf = TfEngine::new();
//! tf.set_transform("map", "camera", Pose::identity());
//!
//! let mut module = ArTrackPerception::new(onto, tf, ArTrackConfig::default());
//! module.bind_agent(Agent::new("pr2", FieldOfView::default()).with_head(Pose::identity()));
//!
//! let pose = PoseStamped::new("/camera", chrono::Utc::now(), Pose::from_translation(0.0, 0.0, 1.0));
//! let markers = [MarkerDetection { id: 7, pose: pose.clone() }];
//! let visible = [VisibleMarkerObservation { id: 70, main_id: 7, pose, confidence: 0.05, size_cm: 10.0 }];
//!
//! assert!(module.process_cycle(&markers, &visible).is_processed());
//! let cube = module.percept("cube_1").unwrap();
//! assert!(cube.is_seen());
//! assert_eq!(cube.point_of_interest("ar_70").unwrap().points().len(), 5);
//! ```

use std::collections::{HashMap, HashSet};

use artrack_types::{
    Color, MarkerDetection, Pose, Shape, ShapeKind, Vec3, VisibleMarkerObservation,
};
use tracing::{debug, debug_span, error, warn};

use crate::agent::RobotAgent;
use crate::config::ArTrackConfig;
use crate::ontology::{HAS_AR_ID, Ontology, ar_id_literal};
use crate::percept::{Percept, PointOfInterest};
use crate::transform::TransformService;

/// Percepts missing for fewer consecutive cycles than this are confirmed by
/// any sighting of their marker, valid or not.
pub const UNSEEN_TOLERANCE_FRAMES: u32 = 2;

/// Scale given to markers whose individual has no shape in the ontology.
pub const DEFAULT_MARKER_SCALE: Vec3 = Vec3 {
    x: 0.05,
    y: 0.05,
    z: 0.003,
};

/// Id of the point of interest built from visible marker `id`.
pub fn poi_id(visible_marker_id: u32) -> String {
    format!("ar_{visible_marker_id}")
}

// ────────────────────────────────────────────────────────────────────────────
// Cycle outcome
// ────────────────────────────────────────────────────────────────────────────

/// Why a cycle was dropped without touching the world model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoAgent,
    /// The agent has no head, or its pose is unknown.
    HeadUnlocated,
    HeadMoved,
}

/// Counters describing what a processed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub valid_observations: usize,
    pub rejected_markers: usize,
    pub percepts_created: usize,
    pub markers_blacklisted: usize,
    pub poses_updated: usize,
    pub transform_failures: usize,
    pub points_of_interest_added: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Processed(CycleStats),
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, CycleOutcome::Processed(_))
    }

    pub fn stats(&self) -> Option<&CycleStats> {
        match self {
            CycleOutcome::Processed(stats) => Some(stats),
            CycleOutcome::Skipped(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ArTrackPerception
// ────────────────────────────────────────────────────────────────────────────

/// Perception module mapping AR markers to percepts.
///
/// The module owns its percept table, the marker → individual mapping and the
/// blacklist; nothing is shared, so a cycle needs `&mut self`.
pub struct ArTrackPerception<O, T, A> {
    ontology: O,
    transforms: T,
    agent: Option<A>,
    config: ArTrackConfig,
    percepts: HashMap<String, Percept>,
    ids: HashMap<u32, String>,
    blacklist: HashSet<u32>,
    /// `(main id, visible id)` pairs whose points of interest exist.
    markers_with_pois: HashSet<(u32, u32)>,
}

impl<O, T, A> ArTrackPerception<O, T, A>
where
    O: Ontology,
    T: TransformService,
    A: RobotAgent,
{
    /// Create a module with no robot bound; cycles are skipped until
    /// [`bind_agent`][Self::bind_agent] is called.
    pub fn new(ontology: O, transforms: T, config: ArTrackConfig) -> Self {
        Self {
            ontology,
            transforms,
            agent: None,
            config,
            percepts: HashMap::new(),
            ids: HashMap::new(),
            blacklist: HashSet::new(),
            markers_with_pois: HashSet::new(),
        }
    }

    pub fn bind_agent(&mut self, agent: A) {
        self.agent = Some(agent);
    }

    pub fn agent(&self) -> Option<&A> {
        self.agent.as_ref()
    }

    pub fn agent_mut(&mut self) -> Option<&mut A> {
        self.agent.as_mut()
    }

    pub fn transforms_mut(&mut self) -> &mut T {
        &mut self.transforms
    }

    pub fn ontology(&self) -> &O {
        &self.ontology
    }

    pub fn config(&self) -> &ArTrackConfig {
        &self.config
    }

    /// See [`ArTrackConfig::apply_parameter`].
    pub fn set_parameter(&mut self, name: &str, value: &str) -> bool {
        self.config.apply_parameter(name, value)
    }

    pub fn percepts(&self) -> &HashMap<String, Percept> {
        &self.percepts
    }

    pub fn percept(&self, id: &str) -> Option<&Percept> {
        self.percepts.get(id)
    }

    /// Individual bound to marker `marker_id`, if resolved.
    pub fn symbol_for(&self, marker_id: u32) -> Option<&str> {
        self.ids.get(&marker_id).map(String::as_str)
    }

    pub fn is_blacklisted(&self, marker_id: u32) -> bool {
        self.blacklist.contains(&marker_id)
    }

    pub fn blacklist(&self) -> &HashSet<u32> {
        &self.blacklist
    }

    /// Run one perception cycle over a synchronised pair of tracker messages.
    pub fn process_cycle(
        &mut self,
        markers: &[MarkerDetection],
        visible_markers: &[VisibleMarkerObservation],
    ) -> CycleOutcome {
        let span = debug_span!(
            "artrack_cycle",
            markers = markers.len(),
            visible = visible_markers.len()
        );
        let _enter = span.enter();

        if let Err(reason) = self.check_head() {
            debug!(?reason, "skipping cycle");
            return CycleOutcome::Skipped(reason);
        }

        let mut stats = CycleStats::default();
        let (valid, rejected) = self.validate(visible_markers);
        stats.valid_observations = valid.len();
        stats.rejected_markers = rejected.len();

        self.set_all_unseen();
        self.update_entities(markers, &rejected, &mut stats);

        for visible in valid {
            let Some(symbol) = self.ids.get(&visible.main_id).cloned() else {
                continue;
            };
            if !self.markers_with_pois.contains(&(visible.main_id, visible.id))
                && self.set_point_of_interest(&symbol, visible, &mut stats)
            {
                self.markers_with_pois.insert((visible.main_id, visible.id));
            }
            if let Some(percept) = self.percepts.get_mut(&symbol) {
                percept.set_point_of_interest_seen(&poi_id(visible.id));
                percept.set_seen();
            }
        }

        for visible in visible_markers {
            let Some(symbol) = self.ids.get(&visible.main_id) else {
                continue;
            };
            if let Some(percept) = self.percepts.get_mut(symbol)
                && percept.frames_unseen() < UNSEEN_TOLERANCE_FRAMES
            {
                percept.set_seen();
            }
        }

        debug!(?stats, "cycle processed");
        CycleOutcome::Processed(stats)
    }

    fn check_head(&self) -> Result<(), SkipReason> {
        let agent = self.agent.as_ref().ok_or(SkipReason::NoAgent)?;
        match agent.head() {
            Some(head) if head.is_located() => {
                if head.has_moved() {
                    Err(SkipReason::HeadMoved)
                } else {
                    Ok(())
                }
            }
            _ => Err(SkipReason::HeadUnlocated),
        }
    }

    /// Split sightings into valid ones and the set of rejected main ids.
    fn validate<'a>(
        &self,
        visible_markers: &'a [VisibleMarkerObservation],
    ) -> (Vec<&'a VisibleMarkerObservation>, HashSet<u32>) {
        let mut valid = Vec::new();
        let mut rejected = HashSet::new();

        for visible in visible_markers {
            let in_area = match self.transforms.transform_pose(
                &visible.pose,
                &self.config.reference_frame,
                self.config.transform_timeout,
            ) {
                Ok(pose) => self.is_in_valid_area(pose),
                Err(e) => {
                    error!(marker_id = visible.main_id, visible_id = visible.id, error = %e, "cannot place visible marker");
                    false
                }
            };

            if in_area && visible.confidence < self.config.min_track_err {
                valid.push(visible);
            } else {
                rejected.insert(visible.main_id);
            }
        }

        (valid, rejected)
    }

    fn is_in_valid_area(&self, pose: Pose) -> bool {
        self.agent.as_ref().is_some_and(|agent| agent.can_see(pose))
    }

    fn update_entities(
        &mut self,
        markers: &[MarkerDetection],
        rejected: &HashSet<u32>,
        stats: &mut CycleStats,
    ) {
        for marker in markers {
            if self.blacklist.contains(&marker.id) || rejected.contains(&marker.id) {
                continue;
            }

            let known = self.percepts.len();
            let symbol = match self.ids.get(&marker.id) {
                Some(symbol) => symbol.clone(),
                None => match self.create_new_entity(marker.id) {
                    Some(symbol) => {
                        if self.percepts.len() > known {
                            stats.percepts_created += 1;
                        }
                        symbol
                    }
                    None => {
                        stats.markers_blacklisted += 1;
                        continue;
                    }
                },
            };

            let to_reference = self.transforms.lookup_transform(
                &self.config.reference_frame,
                marker.pose.normalized_frame_id(),
                marker.pose.stamp,
                self.config.transform_timeout,
            );
            match to_reference {
                Ok(tf) => {
                    if let Some(percept) = self.percepts.get_mut(&symbol) {
                        percept.update_pose(tf.compose(marker.pose.pose.normalized()));
                        stats.poses_updated += 1;
                    }
                }
                Err(e) => {
                    stats.transform_failures += 1;
                    error!(marker_id = marker.id, error = %e, "cannot update marker pose");
                }
            }
        }
    }

    /// Resolve `marker_id` and create its percept unless the individual
    /// already has one.  Blacklists the id when no individual carries it.
    fn create_new_entity(&mut self, marker_id: u32) -> Option<String> {
        let individuals = self
            .ontology
            .individuals_with_relation(HAS_AR_ID, &ar_id_literal(marker_id));
        let Some(symbol) = individuals.into_iter().next() else {
            self.blacklist.insert(marker_id);
            warn!(marker_id, "marker was added to the blacklist");
            return None;
        };

        self.ids.insert(marker_id, symbol.clone());
        if self.percepts.contains_key(&symbol) {
            // Another tag on the same individual already created it.
            debug!(marker_id, entity = %symbol, "marker bound to existing percept");
            return Some(symbol);
        }

        let mut shape = self.ontology.entity_shape(&symbol);
        if shape.kind == ShapeKind::None {
            shape = Shape {
                kind: ShapeKind::Cube,
                color: self.ontology.entity_color(&symbol, Color::red()),
                scale: DEFAULT_MARKER_SCALE,
            };
        }

        let mut percept = Percept::new(symbol.clone());
        percept.set_shape(shape);
        percept.set_mass(self.ontology.entity_mass(&symbol));
        debug!(marker_id, entity = %symbol, "created percept");

        self.percepts.insert(symbol.clone(), percept);
        Some(symbol)
    }

    fn set_all_unseen(&mut self) {
        for percept in self.percepts.values_mut() {
            percept.set_all_poi_unseen();
            percept.set_unseen();
        }
    }

    /// Attach the centre and corners of `visible` to percept `symbol`.
    ///
    /// Returns `true` once the percept carries the point of interest, whether
    /// it was added now or earlier.
    fn set_point_of_interest(
        &mut self,
        symbol: &str,
        visible: &VisibleMarkerObservation,
        stats: &mut CycleStats,
    ) -> bool {
        let Some(object_pose) = self.percepts.get(symbol).and_then(Percept::pose) else {
            return false;
        };
        let id = poi_id(visible.id);
        if self
            .percepts
            .get(symbol)
            .is_some_and(|p| p.has_point_of_interest(&id))
        {
            return true;
        }

        let marker_pose = match self.transforms.transform_pose(
            &visible.pose,
            &self.config.reference_frame,
            self.config.transform_timeout,
        ) {
            Ok(pose) => pose,
            Err(e) => {
                error!(marker_id = visible.main_id, visible_id = visible.id, error = %e, "cannot place marker corners");
                return false;
            }
        };

        let half_size = visible.size_cm / 100.0 / 2.0;
        let corners = [
            (0.0, 0.0),
            (-half_size, -half_size),
            (half_size, -half_size),
            (half_size, half_size),
            (-half_size, half_size),
        ];

        let marker_in_object = marker_pose.transform_in(object_pose);
        let mut poi = PointOfInterest::new(id);
        for (x, y) in corners {
            poi.add_point(marker_in_object.compose(Pose::from_translation(x, y, 0.0)));
        }

        if let Some(percept) = self.percepts.get_mut(symbol)
            && percept.add_point_of_interest(poi)
        {
            stats.points_of_interest_added += 1;
        }
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
