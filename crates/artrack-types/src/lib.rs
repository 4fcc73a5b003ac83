//! `artrack-types` – shared vocabulary of the ArTrack workspace.
//!
//! Geometry primitives live in [`geometry`]; this module holds the tracker
//! messages the perception adapter consumes, the shape attributes it attaches
//! to percepts, and the error type of the transform layer.

pub mod geometry;

pub use geometry::{Pose, Quaternion, Vec3};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Strip the legacy leading `/` some producers put in front of frame ids.
///
/// Only a single slash is removed: `"/camera"` → `"camera"`.
pub fn normalize_frame_id(frame_id: &str) -> &str {
    frame_id.strip_prefix('/').unwrap_or(frame_id)
}

/// A pose tagged with the frame it is expressed in and its acquisition time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    /// e.g. `"camera_optical"` or the legacy `"/camera_optical"`.
    pub frame_id: String,
    #[serde(default = "Utc::now")]
    pub stamp: DateTime<Utc>,
    pub pose: Pose,
}

impl PoseStamped {
    pub fn new(frame_id: impl Into<String>, stamp: DateTime<Utc>, pose: Pose) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            pose,
        }
    }

    /// The frame id without its legacy leading slash.
    pub fn normalized_frame_id(&self) -> &str {
        normalize_frame_id(&self.frame_id)
    }
}

/// Main pose of a physical fiducial tag as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    pub pose: PoseStamped,
}

/// A confidence-annotated sighting of one of a tag's sub-markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleMarkerObservation {
    /// Sub-marker id, unique across the tracker's bundle configuration.
    pub id: u32,
    /// Id of the [`MarkerDetection`] this sighting belongs to.
    pub main_id: u32,
    pub pose: PoseStamped,
    /// Tracking error estimate; lower is better.
    pub confidence: f32,
    /// Edge length of the printed marker in centimetres.
    pub size_cm: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Shape attributes
// ────────────────────────────────────────────────────────────────────────────

/// Geometric primitive used to render or collide with a percept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// No shape information is known.
    #[default]
    None,
    Cube,
    Sphere,
    Cylinder,
    /// Mesh resource, e.g. `"package://objects/mug.dae"`.
    Mesh(String),
}

/// RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    pub fn red() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.8, 0.8, 0.8)
    }
}

/// Visual/collision description of a percept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub color: Color,
    /// Extent along each axis (metres).
    pub scale: Vec3,
}

impl Shape {
    /// True when the shape carries no geometric information.
    pub fn is_none(&self) -> bool {
        self.kind == ShapeKind::None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Failures of a transform lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("frame \"{0}\" does not exist in the transform tree")]
    UnknownFrame(String),

    #[error("no transform path from \"{source_frame}\" to \"{target_frame}\"")]
    NoPath {
        target_frame: String,
        source_frame: String,
    },
}
