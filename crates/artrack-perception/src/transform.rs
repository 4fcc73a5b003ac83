//! Transform Frame (TF) service.
//!
//! [`TransformService`] is the interface the perception adapter uses to move
//! poses between reference frames.  [`TfEngine`] is an in-process
//! implementation: a graph of named frames and the rigid-body transforms that
//! relate them.  Given any two frame names the engine composes a chain of
//! transforms via BFS.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use artrack_perception::transform::{TfEngine, TransformService};
//! use artrack_types::Pose;
//!
//! let mut tf = TfEngine::new();
//!
//! // base_link is 1 m forward of the map origin, camera 0.5 m further.
//! tf.set_transform("map", "base_link", Pose::from_translation(1.0, 0.0, 0.0));
//! tf.set_transform("base_link", "/camera", Pose::from_translation(0.5, 0.0, 0.0));
//!
//! let t = tf
//!     .lookup_transform("map", "camera", chrono::Utc::now(), Duration::from_secs(1))
//!     .unwrap();
//! assert!((t.position.x - 1.5).abs() < 1e-5);
//!
//! // Edges can be walked backwards too.
//! let back = tf
//!     .lookup_transform("camera", "map", chrono::Utc::now(), Duration::from_secs(1))
//!     .unwrap();
//! assert!((back.position.x + 1.5).abs() < 1e-5);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use artrack_types::{Pose, PoseStamped, TransformError, normalize_frame_id};
use chrono::{DateTime, Utc};

// ────────────────────────────────────────────────────────────────────────────
// TransformService
// ────────────────────────────────────────────────────────────────────────────

/// Frame-to-frame pose conversion.
///
/// Implementations may block up to `timeout` waiting for transform data; an
/// unavailable transform is reported as a [`TransformError`], never a panic.
pub trait TransformService {
    /// Pose of `source_frame` expressed in `target_frame` at `stamp`.
    ///
    /// Composing the result with a pose given in `source_frame` yields that
    /// pose in `target_frame`.
    fn lookup_transform(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Pose, TransformError>;

    /// Re-express a stamped pose in `target_frame`.  The pose's orientation
    /// is normalised first.
    fn transform_pose(
        &self,
        pose: &PoseStamped,
        target_frame: &str,
        timeout: Duration,
    ) -> Result<Pose, TransformError> {
        let to_target =
            self.lookup_transform(target_frame, pose.normalized_frame_id(), pose.stamp, timeout)?;
        Ok(to_target.compose(pose.pose.normalized()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TfEngine
// ────────────────────────────────────────────────────────────────────────────

/// A graph of named reference frames and the [`Pose`]s that relate them.
///
/// Frames are identified by string names (e.g. `"map"`, `"base_link"`,
/// `"camera_optical"`); a leading `/` is stripped on every call.  Registering
/// `"A" → "B"` also makes the inverse `"B" → "A"` available.
///
/// The engine only keeps the latest value of every edge, so lookups answer
/// immediately regardless of the requested stamp and timeout.
#[derive(Debug, Default)]
pub struct TfEngine {
    /// `edges[from][to]` = pose of `to` expressed in `from`.
    edges: HashMap<String, HashMap<String, Pose>>,
}

impl TfEngine {
    /// Create an empty TF engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or update the pose of `child_frame` relative to
    /// `parent_frame`.
    pub fn set_transform(&mut self, parent_frame: &str, child_frame: &str, transform: Pose) {
        let parent = normalize_frame_id(parent_frame).to_string();
        let child = normalize_frame_id(child_frame).to_string();
        self.edges
            .entry(child.clone())
            .or_default()
            .insert(parent.clone(), transform.inverse());
        self.edges.entry(parent).or_default().insert(child, transform);
    }

    /// Compose the path from `target_frame` to `source_frame`.
    pub fn lookup(&self, target_frame: &str, source_frame: &str) -> Result<Pose, TransformError> {
        let target = normalize_frame_id(target_frame);
        let source = normalize_frame_id(source_frame);

        if target == source {
            return Ok(Pose::identity());
        }
        for frame in [target, source] {
            if !self.edges.contains_key(frame) {
                return Err(TransformError::UnknownFrame(frame.to_string()));
            }
        }

        // BFS; each queue item carries the pose accumulated from target to the
        // current node.
        let mut queue: VecDeque<(&str, Pose)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();

        queue.push_back((target, Pose::identity()));
        visited.insert(target);

        while let Some((current, accumulated)) = queue.pop_front() {
            let Some(neighbours) = self.edges.get(current) else {
                continue;
            };
            for (next, edge) in neighbours {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                let composed = accumulated.compose(*edge);
                if next == source {
                    return Ok(composed);
                }
                queue.push_back((next.as_str(), composed));
            }
        }

        Err(TransformError::NoPath {
            target_frame: target.to_string(),
            source_frame: source.to_string(),
        })
    }
}

impl TransformService for TfEngine {
    fn lookup_transform(
        &self,
        target_frame: &str,
        source_frame: &str,
        _stamp: DateTime<Utc>,
        _timeout: Duration,
    ) -> Result<Pose, TransformError> {
        self.lookup(target_frame, source_frame)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
