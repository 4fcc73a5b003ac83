//! Scenario replay: feeds recorded tracker cycles through the perception
//! module.
//!
//! A scenario is a JSON document:
//!
//! ```json
//! {
//!   "agent": { "id": "pr2", "head_pose": { ... } },
//!   "ontology": "objects.toml",
//!   "transforms": [ { "parent": "map", "child": "camera", "pose": { ... } } ],
//!   "cycles": [
//!     { "markers": [ ... ], "visible_markers": [ ... ] }
//!   ]
//! }
//! ```
//!
//! The ontology path is resolved relative to the scenario file.  Each cycle
//! may move the head and update transforms before its messages are delivered;
//! a cycle without `head_pose` holds the head where it was.

use std::path::{Path, PathBuf};

use artrack_perception::{
    Agent, ArTrackConfig, ArTrackPerception, CycleOutcome, FieldOfView, Head, InMemoryOntology,
    Individual, RobotAgent, TfEngine,
};
use artrack_types::{MarkerDetection, Pose, VisibleMarkerObservation};
use serde::Deserialize;
use tracing::info;

use crate::error::CliError;

pub type Module = ArTrackPerception<InMemoryOntology, TfEngine, Agent>;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    #[serde(default)]
    pub field_of_view: FieldOfView,
    /// Initial head pose; the robot starts headless when absent.
    #[serde(default)]
    pub head_pose: Option<Pose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformSpec {
    pub parent: String,
    pub child: String,
    pub pose: Pose,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CycleSpec {
    #[serde(default)]
    pub head_pose: Option<Pose>,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    #[serde(default)]
    pub markers: Vec<MarkerDetection>,
    #[serde(default)]
    pub visible_markers: Vec<VisibleMarkerObservation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub agent: AgentSpec,
    /// Ontology file, relative to the scenario file.
    #[serde(default)]
    pub ontology: Option<PathBuf>,
    /// Individuals added on top of the ontology file.
    #[serde(default)]
    pub individuals: Vec<Individual>,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    #[serde(default)]
    pub cycles: Vec<CycleSpec>,
}

impl Scenario {
    pub fn from_json(raw: &str, path: &Path) -> Result<Self, CliError> {
        serde_json::from_str(raw).map_err(|source| CliError::ScenarioParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, path)
    }

    /// Build the ontology: `override_path` wins over the scenario's own file;
    /// inline individuals are added last.
    pub fn build_ontology(
        &self,
        scenario_dir: &Path,
        override_path: Option<&Path>,
    ) -> Result<InMemoryOntology, CliError> {
        let file = match (override_path, &self.ontology) {
            (Some(path), _) => Some(path.to_path_buf()),
            (None, Some(relative)) => Some(scenario_dir.join(relative)),
            (None, None) => None,
        };
        let mut onto = match file {
            Some(path) => InMemoryOntology::load(&path)?,
            None => InMemoryOntology::new(),
        };
        for individual in &self.individuals {
            onto.insert(individual.clone());
        }
        Ok(onto)
    }
}

/// Build the module described by `scenario` and run every cycle through it.
pub fn replay(
    scenario: &Scenario,
    ontology: InMemoryOntology,
    config: ArTrackConfig,
) -> (Module, Vec<CycleOutcome>) {
    let mut tf = TfEngine::new();
    for t in &scenario.transforms {
        tf.set_transform(&t.parent, &t.child, t.pose);
    }

    let mut module = ArTrackPerception::new(ontology, tf, config);
    let mut agent = Agent::new(scenario.agent.id.clone(), scenario.agent.field_of_view);
    if let Some(pose) = scenario.agent.head_pose {
        agent = agent.with_head(pose);
    }
    module.bind_agent(agent);

    let mut outcomes = Vec::with_capacity(scenario.cycles.len());
    for (index, cycle) in scenario.cycles.iter().enumerate() {
        if let Some(agent) = module.agent_mut() {
            let current = agent.head().and_then(Head::pose);
            if let Some(pose) = cycle.head_pose.or(current) {
                agent.set_head_pose(pose);
            }
        }
        for t in &cycle.transforms {
            module.transforms_mut().set_transform(&t.parent, &t.child, t.pose);
        }

        let outcome = module.process_cycle(&cycle.markers, &cycle.visible_markers);
        info!(cycle = index, processed = outcome.is_processed(), "replayed cycle");
        outcomes.push(outcome);
    }

    (module, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artrack_perception::SkipReason;

    const SCENARIO: &str = r#"{
        "agent": {
            "id": "pr2",
            "head_pose": {
                "position": {"x": 0.0, "y": 0.0, "z": 0.0},
                "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}
            }
        },
        "individuals": [ { "id": "cube_1", "ar_id": 7 } ],
        "transforms": [
            {
                "parent": "map", "child": "/camera",
                "pose": {
                    "position": {"x": 0.0, "y": 0.0, "z": 0.0},
                    "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}
                }
            }
        ],
        "cycles": [
            {
                "markers": [ {
                    "id": 7,
                    "pose": { "frame_id": "/camera", "pose": {
                        "position": {"x": 0.0, "y": 0.0, "z": 1.0},
                        "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0} } }
                } ],
                "visible_markers": [ {
                    "id": 70, "main_id": 7, "confidence": 0.05, "size_cm": 10.0,
                    "pose": { "frame_id": "/camera", "pose": {
                        "position": {"x": 0.0, "y": 0.0, "z": 1.0},
                        "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0} } }
                } ]
            },
            {
                "head_pose": {
                    "position": {"x": 0.3, "y": 0.0, "z": 0.0},
                    "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}
                },
                "markers": [ {
                    "id": 42,
                    "pose": { "frame_id": "camera", "pose": {
                        "position": {"x": 0.0, "y": 0.0, "z": 1.0},
                        "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0} } }
                } ]
            },
            {
                "markers": [ {
                    "id": 42,
                    "pose": { "frame_id": "camera", "pose": {
                        "position": {"x": 0.0, "y": 0.0, "z": 1.0},
                        "orientation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0} } }
                } ]
            }
        ]
    }"#;

    #[test]
    fn replay_runs_every_cycle() {
        let scenario = Scenario::from_json(SCENARIO, Path::new("inline.json")).unwrap();
        let onto = scenario.build_ontology(Path::new("."), None).unwrap();
        let (module, outcomes) = replay(&scenario, onto, ArTrackConfig::default());

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_processed());
        assert_eq!(outcomes[1], CycleOutcome::Skipped(SkipReason::HeadMoved));
        assert!(outcomes[2].is_processed(), "head settled again");

        let cube = module.percept("cube_1").unwrap();
        assert!(cube.has_point_of_interest("ar_70"));
        assert!(module.is_blacklisted(42));
    }

    #[test]
    fn ontology_file_is_resolved_next_to_scenario() {
        let dir = tempfile::tempdir().expect("tmp dir");
        std::fs::write(
            dir.path().join("objects.toml"),
            "[[individual]]\nid = \"mug\"\nar_id = 42\n",
        )
        .expect("write ontology");

        let mut scenario = Scenario::from_json(SCENARIO, Path::new("inline.json")).unwrap();
        scenario.ontology = Some(PathBuf::from("objects.toml"));
        let onto = scenario.build_ontology(dir.path(), None).unwrap();
        assert_eq!(onto.len(), 2, "file individuals plus inline ones");

        let (module, _) = replay(&scenario, onto, ArTrackConfig::default());
        assert_eq!(module.symbol_for(42), Some("mug"));
    }

    #[test]
    fn missing_ontology_override_is_an_error() {
        let scenario = Scenario::from_json(SCENARIO, Path::new("inline.json")).unwrap();
        let err = scenario
            .build_ontology(Path::new("."), Some(Path::new("/definitely/not/here.toml")))
            .unwrap_err();
        assert!(matches!(err, CliError::Ontology(_)));
    }

    #[test]
    fn malformed_scenario_names_the_file() {
        let err = Scenario::from_json("{ \"cycles\": [] }", Path::new("broken.json")).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn load_reads_scenario_from_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, SCENARIO).expect("write");
        let scenario = Scenario::load(&path).expect("load");
        assert_eq!(scenario.cycles.len(), 3);
        assert!(matches!(
            Scenario::load(&dir.path().join("missing.json")),
            Err(CliError::Io { .. })
        ));
    }
}
