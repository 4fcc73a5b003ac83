//! `artrack-perception` – AR-tag perception for a robot world model.
//!
//! Turns fiducial-marker detections into persistent, symbolically identified
//! percepts with rigidly attached points of interest.
//!
//! # Modules
//!
//! - [`artrack`] – [`ArTrackPerception`][artrack::ArTrackPerception]: the
//!   per-cycle adapter from tracker messages to the percept table.
//! - [`transform`] – [`TransformService`][transform::TransformService] and
//!   [`TfEngine`][transform::TfEngine], a graph of named reference frames.
//! - [`agent`] – [`RobotAgent`][agent::RobotAgent]: head pose tracking and
//!   camera [`FieldOfView`][agent::FieldOfView].
//! - [`ontology`] – [`Ontology`][ontology::Ontology] lookups and an
//!   [`InMemoryOntology`][ontology::InMemoryOntology] loadable from TOML.
//! - [`percept`] – [`Percept`][percept::Percept] and
//!   [`PointOfInterest`][percept::PointOfInterest].
//! - [`config`] – typed module options.

pub mod agent;
pub mod artrack;
pub mod config;
pub mod ontology;
pub mod percept;
pub mod transform;

pub use agent::{Agent, FieldOfView, Head, RobotAgent};
pub use artrack::{ArTrackPerception, CycleOutcome, CycleStats, SkipReason};
pub use config::{ArTrackConfig, Parameter, ParameterError};
pub use ontology::{InMemoryOntology, Individual, Ontology, OntologyError};
pub use percept::{Percept, PointOfInterest};
pub use transform::{TfEngine, TransformService};
