//! Symbolic knowledge about the objects markers are glued to.
//!
//! The adapter asks the [`Ontology`] which individual carries a given AR id
//! (`hasArId → real#<id>`) and what that individual looks like.
//! [`InMemoryOntology`] answers from tables that can be filled in code or
//! loaded from TOML:
//!
//! ```toml
//! [[individual]]
//! id = "cube_1"
//! ar_id = 7
//! shape = "cube"
//! color = [0.0, 0.0, 1.0]
//! scale = [0.1, 0.1, 0.1]
//! mass = 0.25
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use artrack_types::{Color, Shape, ShapeKind, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relation linking an individual to the AR marker printed on it.
pub const HAS_AR_ID: &str = "hasArId";

/// Literal value stored under [`HAS_AR_ID`] for marker `id`.
pub fn ar_id_literal(id: u32) -> String {
    format!("real#{id}")
}

/// Read access to a knowledge base.
pub trait Ontology {
    /// Individuals `i` such that `(i, relation, value)` holds.
    fn individuals_with_relation(&self, relation: &str, value: &str) -> Vec<String>;

    /// Shape of `id`; [`ShapeKind::None`] when nothing is known.
    fn entity_shape(&self, id: &str) -> Shape;

    /// Color of `id`, or `default` when unspecified.
    fn entity_color(&self, id: &str, default: Color) -> Color;

    /// Mass of `id` in kilograms; 0 when unknown.
    fn entity_mass(&self, id: &str) -> f32;
}

/// Errors raised while loading an ontology file.
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Failed to read ontology at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse ontology: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Description of one individual, as written in an ontology file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    #[serde(default)]
    pub ar_id: Option<u32>,
    #[serde(default)]
    pub shape: Option<ShapeKind>,
    #[serde(default)]
    pub color: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub mass: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OntologyFile {
    #[serde(default, rename = "individual")]
    individuals: Vec<Individual>,
}

/// Knowledge base held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryOntology {
    /// `relations[relation][value]` = individuals, in insertion order.
    relations: HashMap<String, HashMap<String, Vec<String>>>,
    individuals: HashMap<String, Individual>,
}

impl InMemoryOntology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `[[individual]]` tables.
    pub fn from_toml_str(raw: &str) -> Result<Self, OntologyError> {
        let file: OntologyFile = toml::from_str(raw)?;
        Ok(Self::from_individuals(file.individuals))
    }

    /// Load an ontology file from disk.
    pub fn load(path: &Path) -> Result<Self, OntologyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OntologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_individuals(individuals: impl IntoIterator<Item = Individual>) -> Self {
        let mut onto = Self::new();
        for individual in individuals {
            onto.insert(individual);
        }
        onto
    }

    /// Add or replace an individual.  An `ar_id` also registers the
    /// [`HAS_AR_ID`] relation; a replaced individual's old `ar_id` relation
    /// is removed.
    pub fn insert(&mut self, individual: Individual) {
        let previous = self.individuals.get(&individual.id).and_then(|i| i.ar_id);
        if let Some(old_ar_id) = previous
            && individual.ar_id != previous
        {
            self.remove_relation(&individual.id, HAS_AR_ID, &ar_id_literal(old_ar_id));
        }
        if let Some(ar_id) = individual.ar_id {
            self.add_relation(&individual.id, HAS_AR_ID, &ar_id_literal(ar_id));
        }
        self.individuals.insert(individual.id.clone(), individual);
    }

    /// Assert `(individual, relation, value)`.
    pub fn add_relation(&mut self, individual: &str, relation: &str, value: &str) {
        let subjects = self
            .relations
            .entry(relation.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default();
        if !subjects.iter().any(|s| s == individual) {
            subjects.push(individual.to_string());
        }
    }

    /// Retract `(individual, relation, value)`.
    pub fn remove_relation(&mut self, individual: &str, relation: &str, value: &str) {
        let Some(values) = self.relations.get_mut(relation) else {
            return;
        };
        if let Some(subjects) = values.get_mut(value) {
            subjects.retain(|s| s != individual);
            if subjects.is_empty() {
                values.remove(value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }
}

impl Ontology for InMemoryOntology {
    fn individuals_with_relation(&self, relation: &str, value: &str) -> Vec<String> {
        self.relations
            .get(relation)
            .and_then(|values| values.get(value))
            .cloned()
            .unwrap_or_default()
    }

    fn entity_shape(&self, id: &str) -> Shape {
        let Some(individual) = self.individuals.get(id) else {
            return Shape::default();
        };
        match &individual.shape {
            Some(kind) if *kind != ShapeKind::None => Shape {
                kind: kind.clone(),
                color: self.entity_color(id, Color::default()),
                scale: individual
                    .scale
                    .map(|[x, y, z]| Vec3::new(x, y, z))
                    .unwrap_or(Vec3::new(1.0, 1.0, 1.0)),
            },
            _ => Shape::default(),
        }
    }

    fn entity_color(&self, id: &str, default: Color) -> Color {
        self.individuals
            .get(id)
            .and_then(|i| i.color)
            .map(|[r, g, b]| Color::new(r, g, b))
            .unwrap_or(default)
    }

    fn entity_mass(&self, id: &str) -> f32 {
        self.individuals
            .get(id)
            .and_then(|i| i.mass)
            .unwrap_or(0.0)
    }
}
