use std::path::PathBuf;

use artrack_perception::OntologyError;
use thiserror::Error;

/// Everything that can stop the `artrack` binary before or between cycles.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to parse scenario {}: {source}", .path.display())]
    ScenarioParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error("Failed to encode world model: {0}")]
    Output(#[from] serde_json::Error),
}
