use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Project file not found. Looked in:\n\
        - FLEETFORM_PROJECT_PATH\n\
        - {0}/Fleetform.yaml\n\
        - {0}/.fleetform/Fleetform.yaml"
    )]
    ProjectFileNotFound(PathBuf),

    #[error("Invalid project file {path}: {reason}")]
    InvalidProject { path: PathBuf, reason: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
