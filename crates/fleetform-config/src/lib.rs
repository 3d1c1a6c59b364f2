pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project file name
pub const PROJECT_FILE: &str = "Fleetform.yaml";

/// Directory holding state and, optionally, the project file
pub const STATE_DIR_NAME: &str = ".fleetform";

/// Stack used when neither the CLI nor the project names one
pub const DEFAULT_STACK: &str = "dev";

/// Contents of `Fleetform.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A loaded project and the directory it lives in
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

/// Locate the project file
///
/// Search order:
/// 1. FLEETFORM_PROJECT_PATH environment variable (direct path)
/// 2. `<start_dir>/Fleetform.yaml`
/// 3. `<start_dir>/.fleetform/Fleetform.yaml`
pub fn find_project_file(start_dir: &Path) -> Result<PathBuf> {
    if let Ok(project_path) = std::env::var("FLEETFORM_PROJECT_PATH") {
        let path = PathBuf::from(project_path);
        if path.exists() {
            debug!(path = %path.display(), "Using FLEETFORM_PROJECT_PATH");
            return Ok(path);
        }
    }

    let candidates = [
        start_dir.join(PROJECT_FILE),
        start_dir.join(STATE_DIR_NAME).join(PROJECT_FILE),
    ];
    for path in candidates {
        if path.exists() {
            debug!(path = %path.display(), "Found project file");
            return Ok(path);
        }
    }

    Err(ConfigError::ProjectFileNotFound(start_dir.to_path_buf()))
}

/// Parse a project file; the root is the directory that owns it
pub fn load_project(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_yaml::from_str(&content)?;

    let invalid = |reason: &str| ConfigError::InvalidProject {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if config.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    let bad_name = |name: &str| name.is_empty() || name.contains([':', '/', '\\']);
    if bad_name(config.name.as_str()) || config.stack.as_deref().is_some_and(bad_name) {
        return Err(invalid("names must not be empty or contain ':' or a path separator"));
    }

    let mut root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if root.file_name().is_some_and(|n| n == STATE_DIR_NAME) {
        root.pop();
    }

    Ok(Project { root, config })
}

impl Project {
    pub fn discover(start_dir: &Path) -> Result<Self> {
        load_project(&find_project_file(start_dir)?)
    }

    /// Like [`Project::discover`], but an absent project file yields a
    /// project named `default_name` rooted at `start_dir`
    pub fn discover_or_default(start_dir: &Path, default_name: &str) -> Result<Self> {
        match Self::discover(start_dir) {
            Ok(project) => Ok(project),
            Err(ConfigError::ProjectFileNotFound(_)) => {
                debug!("No project file, using defaults");
                Ok(Self {
                    root: start_dir.to_path_buf(),
                    config: ProjectConfig {
                        name: default_name.to_string(),
                        description: None,
                        stack: None,
                    },
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Requested stack, then the project default, then [`DEFAULT_STACK`]
    pub fn resolve_stack(&self, requested: Option<&str>) -> String {
        requested
            .or(self.config.stack.as_deref())
            .unwrap_or(DEFAULT_STACK)
            .to_string()
    }

    /// FLEETFORM_STATE_DIR, or `.fleetform` under the project root
    pub fn state_dir(&self) -> PathBuf {
        match std::env::var("FLEETFORM_STATE_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.root.join(STATE_DIR_NAME),
        }
    }
}
