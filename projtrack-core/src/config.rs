use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::RecordStore;

pub const DEFAULT_PROJECTS_FILE: &str = "DB/projects.csv";
pub const DEFAULT_TASKS_FILE: &str = "DB/tasks.csv";

/// Where the two stores live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub projects_file: PathBuf,
    pub tasks_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            projects_file: PathBuf::from(DEFAULT_PROJECTS_FILE),
            tasks_file: PathBuf::from(DEFAULT_TASKS_FILE),
        }
    }
}

impl StoreConfig {
    /// Reads a config file. Keys it leaves out keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Resolves the config for this run.
    ///
    /// An explicit path must exist. Without one the per-user config file is
    /// read when present, and the defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides on top of the loaded values
    pub fn with_overrides(
        mut self,
        projects_file: Option<PathBuf>,
        tasks_file: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = projects_file {
            self.projects_file = path;
        }
        if let Some(path) = tasks_file {
            self.tasks_file = path;
        }
        self
    }

    pub fn projects(&self) -> RecordStore {
        RecordStore::projects(&self.projects_file)
    }

    pub fn tasks(&self) -> RecordStore {
        RecordStore::tasks(&self.tasks_file)
    }
}

/// `<config dir>/projtrack/config.yaml`, when the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("projtrack").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.projects_file, PathBuf::from("DB/projects.csv"));
        assert_eq!(config.tasks_file, PathBuf::from("DB/tasks.csv"));
        assert_eq!(config.projects().path(), Path::new("DB/projects.csv"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "tasks_file: /data/tasks.csv\n").unwrap();

        let config = StoreConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.projects_file, PathBuf::from(DEFAULT_PROJECTS_FILE));
        assert_eq!(config.tasks_file, PathBuf::from("/data/tasks.csv"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        let err = StoreConfig::load(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_bad_yaml_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "projects_file: [unclosed\n").unwrap();
        assert!(StoreConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "projects_file: a.csv\ntasks_file: b.csv\n").unwrap();

        let config = StoreConfig::from_file(&path)
            .unwrap()
            .with_overrides(Some("p.csv".into()), None);
        assert_eq!(config.projects_file, PathBuf::from("p.csv"));
        assert_eq!(config.tasks_file, PathBuf::from("b.csv"));
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), StoreConfig::default());
    }
}
