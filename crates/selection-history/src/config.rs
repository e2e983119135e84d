#![forbid(unsafe_code)]

//! Configuration for a selection-history session.
//!
//! Loadable from TOML or JSON; every field has a default, so partial files
//! work.
//!
//! ```toml
//! # selection-history.toml
//! max_depth = 64
//! workspace_root = "/home/me/project"
//! store_path = "/home/me/.local/state/selection-history.json"
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_file("selection-history.toml")?;
//! let config = HistoryConfig::from_json_str(json)?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persistence::workspace_key;
use crate::stack::MAX_DEPTH;

/// Default prefix of the persisted-history key.
pub const DEFAULT_KEY_NAMESPACE: &str = "selection-history";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Snapshots retained per direction. At most [`MAX_DEPTH`].
    pub max_depth: usize,

    /// Root of the workspace whose history this is. Scopes the store key so
    /// unrelated workspaces never share history.
    pub workspace_root: PathBuf,

    /// JSON file backing the store. `None` keeps history in memory only.
    pub store_path: Option<PathBuf>,

    /// Prefix of the store key.
    pub key_namespace: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            workspace_root: PathBuf::from("."),
            store_path: None,
            key_namespace: DEFAULT_KEY_NAMESPACE.to_owned(),
        }
    }
}

impl HistoryConfig {
    /// Default configuration for the given workspace.
    #[must_use]
    pub fn for_workspace(root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: root.into(),
            ..Self::default()
        }
    }

    /// Set the per-direction depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Back the store with a JSON file.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the store key prefix.
    #[must_use]
    pub fn with_key_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.key_namespace = namespace.into();
        self
    }

    /// The store key for this workspace.
    #[must_use]
    pub fn workspace_key(&self) -> String {
        workspace_key(&self.key_namespace, &self.workspace_root)
    }

    /// Parse from a TOML string.
    ///
    /// Not validated: call [`validate`](Self::validate) or
    /// [`validated`](Self::validated) before use. Out-of-range depths are
    /// still capped at [`MAX_DEPTH`] by the history stacks.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from a JSON string. Not validated, like
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a TOML file on disk. Not validated.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON file on disk. Not validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load from a file, choosing the format by extension (`.json`, else
    /// TOML), and validate the result.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validated()
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_depth == 0 || self.max_depth > MAX_DEPTH {
            errors.push(format!(
                "max_depth must be in 1..={MAX_DEPTH}, got {}",
                self.max_depth
            ));
        }

        if self.key_namespace.trim().is_empty() {
            errors.push("key_namespace must not be empty".into());
        }

        if self.workspace_root.as_os_str().is_empty() {
            errors.push("workspace_root must not be empty".into());
        }

        errors
    }

    /// `self` if valid, otherwise [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_depth, MAX_DEPTH);
        assert!(config.store_path.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HistoryConfig::from_toml_str("max_depth = 16\n").unwrap();
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.key_namespace, DEFAULT_KEY_NAMESPACE);
    }

    #[test]
    fn json_round_trip() {
        let config = HistoryConfig::for_workspace("/work/a")
            .with_max_depth(8)
            .with_store_path("/tmp/h.json");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(HistoryConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn depth_out_of_range_rejected() {
        let errors = HistoryConfig::default().with_max_depth(0).validate();
        assert_eq!(errors.len(), 1);
        let errors = HistoryConfig::default()
            .with_max_depth(MAX_DEPTH + 1)
            .validate();
        assert!(errors[0].contains("max_depth"));
    }

    #[test]
    fn empty_namespace_rejected() {
        let result = HistoryConfig::default().with_key_namespace(" ").validated();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn malformed_toml_is_error() {
        assert!(matches!(
            HistoryConfig::from_toml_str("max_depth = ["),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("history.toml");
        std::fs::write(&toml_path, "max_depth = 12\n").unwrap();
        assert_eq!(HistoryConfig::from_file(&toml_path).unwrap().max_depth, 12);

        let json_path = dir.path().join("history.json");
        std::fs::write(&json_path, r#"{"max_depth": 500}"#).unwrap();
        assert!(matches!(
            HistoryConfig::from_file(&json_path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn workspace_key_includes_root() {
        let a = HistoryConfig::for_workspace("/work/a").workspace_key();
        let b = HistoryConfig::for_workspace("/work/b").workspace_key();
        assert_ne!(a, b);
        assert!(a.starts_with(DEFAULT_KEY_NAMESPACE));
    }

    #[test]
    fn string_loaders_leave_validation_to_caller() {
        let config = HistoryConfig::from_toml_str("max_depth = 1000\n").unwrap();
        assert_eq!(config.max_depth, 1000);
        assert_eq!(config.validate().len(), 1);
        assert!(matches!(
            HistoryConfig::from_json_str(r#"{"max_depth": 0}"#)
                .unwrap()
                .validated(),
            Err(ConfigError::Validation(_))
        ));
    }
}
