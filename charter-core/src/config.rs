use std::path::Path;

use charter_graphs::ReferencePolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default configuration file name, looked up next to the index.
pub const CONFIG_FILE_NAME: &str = "charter.toml";

/// Top-level Charter configuration, matching `charter.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharterConfig {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Which non-definition occurrences are treated as call sites.
    pub reference_policy: ReferencePolicy,
    /// Fan per-document extraction and scope resolution out across threads.
    pub parallel: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::MethodsOnly,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub pretty: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl CharterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&source)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = CharterConfig::from_toml_str("").unwrap();
        assert_eq!(config, CharterConfig::default());
        assert_eq!(config.analysis.reference_policy, ReferencePolicy::MethodsOnly);
        assert!(config.analysis.parallel);
        assert!(config.output.pretty);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CharterConfig::from_toml_str(
            "[analysis]\nreference_policy = \"any\"\n\n[output]\npretty = false\n",
        )
        .unwrap();
        assert_eq!(config.analysis.reference_policy, ReferencePolicy::AnyOccurrence);
        assert!(config.analysis.parallel);
        assert!(!config.output.pretty);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = CharterConfig::from_toml_str("[analysis]\nreference_policy = \"calls\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE_NAME);
        assert!(matches!(
            CharterConfig::load(&missing),
            Err(ConfigError::NotFound(_))
        ));
        assert_eq!(
            CharterConfig::load_or_default(&missing).unwrap(),
            CharterConfig::default()
        );
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[analysis]\nparallel = false\n").unwrap();
        let config = CharterConfig::load(&path).unwrap();
        assert!(!config.analysis.parallel);
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = toml::to_string(&CharterConfig::default()).unwrap();
        assert!(text.contains("reference_policy = \"methods\""));
        assert_eq!(CharterConfig::from_toml_str(&text).unwrap(), CharterConfig::default());
    }
}
