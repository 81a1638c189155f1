//! Run configuration.
//!
//! Everything the pipeline needs is carried by [`SummaryConfig`]; there is no
//! process-wide state. The language table can be extended from a YAML file,
//! by default `$HOME/.git-summary/languages.yaml` when it exists.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::SummaryError;
use crate::git::{HistoryOrder, SHORT_HASH_LEN};
use crate::ignore;
use crate::language::LanguageClassifier;

/// Branch analysed when none is given.
pub const DEFAULT_BRANCH: &str = "main";

/// Output file written when none is given.
pub const DEFAULT_OUTPUT: &str = "git_summary.json";

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to a file, replacing it atomically.
    File(PathBuf),
    /// Print to standard output.
    Stdout,
}

/// Configuration for one summary run.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Working tree root of the repository.
    pub repo_path: PathBuf,
    /// Branch whose history is collected.
    pub branch: String,
    /// Destination of the JSON document.
    pub output: OutputTarget,
    /// Number of hex characters kept from commit hashes.
    pub hash_length: usize,
    /// Order of each file's `git_history`.
    pub history_order: HistoryOrder,
    /// Extension to language table.
    pub languages: LanguageClassifier,
    /// Root ignore files relative to `repo_path`, lowest precedence first.
    pub ignore_sources: Vec<PathBuf>,
}

impl SummaryConfig {
    /// Creates a configuration with default settings for `repo_path`.
    pub fn new<P: Into<PathBuf>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.into(),
            branch: DEFAULT_BRANCH.to_string(),
            output: OutputTarget::File(PathBuf::from(DEFAULT_OUTPUT)),
            hash_length: SHORT_HASH_LEN,
            history_order: HistoryOrder::default(),
            languages: LanguageClassifier::default(),
            ignore_sources: ignore::default_sources(),
        }
    }
}

/// Language table overrides loaded from YAML.
///
/// ```yaml
/// replace_defaults: false
/// languages:
///   vue: Vue
///   ".svelte": Svelte
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageMapFile {
    /// Start from an empty table instead of the built-in one.
    #[serde(default)]
    pub replace_defaults: bool,
    /// Extension to label entries.
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

impl LanguageMapFile {
    /// Loads a language map from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SummaryError> {
        let path = path.as_ref();
        let invalid = |reason: String| SummaryError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Returns the default language map path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".git-summary").join("languages.yaml"))
    }

    /// Applies this map on top of the built-in table.
    pub fn into_classifier(self) -> LanguageClassifier {
        let mut classifier = if self.replace_defaults {
            LanguageClassifier::empty()
        } else {
            LanguageClassifier::default()
        };
        classifier.extend(self.languages);
        classifier
    }
}

/// Builds the classifier for a run.
///
/// An explicit file must exist and parse. Without one, the default file is
/// used if present, otherwise the built-in table.
pub fn load_languages(explicit: Option<&Path>) -> Result<LanguageClassifier, SummaryError> {
    if let Some(path) = explicit {
        return LanguageMapFile::load_from_path(path).map(LanguageMapFile::into_classifier);
    }

    match LanguageMapFile::default_path() {
        Some(path) if path.is_file() => {
            debug!(file = %path.display(), "Using language map");
            LanguageMapFile::load_from_path(&path).map(LanguageMapFile::into_classifier)
        }
        _ => Ok(LanguageClassifier::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::UNKNOWN_LANGUAGE;

    #[test]
    fn defaults() {
        let config = SummaryConfig::new("/tmp/repo");
        assert_eq!(config.branch, "main");
        assert_eq!(
            config.output,
            OutputTarget::File(PathBuf::from("git_summary.json"))
        );
        assert_eq!(config.hash_length, 8);
        assert_eq!(config.history_order, HistoryOrder::OldestFirst);
        assert_eq!(
            config.ignore_sources,
            vec![PathBuf::from(".git/info/exclude"), PathBuf::from(".gitignore")]
        );
    }

    #[test]
    fn language_map_extends_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.yaml");
        fs::write(&path, "languages:\n  vue: Vue\n  \".PY\": Python 3\n").unwrap();

        let classifier = load_languages(Some(&path)).unwrap();
        assert_eq!(classifier.classify("App.vue"), "Vue");
        assert_eq!(classifier.classify("main.py"), "Python 3");
        assert_eq!(classifier.classify("lib.rs"), "Rust");
    }

    #[test]
    fn language_map_can_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.yaml");
        fs::write(&path, "replace_defaults: true\nlanguages:\n  rs: Rust\n").unwrap();

        let classifier = load_languages(Some(&path)).unwrap();
        assert_eq!(classifier.classify("lib.rs"), "Rust");
        assert_eq!(classifier.classify("index.js"), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn missing_explicit_map_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_languages(Some(&dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(SummaryError::Config { .. })));
    }

    #[test]
    fn malformed_map_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.yaml");
        fs::write(&path, "languages: [not, a, map]\n").unwrap();
        assert!(matches!(
            LanguageMapFile::load_from_path(&path),
            Err(SummaryError::Config { .. })
        ));
    }

    #[test]
    fn empty_map_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.yaml");
        fs::write(&path, "\n").unwrap();
        let map = LanguageMapFile::load_from_path(&path).unwrap();
        assert!(!map.replace_defaults);
        assert!(map.languages.is_empty());
    }
}
