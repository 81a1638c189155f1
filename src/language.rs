//! Extension-based language labels.

use std::collections::BTreeMap;
use std::path::Path;

/// Label given to files whose extension is missing or unmapped.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Built-in extension table. Keys are lowercase and carry no leading dot.
const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("c", "C"),
    ("cc", "C++"),
    ("cpp", "C++"),
    ("cs", "C#"),
    ("css", "CSS"),
    ("go", "Go"),
    ("h", "C"),
    ("hpp", "C++"),
    ("html", "HTML"),
    ("java", "Java"),
    ("js", "JavaScript"),
    ("json", "JSON"),
    ("jsx", "JavaScript (React)"),
    ("kt", "Kotlin"),
    ("md", "Markdown"),
    ("py", "Python"),
    ("rb", "Ruby"),
    ("rs", "Rust"),
    ("scss", "SCSS"),
    ("sh", "Shell"),
    ("sql", "SQL"),
    ("swift", "Swift"),
    ("toml", "TOML"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript (React)"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
];

/// Maps file extensions to coarse language labels.
#[derive(Debug, Clone)]
pub struct LanguageClassifier {
    by_extension: BTreeMap<String, String>,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::from_mapping(
            DEFAULT_LANGUAGES
                .iter()
                .map(|(ext, label)| ((*ext).to_string(), (*label).to_string())),
        )
    }
}

impl LanguageClassifier {
    /// Creates a classifier with no mappings; everything is unknown.
    pub fn empty() -> Self {
        Self {
            by_extension: BTreeMap::new(),
        }
    }

    /// Creates a classifier from `(extension, label)` pairs.
    pub fn from_mapping<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut classifier = Self::empty();
        classifier.extend(mapping);
        classifier
    }

    /// Adds or replaces a mapping. A leading dot on `extension` is accepted.
    pub fn insert(&mut self, extension: &str, label: impl Into<String>) {
        self.by_extension
            .insert(normalize_extension(extension), label.into());
    }

    /// Adds or replaces several mappings.
    pub fn extend<I>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (ext, label) in mapping {
            self.insert(&ext, label);
        }
    }

    /// Returns the label for a file name or relative path.
    pub fn classify(&self, file_name: &str) -> &str {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .map_or(UNKNOWN_LANGUAGE, String::as_str)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
