//! Root-level ignore rules.
//!
//! Rules come from files at the repository root, by default
//! `.git/info/exclude` followed by `.gitignore`. Nested ignore files are not
//! consulted. Rules are evaluated in order and the last matching rule
//! decides, so a later `!rule` re-includes a path an earlier rule excluded.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Name of the git metadata directory, which is never part of the summary.
pub const GIT_DIR: &str = ".git";

/// Root ignore file name.
pub const IGNORE_FILE: &str = ".gitignore";

/// Rule files read when none are configured, lowest precedence first.
pub fn default_sources() -> Vec<PathBuf> {
    vec![
        Path::new(GIT_DIR).join("info").join("exclude"),
        PathBuf::from(IGNORE_FILE),
    ]
}

/// Tests repository-relative paths against the root ignore rules.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    gitignore: Gitignore,
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self {
            gitignore: Gitignore::empty(),
        }
    }
}

impl IgnoreMatcher {
    /// Loads rules from `sources`, each relative to the repository root.
    ///
    /// Missing rule files contribute nothing. Later sources take precedence
    /// over earlier ones.
    pub fn load<P: AsRef<Path>>(root_path: P, sources: &[PathBuf]) -> Self {
        let root = root_path.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let mut builder = GitignoreBuilder::new(&root);

        for source in sources {
            let file = root.join(source);
            match fs::read(&file) {
                Ok(bytes) => {
                    add_lines(&mut builder, &String::from_utf8_lossy(&bytes), Some(&file));
                    debug!(file = %file.display(), "Loaded ignore rules");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Skipping unreadable ignore file");
                }
            }
        }

        Self::finish(&builder)
    }

    /// Builds a matcher from ignore-file text.
    pub fn from_patterns(text: &str) -> Self {
        // Relative query paths never start with this root.
        let mut builder = GitignoreBuilder::new("/");
        add_lines(&mut builder, text, None);
        Self::finish(&builder)
    }

    fn finish(builder: &GitignoreBuilder) -> Self {
        match builder.build() {
            Ok(gitignore) => Self { gitignore },
            Err(e) => {
                warn!(error = %e, "Failed to compile ignore rules, ignoring nothing");
                Self::default()
            }
        }
    }

    /// Number of rules that compiled successfully.
    pub fn len(&self) -> usize {
        self.gitignore.len()
    }

    /// Returns true when no rules are loaded.
    pub fn is_empty(&self) -> bool {
        self.gitignore.is_empty()
    }

    /// Returns true if the path should be left out of the summary.
    ///
    /// `relative_path` uses forward slashes; a trailing `/` marks it as a
    /// directory so that directory-only rules can apply. A path is ignored
    /// when it or any of its parent directories is ignored, and anything
    /// under `.git` always is.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        let is_dir = relative_path.ends_with('/');
        let path = relative_path.trim_end_matches('/');
        if path.is_empty() || path == "." {
            return false;
        }

        if path.split('/').any(|component| component == GIT_DIR) {
            return true;
        }

        // A negated rule cannot re-include a path below an ignored directory.
        let parent_ignored = path
            .match_indices('/')
            .any(|(idx, _)| self.gitignore.matched(&path[..idx], true).is_ignore());

        parent_ignored || self.gitignore.matched(path, is_dir).is_ignore()
    }
}

/// Adds every line of `text`; malformed lines are logged and skipped.
fn add_lines(builder: &mut GitignoreBuilder, text: &str, origin: Option<&Path>) {
    for (index, line) in text.lines().enumerate() {
        let pattern = escape_braces(line);
        if let Err(e) = builder.add_line(origin.map(Path::to_path_buf), &pattern) {
            warn!(
                file = %origin.map_or_else(|| "<inline>".into(), |p| p.display().to_string()),
                line = index + 1,
                pattern = line,
                error = %e,
                "Skipping malformed ignore rule"
            );
        }
    }
}

/// Ignore files have no `{a,b}` alternation; braces match literally.
fn escape_braces(line: &str) -> Cow<'_, str> {
    if !line.contains(['{', '}']) {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len() + 4);
    let mut escaped = false;
    let mut in_class = false;
    for c in line.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '{' | '}' if !in_class => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    Cow::Owned(out)
}
