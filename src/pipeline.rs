//! End-to-end summary generation.
//!
//! The stages run strictly one after another: ignore rules are loaded, the
//! working tree is walked, the branch history is collected, and the results
//! are assembled into a [`SummaryDocument`].

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{OutputTarget, SummaryConfig};
use crate::data::{assemble, to_json, write_json_file, SummaryDocument};
use crate::git::{GitRepository, HistoryCollector};
use crate::ignore::IgnoreMatcher;
use crate::tree::TreeWalker;

/// Builds the summary document without writing it anywhere.
pub fn run(config: &SummaryConfig) -> Result<SummaryDocument> {
    let root = &config.repo_path;

    // Fail before touching the working tree if this is not a repository.
    GitRepository::open_at(root)?;

    let matcher = IgnoreMatcher::load(root, &config.ignore_sources);
    info!(rules = matcher.len(), "Loaded ignore rules");

    let walk = TreeWalker::new(&matcher).build(root)?;
    info!(entries = walk.entries.len(), "Walked working tree");

    let history = HistoryCollector::new(config.hash_length)
        .collect_for_branch(root, &config.branch)
        .with_context(|| format!("Failed to collect history for branch '{}'", config.branch))?;

    let document = assemble(
        walk.tree,
        &walk.entries,
        &history,
        config.history_order,
        |name| config.languages.classify(name).to_string(),
    )?;

    info!(
        files = document.files.len(),
        directories = document.directories.len(),
        "Assembled summary"
    );

    Ok(document)
}

/// Builds the summary and delivers it to the configured output.
///
/// Nothing is written unless the whole document was built successfully.
pub fn generate(config: &SummaryConfig) -> Result<SummaryDocument> {
    let document = run(config)?;

    match &config.output {
        OutputTarget::File(path) => write_json_file(&document, path)?,
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", to_json(&document)?)
                .and_then(|()| stdout.flush())
                .context("Failed to write summary to stdout")?;
        }
    }

    Ok(document)
}
