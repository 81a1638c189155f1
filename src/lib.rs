//! # git-summary
//!
//! Extracts per-file commit history and the directory structure of a git
//! repository and serializes both into a single JSON document for
//! documentation and visualization tools.
//!
//! ## Pipeline
//!
//! - [`ignore::IgnoreMatcher`] loads the root ignore rules
//! - [`tree::TreeWalker`] builds the nested tree and a flat inventory
//! - [`git::HistoryCollector`] walks the branch log once and groups commits by path
//! - [`language::LanguageClassifier`] labels files by extension
//! - [`data::assemble`] merges everything into a [`data::SummaryDocument`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use git_summary::{pipeline, SummaryConfig};
//!
//! let config = SummaryConfig::new("path/to/repo");
//! let document = pipeline::run(&config)?;
//! println!("{} files", document.files.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod git;
pub mod ignore;
pub mod language;
pub mod pipeline;
pub mod tree;

pub use crate::cli::Cli;
pub use crate::config::SummaryConfig;
pub use crate::error::SummaryError;

/// The current version of git-summary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
