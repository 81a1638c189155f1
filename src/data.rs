//! Output model and serialization.

pub mod json;
pub mod summary;

pub use json::{to_json, write_json_file};
pub use summary::{
    assemble, DirectoryRecord, EntryType, FileMetadata, FileRecord, SummaryDocument,
    ROOT_DIRECTORY,
};
