//! Story store backends
//!
//! Implementations of [`story_core::StoryStore`]:
//! - [`MemoryStore`]: in-process, with write fault injection
//! - [`JsonFileStore`]: single JSON document on disk, atomic commits

#![warn(unreachable_pub)]

pub mod document;
pub mod file;
pub mod memory;

pub use document::StoryDocument;
pub use file::JsonFileStore;
pub use memory::{MemoryStore, WriteStats};
