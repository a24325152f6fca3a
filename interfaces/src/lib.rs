//! Port contracts for the collaborators the content index depends on: the
//! full-text search backend and the per-provider content transform pipeline.

pub mod defs;
pub mod memory;
pub mod query;
pub mod sqlite;

pub use defs::{FullTextIndex, FullTextOpener, Transform, TransformContext};
pub use memory::{MemoryFullTextIndex, MemoryOpener};
pub use sqlite::{SqliteFullTextIndex, SqliteOpener};
