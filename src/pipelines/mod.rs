//! Pipelines.
//!
//! Various pipelines are implemented here, and the module
//! provides a light [pipeline::Pipeline] trait that enables easy and flexible pipeline creation.
mod indexing;
#[allow(clippy::module_inception)]
pub mod pipeline;
mod sharded;

pub use indexing::{Indexing, IndexingOptions, DEFAULT_COMMIT};
pub use pipeline::Pipeline;
pub use sharded::ShardedIndexing;
