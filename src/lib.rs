//! # entity-indexer
//!
//! Entity aggregation and canonicalization over `DE-*.tar.gz` / `ED-*.tar.gz` dumps.
//!
//! - [io::reader] walks the gzipped tar archives entry by entry,
//! - [entity] groups entries into entities, following the dataset [entity::Format],
//! - [triples] parses N-Triples and canonicalizes them per predicate,
//! - [io::writer] turns entities into index documents,
//! - [pipelines] ties everything together.
pub mod entity;
pub mod error;
pub mod io;
pub mod pipelines;
pub mod triples;
