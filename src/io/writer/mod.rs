/*!
# Index writing

An index stores one document per entity. The index itself is not part of this crate: anything
implementing [IndexWriter] can be fed by the indexing pipeline.

[JsonlIndexWriter] is provided as a simple, file based index, writing one JSON object per entity.
!*/
mod document;
mod jsonl;
mod writertrait;

pub use document::{EntityDocument, Field, INCOMING_TRIPLE, OUTGOING_TRIPLE, SUBJECT, TYPE};
pub use jsonl::JsonlIndexWriter;
pub use writertrait::IndexWriter;
