use crate::error::Error;

use super::EntityDocument;

/// Index writer contract.
///
/// Documents are added one at a time and only need to be durable after [IndexWriter::commit].
pub trait IndexWriter {
    fn add_document(&mut self, doc: &EntityDocument) -> Result<(), Error>;
    fn commit(&mut self) -> Result<(), Error>;
    /// Compact the index once every document has been added.
    fn optimize(&mut self) -> Result<(), Error>;
    /// Release the underlying resources. Uncommitted documents are committed.
    fn close(&mut self) -> Result<(), Error>;
}
