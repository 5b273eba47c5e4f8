//! Pipeline trait.
use crate::error::Error;

/// A runnable pipeline, generic over what a run yields
/// (the indexing pipelines return the number of indexed entities).
pub trait Pipeline<T> {
    fn version() -> &'static str;
    fn run(&self) -> Result<T, Error>;
}
