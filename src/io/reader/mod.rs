/*! Dump reading utilities

Dumps are folders of `.tar.gz` archives. [ArchiveCursor] reads them as a single stream of entries.
!*/
pub mod archive;

pub use archive::{list_archives, ArchiveCursor, ArchiveEntry};
