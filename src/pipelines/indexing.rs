//! Entity indexing pipeline.
//!
//! Reads every entity of a dump folder and writes one document per entity into an index.
//!
//! # Processing
//! 1. Archives matching the dataset format are listed and sorted by name. No archive is an error.
//! 1. Entities are assembled from the archive entries, following the [Format] boundaries.
//! 1. Each entity becomes an [EntityDocument] (subject, types, outgoing and incoming canonical triples).
//! 1. Documents are committed by batches, then the index is optimized and closed.
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::entity::{EntityReader, EntityRecord, Format, MAX_ENTITY_SIZE};
use crate::error::Error;
use crate::io::reader::{list_archives, ArchiveCursor};
use crate::io::writer::{EntityDocument, IndexWriter, JsonlIndexWriter};
use crate::triples::ParserKind;

use super::Pipeline;

/// Number of entities per commit.
pub const DEFAULT_COMMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingOptions {
    pub format: Format,
    /// commit documents by batch of `commit`
    pub commit: usize,
    /// store triples fields in the index
    pub store: bool,
    pub parser: ParserKind,
    /// see [EntityReader::with_max_entity_size]
    pub max_entity_size: u64,
}

impl IndexingOptions {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            commit: DEFAULT_COMMIT,
            store: false,
            parser: ParserKind::default(),
            max_entity_size: MAX_ENTITY_SIZE,
        }
    }
}

pub struct Indexing {
    src: PathBuf,
    dst: PathBuf,
    options: IndexingOptions,
}

impl Indexing {
    pub fn new(src: PathBuf, dst: PathBuf, options: IndexingOptions) -> Self {
        debug!("indexing options: {:?}", options);
        Self { src, dst, options }
    }

    pub fn options(&self) -> &IndexingOptions {
        &self.options
    }

    /// Index every archive of the source folder into `writer`.
    pub fn index<W: IndexWriter>(&self, writer: &mut W) -> Result<u64, Error> {
        let archives = list_archives(&self.src, self.options.format)?;
        self.index_archives(archives, writer)
    }

    /// Index `archives`, in the provided order, into `writer`.
    ///
    /// The writer is closed when returning, whether indexing succeeded or not.
    /// Returns the number of indexed entities.
    pub fn index_archives<W: IndexWriter>(
        &self,
        archives: Vec<PathBuf>,
        writer: &mut W,
    ) -> Result<u64, Error> {
        index_archives(&self.options, archives, writer)
    }
}

/// See [Indexing::index_archives].
pub(super) fn index_archives<W: IndexWriter>(
    options: &IndexingOptions,
    archives: Vec<PathBuf>,
    writer: &mut W,
) -> Result<u64, Error> {
    match index_entities(options, archives, writer) {
        Ok(nb) => {
            writer.close()?;
            Ok(nb)
        }
        Err(e) => {
            if let Err(close_err) = writer.close() {
                error!("Could not close index: {}", close_err);
            }
            Err(e)
        }
    }
}

fn index_entities<W: IndexWriter>(
    options: &IndexingOptions,
    archives: Vec<PathBuf>,
    writer: &mut W,
) -> Result<u64, Error> {
    let commit = options.commit.max(1) as u64;
    let mut reader = EntityReader::new(ArchiveCursor::new(archives), options.format, options.parser)
        .with_max_entity_size(options.max_entity_size);

    let mut record = EntityRecord::new();
    let mut counter: u64 = 0;
    let mut last_subject = String::new();

    while reader.next_entity(&mut record)? {
        if record.subject.is_empty() {
            warn!("skipping entity without subject (context: {:?})", record.context);
            continue;
        }

        let doc = EntityDocument::from_record(&record, options.store);
        writer.add_document(&doc)?;
        counter += 1;

        // commit by batch
        if counter % commit == 0 {
            writer.commit()?;
            info!(
                "Committed {} entities. Last entity: {}",
                counter, record.subject
            );
        }
        last_subject.clear();
        last_subject.push_str(&record.subject);
    }

    // commit what is left
    writer.commit()?;
    info!(
        "Committed {} entities. Last entity: {}",
        counter, last_subject
    );
    writer.optimize()?;

    Ok(counter)
}

/// Create the destination folder if needed.
pub(super) fn prepare_dst(dst: &Path) -> Result<(), Error> {
    if !dst.exists() {
        warn!("Destination file does not exist. Creating");
        std::fs::create_dir_all(dst)?;
    }

    if !dst.is_dir() {
        return Err(Error::Custom(format!(
            "Destination has to be a directory: {:?}",
            dst
        )));
    }
    Ok(())
}

impl Pipeline<u64> for Indexing {
    fn version() -> &'static str {
        "0.1.0"
    }

    /// Index the source folder into `<dst>/index.jsonl`.
    fn run(&self) -> Result<u64, Error> {
        // fail on a bad source before creating anything
        let archives = list_archives(&self.src, self.options.format)?;
        prepare_dst(&self.dst)?;

        let mut writer = JsonlIndexWriter::new(&self.dst, "index")?;
        let nb = self.index_archives(archives, &mut writer)?;
        info!("Finished indexing {} entities into {:?}", nb, writer.path());
        Ok(nb)
    }
}
