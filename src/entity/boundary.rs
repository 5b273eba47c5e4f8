//! Entity boundaries.
//!
//! [Format] holds the pure decisions (archive naming, entity identifiers, whether an entry
//! still belongs to the current entity), [EntityReader] drives an [ArchiveCursor] with them.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, error, warn};

use crate::error::Error;
use crate::io::reader::{ArchiveCursor, ArchiveEntry};
use crate::triples::TripleParser;

use super::EntityRecord;

/// Cumulative size of triples files above which incoming triples are dropped (64MB).
pub const MAX_ENTITY_SIZE: u64 = 64 * 1_048_576;

const METADATA: &str = "metadata";
const OUTGOING: &str = "outgoing-triples.nt";
const INCOMING: &str = "incoming-triples.nt";

/// Dataset layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `DE-<n>.tar.gz`: `docID/entityID/{metadata,*.nt}`, one entity per document.
    DocumentKeyed,
    /// `ED-<n>.tar.gz`: `entityID/docID/{metadata,*.nt}`, an entity spans every document of its folder.
    EntityKeyed,
}

impl Format {
    fn prefix(&self) -> &'static str {
        match self {
            Format::DocumentKeyed => "DE-",
            Format::EntityKeyed => "ED-",
        }
    }

    /// Glob matching the archives of this format.
    pub fn glob(&self) -> &'static str {
        match self {
            Format::DocumentKeyed => "DE-*.tar.gz",
            Format::EntityKeyed => "ED-*.tar.gz",
        }
    }

    /// Checks that `file_name` is `<prefix>-<digits>.tar.gz`.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_suffix(".tar.gz"))
            .map(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false)
    }

    /// Identifier of the entity an entry belongs to.
    ///
    /// For the entity-keyed format, this is the entry name up to and including the first `/`.
    /// Document-keyed entities have no identifier since they never span several documents.
    pub fn entity_id<'a>(&self, entry_name: &'a str) -> Option<&'a str> {
        match self {
            Format::DocumentKeyed => None,
            Format::EntityKeyed => entry_name
                .find('/')
                .map(|idx| &entry_name[..=idx]),
        }
    }

    /// Whether the entry named `next_name` still belongs to the entity identified by `entity_id`.
    pub fn same_entity(&self, entity_id: Option<&str>, next_name: &str) -> bool {
        match (self, entity_id) {
            (Format::DocumentKeyed, _) => false,
            (Format::EntityKeyed, Some(id)) => next_name.starts_with(id),
            (Format::EntityKeyed, None) => false,
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SINDICE_DE" | "DE" => Ok(Format::DocumentKeyed),
            "SINDICE_ED" | "ED" => Ok(Format::EntityKeyed),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Assembles [EntityRecord]s from the entries of an [ArchiveCursor].
pub struct EntityReader<P> {
    cursor: ArchiveCursor,
    format: Format,
    parser: P,
    max_entity_size: u64,
    // the cursor is positioned on the first, unread, entry of the next entity
    lookahead: bool,
}

impl<P: TripleParser> EntityReader<P> {
    pub fn new(cursor: ArchiveCursor, format: Format, parser: P) -> Self {
        Self {
            cursor,
            format,
            parser,
            max_entity_size: MAX_ENTITY_SIZE,
            lookahead: false,
        }
    }

    /// Change the size above which incoming triples of entity-keyed entities are dropped.
    pub fn with_max_entity_size(mut self, max_entity_size: u64) -> Self {
        self.max_entity_size = max_entity_size;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Reset `record` and fill it with the next entity.
    ///
    /// Returns `Ok(false)` when there are no more entities.
    /// A missing triples file after a metadata entry is an error that should stop the run.
    pub fn next_entity(&mut self, record: &mut EntityRecord) -> Result<bool, Error> {
        record.reset();

        if !std::mem::take(&mut self.lookahead) && !self.cursor.advance() {
            return Ok(false);
        }

        match self.format {
            Format::DocumentKeyed => self.next_document_keyed(record)?,
            Format::EntityKeyed => self.next_entity_keyed(record)?,
        }
        Ok(true)
    }

    /// One entity = metadata, outgoing and incoming entries.
    fn next_document_keyed(&mut self, record: &mut EntityRecord) -> Result<(), Error> {
        let mut metadata = String::new();
        let mut outgoing = String::new();
        let mut incoming = String::new();

        let result = self.read_document(&mut metadata, &mut outgoing, &mut incoming);
        self.recover(result)?;

        record.add_outgoing(&outgoing, &self.parser);
        record.add_incoming(&incoming, &self.parser);
        record.set_metadata(&metadata);
        Ok(())
    }

    fn read_document(
        &mut self,
        metadata: &mut String,
        outgoing: &mut String,
        incoming: &mut String,
    ) -> Result<(), Error> {
        self.check_entry(METADATA, String::new())?;
        self.cursor.read_entry(metadata)?;
        self.expect_entry(OUTGOING)?;
        self.cursor.read_entry(outgoing)?;
        self.expect_entry(INCOMING)?;
        self.cursor.read_entry(incoming)
    }

    /// Accumulate documents as long as their entries share the entity identifier.
    fn next_entity_keyed(&mut self, record: &mut EntityRecord) -> Result<(), Error> {
        let entity_id = self
            .cursor
            .current_entry()
            .and_then(|entry| self.format.entity_id(entry.name()))
            .map(String::from);
        let mut entity_size = 0;
        let mut has_metadata = false;
        self.check_entry(METADATA, String::new())?;

        loop {
            let result =
                self.read_entity_document(record, &mut has_metadata, &mut entity_size);
            if result.is_err() {
                // partial entities are kept
                return self.recover(result);
            }

            let last = self
                .cursor
                .current_entry()
                .map(|entry| entry.name().to_string())
                .unwrap_or_default();
            if !self.cursor.advance() {
                break;
            }
            let next_name = self.cursor.current_entry().map(ArchiveEntry::name);
            if !next_name
                .map(|name| self.format.same_entity(entity_id.as_deref(), name))
                .unwrap_or(false)
            {
                self.lookahead = true;
                break;
            }
            self.check_entry(METADATA, last)?;
        }

        if entity_size > self.max_entity_size {
            debug!(
                "entity {} is {} bytes: incoming triples dropped",
                record.subject, entity_size
            );
        }
        Ok(())
    }

    /// Read one document of an entity-keyed entity.
    ///
    /// Metadata is only parsed for the first document of the entity.
    fn read_entity_document(
        &mut self,
        record: &mut EntityRecord,
        has_metadata: &mut bool,
        entity_size: &mut u64,
    ) -> Result<(), Error> {
        if *has_metadata {
            self.cursor.skip_entry()?;
        } else {
            let mut metadata = String::new();
            self.cursor.read_entry(&mut metadata)?;
            record.set_metadata(&metadata);
            *has_metadata = true;
        }

        let mut triples = String::new();

        self.expect_entry(OUTGOING)?;
        *entity_size += self.current_size();
        self.cursor.read_entry(&mut triples)?;
        record.add_outgoing(&triples, &self.parser);

        self.expect_entry(INCOMING)?;
        *entity_size += self.current_size();
        if *entity_size > self.max_entity_size {
            // too big: only keep outgoing triples, they are the most informative ones.
            self.cursor.skip_entry()?;
            record.incoming.clear();
        } else {
            triples.clear();
            self.cursor.read_entry(&mut triples)?;
            record.add_incoming(&triples, &self.parser);
        }
        Ok(())
    }

    fn current_size(&self) -> u64 {
        self.cursor
            .current_entry()
            .map(ArchiveEntry::size)
            .unwrap_or(0)
    }

    /// Move to the entry expected after the current one.
    ///
    /// Both formats treat a missing entry as fatal, but only the document-keyed one logs it as an error.
    fn expect_entry(&mut self, expected: &'static str) -> Result<(), Error> {
        let previous = self
            .cursor
            .current_entry()
            .map(|entry| entry.name().to_string())
            .unwrap_or_default();

        if !self.cursor.advance() {
            return Err(self.missing_entry(expected, previous, None));
        }
        self.check_entry(expected, previous)
    }

    /// Check that the cursor is on the `expected` file, which should follow `previous`.
    fn check_entry(&self, expected: &'static str, previous: String) -> Result<(), Error> {
        match self.cursor.current_entry() {
            Some(entry) if is_file_named(entry.name(), expected) => Ok(()),
            found => {
                let found = found.map(|entry| entry.name().to_string());
                Err(self.missing_entry(expected, previous, found))
            }
        }
    }

    fn missing_entry(
        &self,
        expected: &'static str,
        previous: String,
        found: Option<String>,
    ) -> Error {
        let archive = self
            .cursor
            .current_archive()
            .map(Path::to_path_buf)
            .unwrap_or_else(PathBuf::new);
        match self.format {
            Format::DocumentKeyed => error!(
                "Error while trying to get the {} from {:?}, entry name: {}, found: {:?}",
                expected, archive, previous, found
            ),
            Format::EntityKeyed => warn!(
                "Error while trying to get the {} from {:?}, entry name: {}, found: {:?}",
                expected, archive, previous, found
            ),
        }

        Error::MissingEntry {
            archive,
            entry: previous,
            expected,
            found,
        }
    }

    /// Read failures end the current entity but not the run.
    fn recover(&self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Err(Error::Io(e)) => {
                warn!(
                    "Couldn't read a compressed file from {:?}, entry name: {:?}: {}",
                    self.cursor.current_archive(),
                    self.cursor.current_entry().map(ArchiveEntry::name),
                    e
                );
                Ok(())
            }
            other => other,
        }
    }
}

/// Whether the last component of the entry name `name` is `file`.
fn is_file_named(name: &str, file: &str) -> bool {
    name.strip_suffix(file)
        .map(|rest| rest.is_empty() || rest.ends_with('/'))
        .unwrap_or(false)
}
