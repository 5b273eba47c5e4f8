//! JSON lines index.
//!
//! Each document is written on its own line:
//!
//! ```json
//! {"stored":{"subject":"http://me","type":"<http://T> .\n"},"indexed":{"incoming-triple":"","outgoing-triple":"<http://p> <http://o> .\n"}}
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::Error;

use super::{EntityDocument, IndexWriter};

#[derive(Serialize)]
struct JsonDocument<'a> {
    stored: BTreeMap<&'static str, &'a str>,
    indexed: BTreeMap<&'static str, &'a str>,
}

impl<'a> From<&'a EntityDocument> for JsonDocument<'a> {
    fn from(doc: &'a EntityDocument) -> Self {
        let mut stored = BTreeMap::new();
        let mut indexed = BTreeMap::new();
        for field in doc.fields() {
            if field.stored() {
                stored.insert(field.name(), field.value());
            }
            if field.indexed() {
                indexed.insert(field.name(), field.value());
            }
        }
        Self { stored, indexed }
    }
}

/// Writes documents to `<dst>/<name>.jsonl`.
///
/// The file is truncated on creation.
pub struct JsonlIndexWriter {
    path: PathBuf,
    handle: Option<BufWriter<File>>,
    // added since last commit
    pending: u64,
    committed: u64,
}

impl JsonlIndexWriter {
    pub fn new(dst: &Path, name: &str) -> Result<Self, Error> {
        let mut path = dst.to_path_buf();
        path.push(format!("{}.jsonl", name));

        debug!("creating index file {:?}", path);
        let file = File::create(&path)?;

        Ok(Self {
            path,
            handle: Some(BufWriter::new(file)),
            pending: 0,
            committed: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of committed documents.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    fn handle(&mut self) -> Result<&mut BufWriter<File>, Error> {
        let path = &self.path;
        self.handle
            .as_mut()
            .ok_or_else(|| Error::Custom(format!("index {:?} is closed", path)))
    }
}

impl IndexWriter for JsonlIndexWriter {
    fn add_document(&mut self, doc: &EntityDocument) -> Result<(), Error> {
        let handle = self.handle()?;
        serde_json::to_writer(&mut *handle, &JsonDocument::from(doc))?;
        handle.write_all(b"\n")?;
        self.pending += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error> {
        let handle = self.handle()?;
        handle.flush()?;
        handle.get_ref().sync_data()?;
        self.committed += self.pending;
        self.pending = 0;
        Ok(())
    }

    fn optimize(&mut self) -> Result<(), Error> {
        // nothing to compact in a line-oriented file
        info!("{:?}: {} documents", self.path, self.committed);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.handle.is_none() {
            warn!("{:?}: trying to close a closed index.", self.path);
            return Ok(());
        }
        let result = self.commit();
        self.handle = None;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};

    use serde_json::Value;

    use crate::entity::EntityRecord;
    use crate::triples::LineParser;

    use super::*;

    fn record(subject: &str) -> EntityRecord {
        let mut record = EntityRecord::new();
        record.set_metadata(&format!("http://doc\n{}", subject));
        record.add_outgoing(
            &format!("<{}> <http://p> <http://o> .", subject),
            &LineParser,
        );
        record
    }

    #[test]
    fn write_and_read_back() {
        let dst = tempfile::tempdir().unwrap();
        let mut writer = JsonlIndexWriter::new(dst.path(), "index").unwrap();

        writer
            .add_document(&EntityDocument::from_record(&record("http://a"), false))
            .unwrap();
        writer
            .add_document(&EntityDocument::from_record(&record("http://b"), true))
            .unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.committed(), 2);
        writer.close().unwrap();

        let f = File::open(dst.path().join("index.jsonl")).unwrap();
        let lines: Vec<Value> = BufReader::new(f)
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0]["stored"]["subject"], "http://a");
        assert!(lines[0]["stored"].get("outgoing-triple").is_none());
        assert_eq!(
            lines[0]["indexed"]["outgoing-triple"],
            "<http://p> <http://o> .\n"
        );
        assert!(lines[0]["indexed"].get("subject").is_none());

        assert_eq!(
            lines[1]["stored"]["outgoing-triple"],
            "<http://p> <http://o> .\n"
        );
    }

    #[test]
    fn closed() {
        let dst = tempfile::tempdir().unwrap();
        let mut writer = JsonlIndexWriter::new(dst.path(), "index").unwrap();
        writer
            .add_document(&EntityDocument::from_record(&record("http://a"), false))
            .unwrap();
        // close commits
        writer.close().unwrap();
        assert_eq!(writer.committed(), 1);
        // closing twice is harmless
        writer.close().unwrap();
        assert!(writer
            .add_document(&EntityDocument::from_record(&record("http://b"), false))
            .is_err());
    }
}
