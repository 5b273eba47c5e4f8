//! Parallel indexing.
//!
//! The sorted archive list is split into contiguous chunks, each chunk being indexed
//! like [super::Indexing] does, into `<dst>/segment-<i>.jsonl`.
//!
//! Entity-keyed entities spanning two archives of different chunks end up split across segments.
use std::path::PathBuf;

use log::{error, info};
use rayon::prelude::*;

use crate::error::Error;
use crate::io::reader::list_archives;
use crate::io::writer::JsonlIndexWriter;

use super::indexing::{index_archives, prepare_dst};
use super::{IndexingOptions, Pipeline};

pub struct ShardedIndexing {
    src: PathBuf,
    dst: PathBuf,
    options: IndexingOptions,
    shards: usize,
}

impl ShardedIndexing {
    pub fn new(src: PathBuf, dst: PathBuf, options: IndexingOptions, shards: usize) -> Self {
        Self {
            src,
            dst,
            options,
            shards: shards.max(1),
        }
    }

    fn index_segment(&self, idx: usize, archives: &[PathBuf]) -> Result<u64, Error> {
        let name = format!("segment-{}", idx);
        info!("{}: indexing {} archives", name, archives.len());

        let mut writer = JsonlIndexWriter::new(&self.dst, &name)?;
        index_archives(&self.options, archives.to_vec(), &mut writer)
    }
}

impl Pipeline<u64> for ShardedIndexing {
    fn version() -> &'static str {
        "0.1.0"
    }

    fn run(&self) -> Result<u64, Error> {
        let archives = list_archives(&self.src, self.options.format)?;
        prepare_dst(&self.dst)?;

        let chunk_size = (archives.len() + self.shards - 1) / self.shards;
        info!(
            "indexing {} archives in chunks of {}",
            archives.len(),
            chunk_size
        );

        let results: Vec<Result<u64, Error>> = archives
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(idx, chunk)| self.index_segment(idx, chunk))
            .collect();

        let mut total = 0;
        let mut first_error = None;
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(nb) => total += nb,
                Err(e) => {
                    error!("segment-{}: {}", idx, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Finished indexing {} entities", total);
                Ok(total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::entity::Format;
    use crate::io::reader::archive::write_archive;

    use super::*;

    fn entity(i: usize) -> [(String, String); 3] {
        [
            (
                format!("doc{}/ent/metadata", i),
                format!("http://doc/{}\nhttp://ent/{}", i, i),
            ),
            (
                format!("doc{}/ent/outgoing-triples.nt", i),
                format!("<http://ent/{}> <http://p> <http://o> .\n", i),
            ),
            (
                format!("doc{}/ent/incoming-triples.nt", i),
                format!("<http://s> <http://p> <http://ent/{}> .\n", i),
            ),
        ]
    }

    #[test]
    fn segments() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        // 3 archives of 2 entities
        for a in 0..3 {
            let entries: Vec<(String, String)> =
                (0..2).flat_map(|e| entity(a * 2 + e)).collect();
            let entries: Vec<(&str, &str)> = entries
                .iter()
                .map(|(n, c)| (n.as_str(), c.as_str()))
                .collect();
            write_archive(&src.path().join(format!("DE-{}.tar.gz", a)), &entries);
        }

        let pipeline = ShardedIndexing::new(
            src.path().to_path_buf(),
            dst.path().to_path_buf(),
            IndexingOptions::new(Format::DocumentKeyed),
            2,
        );
        assert_eq!(pipeline.run().unwrap(), 6);

        let seg0 = fs::read_to_string(dst.path().join("segment-0.jsonl")).unwrap();
        let seg1 = fs::read_to_string(dst.path().join("segment-1.jsonl")).unwrap();
        assert_eq!(seg0.lines().count(), 4);
        assert_eq!(seg1.lines().count(), 2);
        assert!(seg1.contains("http://ent/5"));
        assert!(!dst.path().join("segment-2.jsonl").exists());
    }

    #[test]
    fn more_shards_than_archives() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let entries: Vec<(String, String)> = entity(0).into_iter().collect();
        let entries: Vec<(&str, &str)> = entries
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        write_archive(&src.path().join("DE-0.tar.gz"), &entries);

        let pipeline = ShardedIndexing::new(
            src.path().to_path_buf(),
            dst.path().to_path_buf(),
            IndexingOptions::new(Format::DocumentKeyed),
            8,
        );
        assert_eq!(pipeline.run().unwrap(), 1);
        assert!(dst.path().join("segment-0.jsonl").exists());
    }
}
