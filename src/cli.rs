//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

use entity_indexer::entity::{Format, MAX_ENTITY_SIZE};
use entity_indexer::pipelines::{IndexingOptions, DEFAULT_COMMIT};
use entity_indexer::triples::ParserKind;

#[derive(Debug, StructOpt)]
#[structopt(name = "entity-indexer", about = "entity dump indexing tool.")]
/// Holds every command that is callable by the `entity-indexer` command.
pub enum EntityIndexer {
    #[structopt(about = "Index an entity dump")]
    Index(Index),
}

#[derive(Debug, StructOpt)]
/// Index command and parameters.
pub struct Index {
    #[structopt(parse(from_os_str), help = "dump folder (DE-*.tar.gz or ED-*.tar.gz files)")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "index destination folder")]
    pub dst: PathBuf,
    #[structopt(
        long = "format",
        short = "f",
        help = "dataset format: DE (document-keyed) or ED (entity-keyed)"
    )]
    pub format: Format,
    #[structopt(
        long = "commit",
        short = "c",
        help = "commit every N entities",
        default_value = "10000"
    )]
    pub commit: usize,
    #[structopt(long = "store", help = "store triples in the index")]
    pub store: bool,
    #[structopt(long = "strict", help = "reject malformed N-Triples statements")]
    pub strict: bool,
    #[structopt(
        long = "shards",
        short = "s",
        help = "split the dump in N independently indexed segments"
    )]
    pub shards: Option<usize>,
    #[structopt(
        long = "max-entity-size",
        help = "entity size (bytes) above which incoming triples are dropped (entity-keyed only)"
    )]
    pub max_entity_size: Option<u64>,
}

impl Index {
    pub fn options(&self) -> IndexingOptions {
        let mut options = IndexingOptions::new(self.format);
        options.commit = if self.commit == 0 {
            DEFAULT_COMMIT
        } else {
            self.commit
        };
        options.store = self.store;
        if self.strict {
            options.parser = ParserKind::Strict;
        }
        options.max_entity_size = self.max_entity_size.unwrap_or(MAX_ENTITY_SIZE);
        options
    }
}
