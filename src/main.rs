//! # entity-indexer
//!
//! Builds a search index out of entity dumps, where each entity is described by
//! a metadata file and its outgoing and incoming N-Triples.
//!
//! ## Getting started
//!
//! ```sh
//! entity-indexer 0.1.0
//! entity dump indexing tool.
//!
//! USAGE:
//!     entity-indexer <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     help     Prints this message or the help of the given subcommand(s)
//!     index    Index an entity dump
//! ```
//!
//! Example:
//!
//! ```sh
//! RUST_LOG=info entity-indexer index --format DE --commit 5000 dumps/ index/
//! ```
use structopt::StructOpt;

use entity_indexer::error::Error;
use entity_indexer::pipelines::{Indexing, Pipeline, ShardedIndexing};

#[macro_use]
extern crate log;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::EntityIndexer::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::EntityIndexer::Index(e) => {
            let options = e.options();
            let nb = match e.shards {
                Some(shards) if shards > 1 => {
                    ShardedIndexing::new(e.src, e.dst, options, shards).run()?
                }
                _ => Indexing::new(e.src, e.dst, options).run()?,
            };
            info!("Finished indexing: {} entities", nb);
        }
    };
    Ok(())
}
