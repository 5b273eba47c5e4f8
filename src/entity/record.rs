//! Entity accumulator.
use log::warn;

use crate::triples::{self, Direction, PredicateMap, Stats, TripleParser, TypeSet};

/// One entity of the dataset, accumulated over one or more archive entries.
///
/// A record is meant to be reused: call [EntityRecord::reset] before starting a new entity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// URI of the entity
    pub subject: String,
    /// URL of the document the entity comes from
    pub context: String,
    /// objects of `rdf:type` statements
    pub types: TypeSet,
    /// outgoing-triples.nt
    pub outgoing: PredicateMap,
    /// incoming-triples.nt
    pub incoming: PredicateMap,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every field.
    pub fn reset(&mut self) {
        self.subject.clear();
        self.context.clear();
        self.types.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
            && self.context.is_empty()
            && self.types.is_empty()
            && self.outgoing.is_empty()
            && self.incoming.is_empty()
    }

    /// Set context and subject from a metadata entry.
    ///
    /// The first line is the context, the rest is the subject.
    pub fn set_metadata(&mut self, metadata: &str) {
        match metadata.split_once('\n') {
            Some((context, subject)) => {
                self.context = context.trim().to_string();
                self.subject = subject.trim().to_string();
            }
            None => {
                warn!("metadata without subject: {:?}", metadata);
                self.context = metadata.trim().to_string();
                self.subject.clear();
            }
        }
    }

    /// Merge an outgoing-triples entry, collecting `rdf:type` objects.
    pub fn add_outgoing<P: TripleParser + ?Sized>(&mut self, text: &str, parser: &P) -> Stats {
        triples::canonicalize(
            text,
            parser,
            Direction::Outgoing,
            Some(&mut self.types),
            &mut self.outgoing,
        )
    }

    /// Merge an incoming-triples entry.
    pub fn add_incoming<P: TripleParser + ?Sized>(&mut self, text: &str, parser: &P) -> Stats {
        triples::canonicalize(text, parser, Direction::Incoming, None, &mut self.incoming)
    }

    /// Canonical block of outgoing triples.
    pub fn outgoing_triples(&self) -> String {
        triples::flatten(&self.outgoing)
    }

    /// Canonical block of incoming triples.
    pub fn incoming_triples(&self) -> String {
        triples::flatten(&self.incoming)
    }

    /// Types, space separated.
    pub fn types_string(&self) -> String {
        triples::join_terms(&self.types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triples::LineParser;

    #[test]
    fn reset_empties() {
        let mut e = EntityRecord::new();
        e.set_metadata("http://doc\nhttp://me");
        e.add_outgoing(
            "<http://me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://T> .\n<http://me> <http://p> <http://o> .",
            &LineParser,
        );
        e.add_incoming("<http://other> <http://q> <http://me> .", &LineParser);
        assert!(!e.is_empty());

        e.reset();
        assert!(e.is_empty());
        assert_eq!(e.subject, "");
        assert_eq!(e.context, "");
        assert!(e.types.is_empty());
        assert!(e.outgoing.is_empty());
        assert!(e.incoming.is_empty());
        assert_eq!(e, EntityRecord::default());
    }

    #[test]
    fn metadata() {
        let mut e = EntityRecord::new();
        e.set_metadata("http://doc.example/page\nhttp://doc.example/page#me\n");
        assert_eq!(e.context, "http://doc.example/page");
        assert_eq!(e.subject, "http://doc.example/page#me");
    }

    #[test]
    fn metadata_no_newline() {
        let mut e = EntityRecord::new();
        e.subject = "stale".to_string();
        e.set_metadata("http://doc.example/page");
        assert_eq!(e.context, "http://doc.example/page");
        assert_eq!(e.subject, "");
    }

    #[test]
    fn blocks() {
        let mut e = EntityRecord::new();
        e.add_outgoing("<http://me> <http://p> <http://o> .", &LineParser);
        e.add_incoming("<http://other> <http://q> <http://me> .", &LineParser);
        assert_eq!(e.outgoing_triples(), "<http://p> <http://o> .\n");
        assert_eq!(e.incoming_triples(), "<http://q> <http://other> .\n");
        assert_eq!(e.types_string(), "");
    }
}
