//! Predicate grouping of statements.
use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use super::parser::{Triple, TripleParser};

/// `rdf:type` predicate. Its objects go to the type set instead of the predicate map.
pub const RDF_TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";

/// Maximum number of values kept for a single predicate (2^16 - 1).
pub const MAX_VALUES: usize = 65_535;

pub type TypeSet = BTreeSet<String>;

/// predicate -> distinct values.
pub type PredicateMap = BTreeMap<String, BTreeSet<String>>;

/// Which term of a statement is kept as the value of its predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The entity is the subject, keep objects.
    Outgoing,
    /// The entity is the object, keep subjects.
    Incoming,
}

/// Counters of a [canonicalize] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// valid statements
    pub parsed: usize,
    /// non-blank, non-comment lines that could not be parsed
    pub skipped: usize,
    /// values dropped because their predicate was full
    pub dropped: usize,
}

/// Parse `text` and merge its statements into `map`.
///
/// If `types` is provided, objects of `rdf:type` statements are put there and the statements
/// are kept out of `map`. Otherwise they are treated like any other predicate.
///
/// Malformed lines are silently skipped.
pub fn canonicalize<P: TripleParser + ?Sized>(
    text: &str,
    parser: &P,
    direction: Direction,
    mut types: Option<&mut TypeSet>,
    map: &mut PredicateMap,
) -> Stats {
    let mut stats = Stats::default();

    for line in text.lines() {
        let triple = match parser.parse_line(line) {
            Some(t) => t,
            None => {
                let line = line.trim_start();
                if !line.is_empty() && !line.starts_with('#') {
                    stats.skipped += 1;
                }
                continue;
            }
        };
        stats.parsed += 1;

        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        if predicate == RDF_TYPE {
            if let Some(types) = types.as_deref_mut() {
                if !types.contains(&*object) {
                    types.insert(object.into_owned());
                }
                continue;
            }
        }

        let term = match direction {
            Direction::Outgoing => object,
            Direction::Incoming => subject,
        };

        if !map.contains_key(&*predicate) {
            map.insert(predicate.to_string(), BTreeSet::new());
        }
        if let Some(values) = map.get_mut(&*predicate) {
            if !values.contains(&*term) {
                if values.len() < MAX_VALUES {
                    values.insert(term.into_owned());
                } else {
                    stats.dropped += 1;
                }
            }
        }
    }

    trace!(
        "{:?}: {} statements, {} skipped lines, {} dropped values",
        direction,
        stats.parsed,
        stats.skipped,
        stats.dropped
    );
    stats
}

/// Flatten a predicate map into its canonical block.
///
/// One line per predicate, in ascending order:
/// `<predicate> <value1> <value2> ... .`
pub fn flatten(map: &PredicateMap) -> String {
    let mut out = String::new();
    for (predicate, values) in map {
        out.push_str(predicate);
        for value in values {
            out.push(' ');
            out.push_str(value);
        }
        out.push_str(" .\n");
    }
    out
}

/// Space-separated terms, ending with a dot.
/// An empty set gives an empty string.
pub fn join_terms(terms: &BTreeSet<String>) -> String {
    if terms.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for term in terms {
        out.push_str(term);
        out.push(' ');
    }
    out.push_str(".\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triples::{LineParser, ParserKind, StrictParser};

    const NT: &str = r#"<http://a> <http://b> <http://c> .
<http://a> <http://b> <http://d> .
<http://a> <http://b> <http://c> .
<http://a> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://T> .
<http://a> <http://name> "Alice"@en .
not a triple at all
<http://a> <http://broken> <http://x>
"#;

    fn outgoing(text: &str) -> (TypeSet, PredicateMap, Stats) {
        let mut types = TypeSet::new();
        let mut map = PredicateMap::new();
        let stats = canonicalize(
            text,
            &LineParser,
            Direction::Outgoing,
            Some(&mut types),
            &mut map,
        );
        (types, map, stats)
    }

    #[test]
    fn single_triple_directions() {
        let line = "<http://a> <http://b> <http://c> .";

        let (_, map, _) = outgoing(line);
        assert!(flatten(&map).contains("<http://b> <http://c> ."));

        let mut map = PredicateMap::new();
        canonicalize(line, &LineParser, Direction::Incoming, None, &mut map);
        assert!(flatten(&map).contains("<http://b> <http://a> ."));
    }

    #[test]
    fn groups_and_dedups() {
        let (types, map, stats) = outgoing(NT);

        assert_eq!(stats.parsed, 5);
        assert_eq!(stats.skipped, 2);

        let b: Vec<&str> = map["<http://b>"].iter().map(String::as_str).collect();
        assert_eq!(b, vec!["<http://c>", "<http://d>"]);
        assert!(map.contains_key("<http://name>"));
        assert!(!map.contains_key("<http://broken>"));

        assert_eq!(types.len(), 1);
        assert!(types.contains("<http://T>"));
    }

    #[test]
    fn rdf_type_only_in_types() {
        let (types, map, _) = outgoing(NT);
        assert!(!map.contains_key(RDF_TYPE));
        assert!(types.contains("<http://T>"));

        // without a type sink, rdf:type is a regular predicate
        let mut map = PredicateMap::new();
        canonicalize(NT, &LineParser, Direction::Incoming, None, &mut map);
        assert!(map[RDF_TYPE].contains("<http://a>"));
    }

    #[test]
    fn flatten_sorted() {
        let (_, map, _) = outgoing(NT);
        let block = flatten(&map);
        assert_eq!(
            block,
            "<http://b> <http://c> <http://d> .\n<http://name> \"Alice\"@en .\n"
        );
    }

    #[test]
    fn cap_values() {
        let mut text = String::new();
        for i in 0..(MAX_VALUES + 10) {
            text.push_str(&format!("<http://s> <http://p> <http://o/{}> .\n", i));
        }
        let (_, map, stats) = outgoing(&text);
        assert_eq!(map["<http://p>"].len(), MAX_VALUES);
        assert_eq!(stats.dropped, 10);
    }

    #[test]
    fn cap_keeps_known_values() {
        let mut map = PredicateMap::new();
        let mut text = String::new();
        for i in 0..MAX_VALUES {
            text.push_str(&format!("<http://s> <http://p> <http://o/{}> .\n", i));
        }
        // already present value on a full predicate is not a drop
        text.push_str("<http://s> <http://p> <http://o/0> .\n");
        let stats = canonicalize(&text, &LineParser, Direction::Outgoing, None, &mut map);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn empty_input() {
        let (types, map, stats) = outgoing("\n\n# only a comment\n");
        assert!(types.is_empty());
        assert!(map.is_empty());
        assert_eq!(stats, Stats::default());
        assert_eq!(flatten(&map), "");
    }

    /// Split a block line on the spaces that are outside of literals.
    fn split_terms(line: &str) -> Vec<String> {
        let mut terms = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut escaped = false;
        for c in line.chars() {
            match c {
                _ if escaped => escaped = false,
                '\\' if in_quotes => escaped = true,
                '"' => in_quotes = !in_quotes,
                ' ' if !in_quotes => {
                    terms.push(std::mem::take(&mut current));
                    continue;
                }
                _ => (),
            }
            current.push(c);
        }
        terms.push(current);
        terms
    }

    #[test]
    fn reparse_block_gives_same_sets() {
        let text = r#"<http://s> <http://p1> <http://o1> .
<http://s> <http://p2> _:b1 .
<http://s> <http://p1> <http://o2> .
<http://s> <http://p3> "lit" .
<http://s> <http://p3> "a literal with spaces"@en .
<http://s> <http://p3> "quoted \" and spaced . value" .
<http://s> <http://p1> <http://o1> .
<http://s> <http://p2> <http://o3> .
"#;
        for parser in [ParserKind::Line, ParserKind::Strict] {
            let mut map = PredicateMap::new();
            let stats = canonicalize(text, &parser, Direction::Outgoing, None, &mut map);
            assert_eq!(stats.parsed, 8);
            let block = flatten(&map);

            let mut reparsed = PredicateMap::new();
            for line in block.lines() {
                let mut terms = split_terms(line.strip_suffix(" .").unwrap()).into_iter();
                let predicate = terms.next().unwrap();
                reparsed.entry(predicate).or_default().extend(terms);
            }
            assert_eq!(map, reparsed);
            assert_eq!(map["<http://p3>"].len(), 3);
        }
    }

    #[test]
    fn strict_parser_merges_escaped_values() {
        let text = "<http://a> <http://b> \"caf\\u00E9\" .\n<http://a> <http://b> \"café\" .\n";

        let mut map = PredicateMap::new();
        canonicalize(text, &StrictParser, Direction::Outgoing, None, &mut map);
        assert_eq!(flatten(&map), "<http://b> \"café\" .\n");

        // lexical forms differ
        let mut map = PredicateMap::new();
        canonicalize(text, &LineParser, Direction::Outgoing, None, &mut map);
        assert_eq!(map["<http://b>"].len(), 2);
    }

    #[test]
    fn strict_parser_drops_more() {
        let text = "<http://a> <http://b> foo .\n<http://a> <http://b> <http://c> .\n";
        let mut map = PredicateMap::new();
        let stats = canonicalize(text, &StrictParser, Direction::Outgoing, None, &mut map);
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn join() {
        let mut set = BTreeSet::new();
        assert_eq!(join_terms(&set), "");
        set.insert("<http://T2>".to_string());
        set.insert("<http://T1>".to_string());
        assert_eq!(join_terms(&set), "<http://T1> <http://T2> .\n");
    }
}
