//! Line-oriented N-Triples parsers.
//!
//! Parsers never fail: a line that does not have the shape of a statement yields [None]
//! and is dropped by the caller.
use std::borrow::Cow;

use oxrdfio::{RdfFormat, RdfParser};

/// A statement, terms in their N-Triples lexical form (`<iri>`, `_:label`, `"literal"@en`...).
///
/// Terms borrow from the parsed line unless the parser had to rewrite them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple<'a> {
    pub subject: Cow<'a, str>,
    pub predicate: Cow<'a, str>,
    pub object: Cow<'a, str>,
}

pub trait TripleParser {
    /// Parse a single line. Returns [None] on blank lines, comments and malformed statements.
    fn parse_line<'a>(&self, line: &'a str) -> Option<Triple<'a>>;
}

/// Permissive parser.
///
/// Splits the line on the first two separators and the trailing dot. Only the rough shape of
/// the terms is checked, literals are taken as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineParser;

impl TripleParser for LineParser {
    fn parse_line<'a>(&self, line: &'a str) -> Option<Triple<'a>> {
        let line = statement_body(line)?;

        let (subject, rest) = line.split_once(is_separator)?;
        let (predicate, object) = rest.trim_start_matches(is_separator).split_once(is_separator)?;
        let object = object.trim();

        if !(is_iri(subject) || is_blank_node(subject)) || !is_iri(predicate) || object.is_empty()
        {
            return None;
        }

        Some(Triple {
            subject: Cow::Borrowed(subject),
            predicate: Cow::Borrowed(predicate),
            object: Cow::Borrowed(object),
        })
    }
}

/// Strict parser, backed by the `oxrdfio` N-Triples parser.
///
/// Statements must follow the N-Triples grammar (valid IRIs, escapes, language tags and datatypes).
/// Terms are written back in canonical form: escapes such as `\u00E9` are decoded, so that
/// `"caf\u00E9"` and `"café"` are the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictParser;

impl TripleParser for StrictParser {
    fn parse_line<'a>(&self, line: &'a str) -> Option<Triple<'a>> {
        statement_body(line)?;

        let quad = RdfParser::from_format(RdfFormat::NTriples)
            .for_reader(line.as_bytes())
            .next()?
            .ok()?;

        Some(Triple {
            subject: Cow::Owned(quad.subject.to_string()),
            predicate: Cow::Owned(quad.predicate.to_string()),
            object: Cow::Owned(quad.object.to_string()),
        })
    }
}

/// Parser selection, so that the choice can travel through options without trait objects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    #[default]
    Line,
    Strict,
}

impl TripleParser for ParserKind {
    fn parse_line<'a>(&self, line: &'a str) -> Option<Triple<'a>> {
        match self {
            ParserKind::Line => LineParser.parse_line(line),
            ParserKind::Strict => StrictParser.parse_line(line),
        }
    }
}

/// Trim the line and strip the statement terminator.
/// Blank lines and comments yield [None].
fn statement_body(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.strip_suffix('.').map(str::trim_end)
}

#[inline]
fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
fn is_iri(token: &str) -> bool {
    token.len() > 2 && token.starts_with('<') && token.ends_with('>')
}

#[inline]
fn is_blank_node(token: &str) -> bool {
    token.len() > 2 && token.starts_with("_:")
}
