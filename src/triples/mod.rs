/*! N-Triples handling

Statements are read line by line by a [TripleParser], then regrouped by predicate
into a *canonical block*: one line per predicate, sorted by predicate, holding every
distinct value associated with it.

```text
<http://xmlns.com/foaf/0.1/knows> <http://a> <http://b> .
<http://xmlns.com/foaf/0.1/name> "Alice" .
```

Grouping the values of a shared predicate into a single line both compresses the index
and keeps the predicate/value position information queryable.
!*/
mod canonical;
mod parser;

pub use canonical::{
    canonicalize, flatten, join_terms, Direction, PredicateMap, Stats, TypeSet, MAX_VALUES,
    RDF_TYPE,
};
pub use parser::{LineParser, ParserKind, StrictParser, Triple, TripleParser};
