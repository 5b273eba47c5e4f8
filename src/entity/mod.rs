/*! Entities

An entity is the set of triples describing one subject. In the dumps, an entity is described
by three files, in this order:

- `metadata`: the URL of the source document on the first line, the entity URI on the second one,
- `outgoing-triples.nt`: statements where the entity is the subject,
- `incoming-triples.nt`: statements where the entity is the object.

Depending on the dataset [Format], an entity is made of one such group of files (document-keyed),
or of every group sharing the same top-level folder (entity-keyed).
!*/
mod boundary;
mod record;

pub use boundary::{EntityReader, Format, MAX_ENTITY_SIZE};
pub use record::EntityRecord;
