/*! Entity document

The unit handed to an [super::IndexWriter]: four fields built from an [EntityRecord].
!*/
use crate::entity::EntityRecord;

pub const SUBJECT: &str = "subject";
pub const TYPE: &str = "type";
pub const OUTGOING_TRIPLE: &str = "outgoing-triple";
pub const INCOMING_TRIPLE: &str = "incoming-triple";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    value: String,
    /// value is kept in the index
    stored: bool,
    /// value is searchable
    indexed: bool,
}

impl Field {
    pub fn new(name: &'static str, value: String, stored: bool, indexed: bool) -> Self {
        Self {
            name,
            value,
            stored,
            indexed,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn stored(&self) -> bool {
        self.stored
    }

    pub fn indexed(&self) -> bool {
        self.indexed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityDocument {
    fields: Vec<Field>,
}

impl EntityDocument {
    /// Build the document of an entity.
    ///
    /// Subject and types are stored only, triples are searchable and stored if `store_triples` is set.
    pub fn from_record(record: &EntityRecord, store_triples: bool) -> Self {
        Self {
            fields: vec![
                Field::new(SUBJECT, record.subject.clone(), true, false),
                Field::new(TYPE, record.types_string(), true, false),
                Field::new(
                    OUTGOING_TRIPLE,
                    record.outgoing_triples(),
                    store_triples,
                    true,
                ),
                Field::new(
                    INCOMING_TRIPLE,
                    record.incoming_triples(),
                    store_triples,
                    true,
                ),
            ],
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value of the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(Field::value)
    }
}

#[cfg(test)]
mod tests {
    use crate::triples::LineParser;

    use super::*;

    #[test]
    fn fields() {
        let mut record = EntityRecord::new();
        record.set_metadata("http://doc\nhttp://me");
        record.add_outgoing(
            "<http://me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://T> .\n<http://me> <http://p> <http://o> .",
            &LineParser,
        );

        let doc = EntityDocument::from_record(&record, false);
        assert_eq!(doc.get(SUBJECT), Some("http://me"));
        assert_eq!(doc.get(TYPE), Some("<http://T> .\n"));
        assert_eq!(doc.get(OUTGOING_TRIPLE), Some("<http://p> <http://o> .\n"));
        assert_eq!(doc.get(INCOMING_TRIPLE), Some(""));
        assert_eq!(doc.get("context"), None);

        let stored: Vec<&str> = doc
            .fields()
            .iter()
            .filter(|f| f.stored())
            .map(Field::name)
            .collect();
        assert_eq!(stored, vec![SUBJECT, TYPE]);

        let doc = EntityDocument::from_record(&record, true);
        assert!(doc.fields().iter().all(Field::stored));
    }
}
