//! The schema model (E3): storage types, field schemas and the table map.

use elsql_core::ElType;

/// The storage-level type of a column, as reported by a schema source.
///
/// This is the pre-mapping representation; [`FieldSchema::el_type`] applies
/// the fixed storage-family → EL-type mapping from the type provider's
/// contract.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageType {
    /// `text`, `varchar`, `char`, ...
    Text,
    /// `bytea`.
    Bytea,
    Boolean,
    /// `smallint`, `integer`, `bigint`, ...
    Integer,
    /// `real`, `double precision`, `numeric`, `decimal`, ...
    Numeric,
    TimestampTz,
    Timestamp,
    Date,
    TimeTz,
    Time,
    Json,
    Jsonb,
    /// A nested composite type with its own field sequence.
    Composite(Vec<FieldSchema>),
    /// A storage family the provider does not recognise; treated as `string`
    /// per the type provider's default-mapping rule.
    Other(String),
}

/// The declared element shape of a JSON/JSONB array field, used to choose
/// between the `_text` and object-returning array expander functions instead
/// of guessing from the field's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonElementShape {
    /// Elements are JSON scalars (strings, numbers, booleans); expand with
    /// `json[b]_array_elements_text`.
    Scalar,
    /// Elements are JSON objects; expand with `json[b]_array_elements`.
    Object,
}

/// A single column/field in a table or composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub storage: StorageType,
    /// True iff this field is array-valued at the storage level.
    pub repeated: bool,
    /// For a JSON/JSONB field that is itself an array, the shape of its
    /// elements. `None` for non-array or non-JSON fields, and for arrays
    /// whose element shape the caller has not declared.
    pub json_element_shape: Option<JsonElementShape>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, storage: StorageType, repeated: bool) -> Self {
        Self {
            name: name.into(),
            storage,
            repeated,
            json_element_shape: None,
        }
    }

    #[must_use]
    pub fn with_json_element_shape(mut self, shape: JsonElementShape) -> Self {
        self.json_element_shape = Some(shape);
        self
    }

    pub fn is_json(&self) -> bool {
        matches!(self.storage, StorageType::Json)
    }

    pub fn is_jsonb(&self) -> bool {
        matches!(self.storage, StorageType::Jsonb)
    }

    /// True for either JSON-ness flavour; this is what the JSON path builder
    /// checks to decide whether a select chain roots in a JSON column.
    pub fn is_json_like(&self) -> bool {
        self.is_json() || self.is_jsonb()
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.storage, StorageType::Composite(_))
    }

    /// Apply the fixed storage-family → EL-type mapping (§4.1) from the
    /// point of view of a field owned by `owner` (used to name nested
    /// composite object types as `owner.field`).
    pub fn el_type(&self, owner: &str) -> ElType {
        let base = match &self.storage {
            StorageType::Text => ElType::String,
            StorageType::Bytea => ElType::Bytes,
            StorageType::Boolean => ElType::Bool,
            StorageType::Integer => ElType::Int,
            StorageType::Numeric => ElType::Double,
            StorageType::TimestampTz | StorageType::Timestamp => ElType::Timestamp,
            StorageType::Date => ElType::Date,
            StorageType::TimeTz | StorageType::Time => ElType::Time,
            StorageType::Json | StorageType::Jsonb => ElType::Dynamic,
            StorageType::Composite(_) => ElType::Object(format!("{owner}.{}", self.name)),
            StorageType::Other(_) => ElType::String,
        };
        if self.repeated {
            ElType::list_of(base)
        } else {
            base
        }
    }
}

/// The schema provider's table map: an ordered field sequence per table
/// name. Field names are unique within a table and table names are unique in
/// the map, matching the E3 invariants.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    tables: std::collections::HashMap<String, Vec<FieldSchema>>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, name: impl Into<String>, fields: Vec<FieldSchema>) {
        self.tables.insert(name.into(), fields);
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_fields(&self, name: &str) -> Option<&[FieldSchema]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn field(&self, table: &str, field: &str) -> Option<FieldSchema> {
        self.table_fields(table)?
            .iter()
            .find(|f| f.name == field)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_uniqueness_wins_first_match() {
        let mut map = SchemaMap::new();
        map.insert_table(
            "events",
            vec![
                FieldSchema::new("id", StorageType::Integer, false),
                FieldSchema::new("payload", StorageType::Jsonb, false),
            ],
        );

        assert!(map.has_table("events"));
        assert!(!map.has_table("unknown"));
        assert_eq!(
            map.field("events", "payload"),
            Some(FieldSchema::new("payload", StorageType::Jsonb, false))
        );
        assert_eq!(map.field("events", "missing"), None);
    }

    #[test]
    fn el_type_mapping_matches_storage_family_table() {
        let owner = "events";
        assert_eq!(
            FieldSchema::new("name", StorageType::Text, false).el_type(owner),
            ElType::String
        );
        assert_eq!(
            FieldSchema::new("tags", StorageType::Text, true).el_type(owner),
            ElType::list_of(ElType::String)
        );
        assert_eq!(
            FieldSchema::new("metadata", StorageType::Jsonb, false).el_type(owner),
            ElType::Dynamic
        );
        assert_eq!(
            FieldSchema::new("unknown_type", StorageType::Other("box".into()), false)
                .el_type(owner),
            ElType::String
        );
        let nested = FieldSchema::new("address", StorageType::Composite(vec![]), false);
        assert_eq!(nested.el_type(owner), ElType::Object("events.address".into()));
    }

    #[test]
    fn json_like_covers_both_json_and_jsonb() {
        assert!(FieldSchema::new("a", StorageType::Json, false).is_json_like());
        assert!(FieldSchema::new("a", StorageType::Jsonb, false).is_json_like());
        assert!(!FieldSchema::new("a", StorageType::Text, false).is_json_like());
    }

    #[test]
    fn json_element_shape_defaults_to_unknown_until_declared() {
        let scores = FieldSchema::new("scores", StorageType::Jsonb, true);
        assert_eq!(scores.json_element_shape, None);

        let declared = scores.with_json_element_shape(JsonElementShape::Scalar);
        assert_eq!(declared.json_element_shape, Some(JsonElementShape::Scalar));
    }
}
