//! A [`crate::SchemaProvider`] backed by a pre-built, in-memory [`SchemaMap`].
//!
//! Used for embedded schemas and in tests where standing up a database is
//! unnecessary overhead.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FieldSchema, SchemaMap};
use crate::provider::SchemaProvider;

#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    schema: SchemaMap,
}

impl StaticSchemaProvider {
    pub fn new(schema: SchemaMap) -> Self {
        Self { schema }
    }

    /// Start from an empty map and add tables with [`StaticSchemaProvider::with_table`].
    pub fn builder() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        self.schema.insert_table(name, fields);
        self
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    fn find_struct(&self, name: &str) -> bool {
        self.schema.has_table(name)
    }

    fn find_field_names(&self, struct_name: &str) -> Option<Vec<String>> {
        self.schema
            .table_fields(struct_name)
            .map(|fields| fields.iter().map(|f| f.name.clone()).collect())
    }

    fn find_field_schema(&self, struct_name: &str, field_name: &str) -> Option<FieldSchema> {
        self.schema.field(struct_name, field_name)
    }

    async fn load_table_schema(&self, name: &str) -> Result<()> {
        if self.schema.has_table(name) {
            Ok(())
        } else {
            Err(crate::error::SchemaError::ProviderUnconfigured)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageType;

    #[test]
    fn builder_accumulates_tables() {
        let provider = StaticSchemaProvider::builder()
            .with_table(
                "events",
                vec![FieldSchema::new("id", StorageType::Integer, false)],
            )
            .with_table(
                "users",
                vec![FieldSchema::new("name", StorageType::Text, false)],
            );

        assert!(provider.find_struct("events"));
        assert!(provider.find_struct("users"));
        assert!(!provider.find_struct("missing"));
        assert_eq!(
            provider.find_field_names("events"),
            Some(vec!["id".to_string()])
        );
    }

    #[tokio::test]
    async fn load_table_schema_is_ok_for_known_table_err_otherwise() {
        let provider = StaticSchemaProvider::builder().with_table("events", vec![]);
        assert!(provider.load_table_schema("events").await.is_ok());
        assert!(provider.load_table_schema("missing").await.is_err());
    }
}
