//! The type provider contract (C1): the surface the compiler uses to ask
//! "does this name a struct", "what fields does it have", and "what EL type
//! does this field carry".

use async_trait::async_trait;

use elsql_core::ElType;

use crate::error::{Result, SchemaError};
use crate::model::{FieldSchema, StorageType};

/// A source of schema information for the compiler's type-directed lowering.
///
/// Implementors back this with whatever they like — a static map built at
/// startup, a live catalogue connection, a test fixture. The synchronous
/// lookup methods are expected to be cheap; providers that need I/O to
/// populate their data do that ahead of time via [`SchemaProvider::load_table_schema`].
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// True iff `name` is a known table/struct root.
    fn find_struct(&self, name: &str) -> bool;

    /// The field names declared on `struct_name`, in declaration order.
    fn find_field_names(&self, struct_name: &str) -> Option<Vec<String>>;

    /// The full schema of a single field, including its storage type and
    /// array-ness. Returns an owned value so callers holding a lock-guarded
    /// cache (see [`crate::postgres_provider::PostgresSchemaProvider`]) never
    /// have to thread its lifetime through the caller.
    fn find_field_schema(&self, struct_name: &str, field_name: &str) -> Option<FieldSchema>;

    /// The EL type a field resolves to, per the storage-family mapping in
    /// [`FieldSchema::el_type`].
    fn find_field_type(&self, struct_name: &str, field_name: &str) -> Option<ElType> {
        self.find_field_schema(struct_name, field_name)
            .map(|field| field.el_type(struct_name))
    }

    /// Populate this provider's schema for `name` from its backing source.
    /// Providers that are already fully populated (e.g. a static map) can
    /// leave this at its default, which reports the provider as unconfigured
    /// for on-demand loading.
    async fn load_table_schema(&self, _name: &str) -> Result<()> {
        Err(SchemaError::ProviderUnconfigured)
    }

    /// Release any resources this provider holds (connection pools, ...).
    /// Providers with nothing to release can leave this at its default.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Walk a `table.seg1.seg2...` select chain looking for the first
    /// segment whose field is JSON or JSONB, descending through nested
    /// composite fields along the way.
    ///
    /// Returns the index into `segments` of the JSON root and its schema, so
    /// the JSON path builder can treat every remaining segment as a JSON path
    /// step rather than a further column/field lookup. Returns `None` when no
    /// segment in the chain is JSON-like, which tells the caller this is an
    /// ordinary (non-JSON) select chain.
    fn locate_json_root(&self, table: &str, segments: &[&str]) -> Option<(usize, FieldSchema)> {
        if segments.is_empty() {
            return None;
        }

        let mut owner = table.to_string();
        let mut siblings: Option<Vec<FieldSchema>> = None;

        for (index, segment) in segments.iter().enumerate() {
            let field = match &siblings {
                Some(fields) => fields.iter().find(|f| f.name == *segment)?.clone(),
                None => self.find_field_schema(&owner, segment)?,
            };

            if field.is_json_like() {
                return Some((index, field));
            }

            match &field.storage {
                StorageType::Composite(nested) => {
                    siblings = Some(nested.clone());
                    owner = format!("{owner}.{segment}");
                }
                _ => return None,
            }
        }

        None
    }
}
