//! The schema/type provider (C1): tells the compiler what tables, fields and
//! storage types exist, and whether a given field is JSON, JSONB or array.
//!
//! Two implementations are provided: [`StaticSchemaProvider`] for
//! programmatically-supplied schemas, and [`PostgresSchemaProvider`] for
//! live catalogue introspection. Both implement the shared [`SchemaProvider`]
//! trait the compiler depends on.

pub mod config;
pub mod error;
pub mod model;
pub mod postgres_provider;
pub mod provider;
pub mod static_provider;

pub use config::PostgresProviderConfig;
pub use error::{Result, SchemaError};
pub use model::{FieldSchema, JsonElementShape, SchemaMap, StorageType};
pub use postgres_provider::PostgresSchemaProvider;
pub use provider::SchemaProvider;
pub use static_provider::StaticSchemaProvider;
