use thiserror::Error;

/// Errors surfaced by the schema/type provider.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `load-table-schema` was invoked on a provider with no connection
    /// pool configured.
    #[error("schema provider has no database connection configured")]
    ProviderUnconfigured,

    /// A database error encountered while introspecting the catalogue.
    /// Reported verbatim, per the type provider's failure semantics.
    #[error("database error while loading schema: {0}")]
    ProviderIo(#[from] sqlx_core::error::Error),

    #[error("unrecognised catalogue data type '{0}' for column '{1}'")]
    UnrecognisedCatalogueType(String, String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
