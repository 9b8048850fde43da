//! Lowers a type-checked expression-language AST into a single PostgreSQL
//! expression fragment, suitable for splicing into a `WHERE` clause.
//!
//! The compiler is a pure function of its three inputs — the AST, the
//! node-id → type map the external type checker produced, and a schema
//! provider — with no I/O of its own and no state that outlives one call to
//! [`compile`]. It is organised as four supporting components feeding a
//! single walker:
//!
//! - [`mod@comprehension`]: recognises which macro (`all`, `exists`, `map`, ...)
//!   a desugared comprehension came from.
//! - [`mod@jsonpath`]: builds PostgreSQL JSON/JSONB navigation chains.
//! - [`mod@duration`]: parses Go-style duration literals into `INTERVAL` text.
//! - [`walker`]: the recursive-descent lowering pass tying the above
//!   together with [`elsql_schema::SchemaProvider`] lookups.

pub mod comprehension;
pub mod duration;
pub mod error;
pub mod jsonpath;
mod walker;

pub use error::{CompileError, Result};
pub use walker::compile;
