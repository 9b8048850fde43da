//! Type-checked expression-language AST and type tags.
//!
//! This crate defines the data the elsql compiler consumes opaquely: the
//! node tree produced by an external expression-language parser, type
//! checker and macro expander, plus the closed set of inferred types those
//! nodes can carry. Nothing in this crate parses expression-language source
//! or infers types — it only describes the shapes the rest of the workspace
//! walks.

pub mod ast;
pub mod types;

pub use ast::{CallExpr, ComprehensionExpr, Constant, Expr, ExprKind, NodeId, SelectExpr, StructLiteral};
pub use types::{ElType, TypeMap};
