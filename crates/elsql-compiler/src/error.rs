use elsql_core::NodeId;
use thiserror::Error;

/// The compiler's error taxonomy. Every variant short-circuits the walker;
/// no partial SQL is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("node {0}: unsupported AST node")]
    UnsupportedNode(NodeId),

    #[error("node {0}: unsupported operator '{1}'")]
    UnsupportedOperator(NodeId, String),

    #[error("node {0}: could not recognise comprehension shape")]
    UnrecognisedComprehension(NodeId),

    #[error("node {0}: '{1}' is not a valid field name")]
    BadFieldName(NodeId, String),

    #[error("node {0}: unexpected constant kind, expected {1}")]
    BadConstantKind(NodeId, &'static str),

    #[error("node {0}: wrong argument count for '{1}': expected {2}, got {3}")]
    BadArgumentCount(NodeId, String, usize, usize),

    #[error("node {0}: invalid duration literal '{1}'")]
    BadDurationLiteral(NodeId, String),

    #[error("node {0}: regex literal rejected: {1}")]
    BadRegexLiteral(NodeId, #[source] elsql_regex::RegexError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
