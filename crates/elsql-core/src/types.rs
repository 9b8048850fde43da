//! EL type tags (E2) and the node-id → type map produced by the external
//! type checker.

use std::collections::HashMap;

use crate::ast::NodeId;

/// The closed set of EL types the compiler dispatches on.
///
/// Type equality is structural, matching the data model's definition of E2.
#[derive(Debug, Clone, PartialEq)]
pub enum ElType {
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Null,

    /// Well-known timestamp type.
    Timestamp,
    /// Well-known duration type.
    Duration,

    /// Abstract domain-specific types, carried by storage class rather than
    /// internal structure.
    Date,
    Time,
    DateTime,
    Interval,
    DatePart,

    /// A JSON or JSONB column: type-erased at the EL level.
    Dynamic,

    List(Box<ElType>),
    Map(Box<ElType>, Box<ElType>),
    Object(String),
}

impl ElType {
    pub fn list_of(elem: ElType) -> Self {
        ElType::List(Box::new(elem))
    }

    pub fn map_of(key: ElType, value: ElType) -> Self {
        ElType::Map(Box::new(key), Box::new(value))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ElType::Int | ElType::Uint | ElType::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ElType::String)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ElType::List(_))
    }

    pub fn is_timestamp_family(&self) -> bool {
        matches!(self, ElType::Timestamp | ElType::DateTime)
    }

    pub fn is_duration_family(&self) -> bool {
        matches!(self, ElType::Duration | ElType::Interval)
    }
}

/// A total mapping from AST node id to its inferred EL type.
///
/// Total over every id reachable from the root of a well-formed,
/// type-checked tree; lookups for ids outside that tree return `None`.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: HashMap<NodeId, ElType>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, ty: ElType) -> &mut Self {
        self.types.insert(id, ty);
        self
    }

    pub fn get(&self, id: NodeId) -> Option<&ElType> {
        self.types.get(&id)
    }

    pub fn type_of(&self, expr: &crate::ast::Expr) -> Option<&ElType> {
        self.get(expr.id)
    }
}
