//! The type-checked expression-language AST (E1).
//!
//! The external expression-language parser, type checker and macro expander
//! produce this tree; the compiler only ever reads it. Every node carries a
//! stable [`NodeId`] used to look up its inferred type in a [`crate::TypeMap`].
//! The tree has no shared ids — it is a tree, not a DAG.

/// Stable integer id for an AST node, used as the key into a [`crate::TypeMap`].
pub type NodeId = u64;

/// A literal value appearing directly in the source expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    /// A Unicode string literal.
    String(String),
    Bytes(Vec<u8>),
}

/// A struct or map literal.
///
/// `Named` is the message-construction form (`Name{f: v, ...}`); `Anonymous`
/// is the bare map form (`{k: v, ...}`). Only `Named` requires its keys to be
/// ASCII field-name identifiers — `Anonymous` keys are themselves
/// expressions and are only constrained to ASCII identifiers when lowered to
/// a `STRUCT(...)` construction.
#[derive(Debug, Clone, PartialEq)]
pub enum StructLiteral {
    Named {
        type_name: String,
        fields: Vec<(String, Expr)>,
    },
    Anonymous {
        entries: Vec<(Expr, Expr)>,
    },
}

/// A field selection: `operand.field`.
///
/// `test_only` is set exclusively by the `has()` macro and changes the
/// lowering to a presence test rather than a value read.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub operand: Box<Expr>,
    pub field: String,
    pub test_only: bool,
}

/// A call expression: a free function call, a method-style call when
/// `target` is set, an index operation, a unary/binary/ternary operator
/// application, or a built-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub target: Option<Box<Expr>>,
    pub function: String,
    pub args: Vec<Expr>,
}

/// The canonical desugared shape every comprehension macro (`all`, `exists`,
/// `exists_one`, `map`, `filter`, ...) is reduced to by the external expander.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionExpr {
    pub iter_range: Box<Expr>,
    pub iter_var: String,
    /// The index variable bound by two-variable comprehensions, if any.
    pub iter_var2: Option<String>,
    pub accu_var: String,
    pub accu_init: Box<Expr>,
    pub loop_condition: Box<Expr>,
    pub loop_step: Box<Expr>,
    pub result: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(Constant),
    Identifier(String),
    List(Vec<Expr>),
    Struct(StructLiteral),
    Select(SelectExpr),
    Call(CallExpr),
    Comprehension(ComprehensionExpr),
}

/// A single AST node: its stable id plus its variant payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn constant(id: NodeId, value: Constant) -> Self {
        Self::new(id, ExprKind::Constant(value))
    }

    pub fn ident(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, ExprKind::Identifier(name.into()))
    }

    pub fn list(id: NodeId, elements: Vec<Expr>) -> Self {
        Self::new(id, ExprKind::List(elements))
    }

    pub fn select(id: NodeId, operand: Expr, field: impl Into<String>, test_only: bool) -> Self {
        Self::new(
            id,
            ExprKind::Select(SelectExpr {
                operand: Box::new(operand),
                field: field.into(),
                test_only,
            }),
        )
    }

    pub fn call(
        id: NodeId,
        target: Option<Expr>,
        function: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::new(
            id,
            ExprKind::Call(CallExpr {
                target: target.map(Box::new),
                function: function.into(),
                args,
            }),
        )
    }

    pub fn comprehension(
        id: NodeId,
        iter_range: Expr,
        iter_var: impl Into<String>,
        iter_var2: Option<String>,
        accu_var: impl Into<String>,
        accu_init: Expr,
        loop_condition: Expr,
        loop_step: Expr,
        result: Expr,
    ) -> Self {
        Self::new(
            id,
            ExprKind::Comprehension(ComprehensionExpr {
                iter_range: Box::new(iter_range),
                iter_var: iter_var.into(),
                iter_var2,
                accu_var: accu_var.into(),
                accu_init: Box::new(accu_init),
                loop_condition: Box::new(loop_condition),
                loop_step: Box::new(loop_step),
                result: Box::new(result),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_builder_preserves_test_only_flag() {
        let operand = Expr::ident(1, "x");
        let sel = Expr::select(2, operand.clone(), "y", true);

        match sel.kind {
            ExprKind::Select(SelectExpr {
                operand: o,
                field,
                test_only,
            }) => {
                assert_eq!(*o, operand);
                assert_eq!(field, "y");
                assert!(test_only);
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn call_without_target_is_a_free_function() {
        let call = Expr::call(1, None, "size", vec![Expr::ident(2, "x")]);
        match call.kind {
            ExprKind::Call(CallExpr { target, function, args }) => {
                assert!(target.is_none());
                assert_eq!(function, "size");
                assert_eq!(args.len(), 1);
            }
            _ => panic!("expected Call"),
        }
    }
}
