//! Comprehension shape recognition (C3).
//!
//! The external macro expander reduces every list comprehension (`all`,
//! `exists`, `exists_one`, `map`, `filter`, the two-clause `map`+`filter`
//! form) to the same `(iter-range, iter-var, accu-var, accu-init,
//! loop-condition, loop-step, result)` shape. This module reverses that
//! reduction by pattern-matching the accumulator initialiser and the
//! structural shape of the loop step, with no reference to types.
//!
//! Ternary conditionals, here and in the surface AST, are represented as a
//! target-less call to the function `cond` with exactly three arguments:
//! `cond(condition, then, else)`.

use elsql_core::{CallExpr, Constant, ComprehensionExpr, Expr, ExprKind};

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    All,
    Exists,
    ExistsOne,
    Map,
    MapWithFilter,
    Filter,
}

/// The comprehension's macro kind plus the sub-expressions the kind implies:
/// a predicate for `all`/`exists`/`exists_one`/`filter`, a filter condition
/// for `map-with-filter`, and a transform for `map`/`map-with-filter`.
pub struct Recognised<'a> {
    pub kind: ComprehensionKind,
    pub predicate: Option<&'a Expr>,
    pub filter: Option<&'a Expr>,
    pub transform: Option<&'a Expr>,
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(&expr.kind, ExprKind::Identifier(id) if id == name)
}

fn as_cond_call(expr: &Expr) -> Option<&CallExpr> {
    match &expr.kind {
        ExprKind::Call(call) if call.target.is_none() && call.function == "cond" && call.args.len() == 3 => {
            Some(call)
        }
        _ => None,
    }
}

fn as_binary_call<'a>(expr: &'a Expr, op: &str) -> Option<&'a CallExpr> {
    match &expr.kind {
        ExprKind::Call(call)
            if call.target.is_none() && call.function == op && call.args.len() == 2 =>
        {
            Some(call)
        }
        _ => None,
    }
}

/// Given `accu + [elem]`, return `elem`'s expression.
fn accu_plus_singleton_list<'a>(expr: &'a Expr, accu_var: &str) -> Option<&'a Expr> {
    let call = as_binary_call(expr, "+")?;
    if !is_ident(&call.args[0], accu_var) {
        return None;
    }
    match &call.args[1].kind {
        ExprKind::List(elements) if elements.len() == 1 => Some(&elements[0]),
        _ => None,
    }
}

pub fn recognise(comp: &ComprehensionExpr) -> Result<Recognised<'_>> {
    let accu_var = comp.accu_var.as_str();
    let iter_var = comp.iter_var.as_str();

    match &comp.accu_init.kind {
        ExprKind::Constant(Constant::Bool(true)) => {
            let call = as_binary_call(&comp.loop_step, "&&")
                .ok_or(CompileError::UnrecognisedComprehension(comp.loop_step.id))?;
            let predicate = if is_ident(&call.args[0], accu_var) {
                &call.args[1]
            } else if is_ident(&call.args[1], accu_var) {
                &call.args[0]
            } else {
                return Err(CompileError::UnrecognisedComprehension(comp.loop_step.id));
            };
            Ok(Recognised {
                kind: ComprehensionKind::All,
                predicate: Some(predicate),
                filter: None,
                transform: None,
            })
        }

        ExprKind::Constant(Constant::Bool(false)) => {
            let call = as_binary_call(&comp.loop_step, "||")
                .ok_or(CompileError::UnrecognisedComprehension(comp.loop_step.id))?;
            let predicate = if is_ident(&call.args[0], accu_var) {
                &call.args[1]
            } else if is_ident(&call.args[1], accu_var) {
                &call.args[0]
            } else {
                return Err(CompileError::UnrecognisedComprehension(comp.loop_step.id));
            };
            Ok(Recognised {
                kind: ComprehensionKind::Exists,
                predicate: Some(predicate),
                filter: None,
                transform: None,
            })
        }

        ExprKind::Constant(Constant::Int(0)) | ExprKind::Constant(Constant::Uint(0)) => {
            let call = as_cond_call(&comp.loop_step)
                .ok_or(CompileError::UnrecognisedComprehension(comp.loop_step.id))?;
            let then_is_increment = as_binary_call(&call.args[1], "+")
                .map(|plus| is_ident(&plus.args[0], accu_var))
                .unwrap_or(false);
            if !then_is_increment || !is_ident(&call.args[2], accu_var) {
                return Err(CompileError::UnrecognisedComprehension(comp.loop_step.id));
            }
            Ok(Recognised {
                kind: ComprehensionKind::ExistsOne,
                predicate: Some(&call.args[0]),
                filter: None,
                transform: None,
            })
        }

        ExprKind::List(elements) if elements.is_empty() => {
            if let Some(transform) = accu_plus_singleton_list(&comp.loop_step, accu_var) {
                return Ok(Recognised {
                    kind: ComprehensionKind::Map,
                    predicate: None,
                    filter: None,
                    transform: Some(transform),
                });
            }

            let call = as_cond_call(&comp.loop_step)
                .ok_or(CompileError::UnrecognisedComprehension(comp.loop_step.id))?;
            if !is_ident(&call.args[2], accu_var) {
                return Err(CompileError::UnrecognisedComprehension(comp.loop_step.id));
            }
            let elem = accu_plus_singleton_list(&call.args[1], accu_var)
                .ok_or(CompileError::UnrecognisedComprehension(comp.loop_step.id))?;

            if is_ident(elem, iter_var) {
                Ok(Recognised {
                    kind: ComprehensionKind::Filter,
                    predicate: Some(&call.args[0]),
                    filter: None,
                    transform: None,
                })
            } else {
                Ok(Recognised {
                    kind: ComprehensionKind::MapWithFilter,
                    predicate: None,
                    filter: Some(&call.args[0]),
                    transform: Some(elem),
                })
            }
        }

        _ => Err(CompileError::UnrecognisedComprehension(comp.accu_init.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsql_core::Expr;

    fn ident(id: u64, name: &str) -> Expr {
        Expr::ident(id, name)
    }

    #[test]
    fn recognises_all() {
        let predicate = Expr::call(10, Some(ident(11, "x")), "gt", vec![Expr::constant(12, Constant::Int(5))]);
        let comp = ComprehensionExpr {
            iter_range: Box::new(ident(1, "xs")),
            iter_var: "x".into(),
            iter_var2: None,
            accu_var: "__result__".into(),
            accu_init: Box::new(Expr::constant(2, Constant::Bool(true))),
            loop_condition: Box::new(ident(3, "__result__")),
            loop_step: Box::new(Expr::call(
                4,
                None,
                "&&",
                vec![ident(5, "__result__"), predicate.clone()],
            )),
            result: Box::new(ident(6, "__result__")),
        };

        let recognised = recognise(&comp).unwrap();
        assert_eq!(recognised.kind, ComprehensionKind::All);
        assert_eq!(recognised.predicate.unwrap().id, predicate.id);
    }

    #[test]
    fn recognises_filter_vs_map_with_filter_by_element_shape() {
        let accu = "__result__";
        let cond = Expr::call(10, Some(ident(11, "x")), "gt", vec![Expr::constant(12, Constant::Int(5))]);

        let filter_step = Expr::call(
            4,
            None,
            "cond",
            vec![
                cond.clone(),
                Expr::call(
                    5,
                    None,
                    "+",
                    vec![ident(6, accu), Expr::list(7, vec![ident(8, "x")])],
                ),
                ident(9, accu),
            ],
        );
        let filter_comp = ComprehensionExpr {
            iter_range: Box::new(ident(1, "xs")),
            iter_var: "x".into(),
            iter_var2: None,
            accu_var: accu.into(),
            accu_init: Box::new(Expr::list(2, vec![])),
            loop_condition: Box::new(Expr::constant(3, Constant::Bool(true))),
            loop_step: Box::new(filter_step),
            result: Box::new(ident(20, accu)),
        };
        let recognised = recognise(&filter_comp).unwrap();
        assert_eq!(recognised.kind, ComprehensionKind::Filter);

        let transform = Expr::call(30, Some(ident(31, "x")), "upper", vec![]);
        let map_with_filter_step = Expr::call(
            4,
            None,
            "cond",
            vec![
                cond,
                Expr::call(
                    5,
                    None,
                    "+",
                    vec![ident(6, accu), Expr::list(7, vec![transform.clone()])],
                ),
                ident(9, accu),
            ],
        );
        let mwf_comp = ComprehensionExpr {
            loop_step: Box::new(map_with_filter_step),
            ..filter_comp
        };
        let recognised = recognise(&mwf_comp).unwrap();
        assert_eq!(recognised.kind, ComprehensionKind::MapWithFilter);
        assert_eq!(recognised.transform.unwrap().id, transform.id);
    }

    #[test]
    fn unrecognised_shape_is_an_error() {
        let comp = ComprehensionExpr {
            iter_range: Box::new(ident(1, "xs")),
            iter_var: "x".into(),
            iter_var2: None,
            accu_var: "acc".into(),
            accu_init: Box::new(Expr::constant(2, Constant::String("nope".into()))),
            loop_condition: Box::new(Expr::constant(3, Constant::Bool(true))),
            loop_step: Box::new(ident(4, "acc")),
            result: Box::new(ident(5, "acc")),
        };
        assert!(matches!(
            recognise(&comp),
            Err(CompileError::UnrecognisedComprehension(_))
        ));
    }
}
