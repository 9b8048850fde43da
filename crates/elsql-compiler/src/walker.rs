//! Single-pass AST lowering walker (C5).
//!
//! Visits a type-checked AST node and returns the PostgreSQL expression text
//! for it. There is no intermediate SQL AST and no second pass: every
//! `emit_*` method returns the exact fragment to splice into its caller's
//! output, assembled in strict pre-order of the original AST traversal.

use elsql_core::{CallExpr, Constant, ComprehensionExpr, Expr, ExprKind, NodeId, StructLiteral, TypeMap};
use elsql_schema::{JsonElementShape, SchemaProvider};

use crate::comprehension::{self, ComprehensionKind};
use crate::duration;
use crate::error::{CompileError, Result};
use crate::jsonpath;

const NUMERIC_IDENT_NAMES: &[&str] = &["score", "value", "num", "amount", "count", "level"];

/// Lower a type-checked AST into a single PostgreSQL `WHERE`-clause fragment.
pub fn compile(ast: &Expr, types: &TypeMap, provider: &dyn SchemaProvider) -> Result<String> {
    let walker = Walker { types, provider };
    walker.emit(ast, None)
}

struct Walker<'a> {
    types: &'a TypeMap,
    provider: &'a dyn SchemaProvider,
}

/// The resolved shape of a select chain's root once schema lookups have run.
enum Chain {
    /// The chain's root segment is a known JSON/JSONB field; `root_sql` is
    /// that field as a qualified SQL identifier and `segments` are the path
    /// steps still to navigate below it.
    Json(JsonChain),
    /// No JSON root was found anywhere in the chain; `0` is the chain
    /// rendered as a plain dotted SQL identifier.
    Other(String),
}

struct JsonChain {
    root_sql: String,
    jsonb: bool,
    shape: JsonElementShape,
    segments: Vec<String>,
}

fn precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" => 3,
        "+" | "-" => 4,
        "*" | "/" | "%" => 5,
        _ => 10,
    }
}

fn is_binary_op(op: &str) -> bool {
    matches!(
        op,
        "+" | "-" | "*" | "/" | "%" | "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" | "in"
    )
}

/// If `expr` is itself a binary or ternary call, its operator name and
/// precedence class (ternary is its own class, looser than everything).
fn classify_binary_or_ternary(expr: &Expr) -> Option<(&str, u8)> {
    match &expr.kind {
        ExprKind::Call(call) if call.target.is_none() => {
            if call.function == "cond" && call.args.len() == 3 {
                Some(("cond", 0))
            } else if is_binary_op(&call.function) && call.args.len() == 2 {
                Some((call.function.as_str(), precedence(&call.function)))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_valid_field_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s.len() <= 128 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_json_text_extraction(sql: &str) -> bool {
    sql.contains("->>'") && sql.ends_with('\'')
}

fn expander_name(jsonb: bool, shape: JsonElementShape) -> &'static str {
    match (jsonb, shape) {
        (true, JsonElementShape::Scalar) => "jsonb_array_elements_text",
        (true, JsonElementShape::Object) => "jsonb_array_elements",
        (false, JsonElementShape::Scalar) => "json_array_elements_text",
        (false, JsonElementShape::Object) => "json_array_elements",
    }
}

fn date_part_accessor(name: &str) -> Option<(&'static str, bool)> {
    match name {
        "getFullYear" => Some(("YEAR", false)),
        "getMonth" => Some(("MONTH", true)),
        "getDate" => Some(("DAY", false)),
        "getHours" => Some(("HOUR", false)),
        "getMinutes" => Some(("MINUTE", false)),
        "getSeconds" => Some(("SECOND", false)),
        "getMilliseconds" => Some(("MILLISECONDS", false)),
        "getDayOfYear" => Some(("DOY", true)),
        "getDayOfMonth" => Some(("DAY", true)),
        "getDayOfWeek" => Some(("DOW", true)),
        _ => None,
    }
}

/// Flatten a chain of nested `Select` nodes down to its root identifier and
/// ordered field segments. Returns `None` if the chain's base is anything
/// other than a bare identifier (a call, a literal, ...), in which case the
/// caller falls back to opaque operand handling.
fn flatten_select_chain(expr: &Expr) -> Option<(String, Vec<(String, NodeId)>, bool)> {
    let mut segments = Vec::new();
    let mut test_only = false;
    let mut cur = expr;
    loop {
        match &cur.kind {
            ExprKind::Select(sel) => {
                segments.push((sel.field.clone(), cur.id));
                if segments.len() == 1 {
                    test_only = sel.test_only;
                }
                cur = &sel.operand;
            }
            ExprKind::Identifier(name) => {
                segments.reverse();
                return Some((name.clone(), segments, test_only));
            }
            _ => return None,
        }
    }
}

fn render_plain_chain(root: &str, segments: &[(String, NodeId)]) -> String {
    let mut sql = root.to_string();
    for (seg, _) in segments {
        sql.push('.');
        sql.push_str(seg);
    }
    sql
}

impl<'a> Walker<'a> {
    fn resolve_chain(&self, root: &str, segments: &[(String, NodeId)]) -> Chain {
        if segments.is_empty() {
            return Chain::Other(root.to_string());
        }
        if !self.provider.find_struct(root) {
            return Chain::Other(render_plain_chain(root, segments));
        }

        let seg_names: Vec<&str> = segments.iter().map(|(n, _)| n.as_str()).collect();
        match self.provider.locate_json_root(root, &seg_names) {
            Some((idx, field)) => {
                let root_sql = format!("{root}.{}", seg_names[..=idx].join("."));
                let remaining = seg_names[idx + 1..].iter().map(|s| s.to_string()).collect();
                Chain::Json(JsonChain {
                    root_sql,
                    jsonb: field.is_jsonb(),
                    shape: field.json_element_shape.unwrap_or(JsonElementShape::Scalar),
                    segments: remaining,
                })
            }
            None => Chain::Other(render_plain_chain(root, segments)),
        }
    }

    fn emit_resolved_select(
        &self,
        root: &str,
        segments: &[(String, NodeId)],
        test_only: bool,
        _numeric_ctx: Option<&str>,
    ) -> Result<String> {
        match self.resolve_chain(root, segments) {
            Chain::Json(chain) => {
                let refs: Vec<&str> = chain.segments.iter().map(String::as_str).collect();
                if test_only {
                    Ok(jsonpath::has_path(&chain.root_sql, &refs, chain.jsonb))
                } else if refs.is_empty() {
                    Ok(chain.root_sql)
                } else {
                    Ok(jsonpath::value_path(&chain.root_sql, &refs))
                }
            }
            Chain::Other(sql) => {
                if test_only {
                    Ok(format!("{sql} IS NOT NULL"))
                } else {
                    Ok(sql)
                }
            }
        }
    }

    fn emit(&self, expr: &Expr, numeric_ctx: Option<&str>) -> Result<String> {
        match &expr.kind {
            ExprKind::Constant(c) => self.emit_constant(c),
            ExprKind::Identifier(name) => Ok(self.emit_identifier(name, numeric_ctx)),
            ExprKind::List(elements) => self.emit_list(elements, numeric_ctx),
            ExprKind::Struct(s) => self.emit_struct(expr.id, s, numeric_ctx),
            ExprKind::Select(sel) => {
                if let Some((root, segments, test_only)) = flatten_select_chain(expr) {
                    self.emit_resolved_select(&root, &segments, test_only, numeric_ctx)
                } else {
                    let operand = self.emit_operand(&sel.operand, 10, "select", false, numeric_ctx)?;
                    if sel.test_only {
                        Ok(format!("{operand}.{} IS NOT NULL", sel.field))
                    } else {
                        Ok(format!("{operand}.{}", sel.field))
                    }
                }
            }
            ExprKind::Call(call) => self.emit_call(expr.id, call, numeric_ctx),
            ExprKind::Comprehension(comp) => self.emit_comprehension(comp, numeric_ctx),
        }
    }

    fn emit_operand(
        &self,
        expr: &Expr,
        parent_prec: u8,
        parent_op: &str,
        is_right: bool,
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        let inner = self.emit(expr, numeric_ctx)?;
        if let Some((_, child_prec)) = classify_binary_or_ternary(expr) {
            let needs_parens = child_prec < parent_prec
                || (is_right && child_prec == parent_prec && parent_op != "&&" && parent_op != "||");
            if needs_parens {
                return Ok(format!("({inner})"));
            }
        }
        Ok(inner)
    }

    fn emit_identifier(&self, name: &str, numeric_ctx: Option<&str>) -> String {
        if let Some(active) = numeric_ctx {
            if active == name && NUMERIC_IDENT_NAMES.contains(&name) {
                return format!("({name})::numeric");
            }
        }
        name.to_string()
    }

    fn emit_constant(&self, c: &Constant) -> Result<String> {
        Ok(match c {
            Constant::Null => "NULL".to_string(),
            Constant::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Constant::Int(v) => v.to_string(),
            Constant::Uint(v) => v.to_string(),
            Constant::Double(v) => format!("{v}"),
            Constant::String(s) => format!("'{}'", s.replace('\'', "''")),
            Constant::Bytes(bytes) => {
                let mut out = String::from("b\"");
                for b in bytes {
                    out.push_str(&format!("\\{b:03o}"));
                }
                out.push('"');
                out
            }
        })
    }

    fn emit_list(&self, elements: &[Expr], numeric_ctx: Option<&str>) -> Result<String> {
        let parts = elements
            .iter()
            .map(|e| self.emit(e, numeric_ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("ARRAY[{}]", parts.join(", ")))
    }

    fn emit_struct(&self, id: NodeId, s: &StructLiteral, numeric_ctx: Option<&str>) -> Result<String> {
        match s {
            StructLiteral::Named { type_name, fields } => {
                let parts = fields
                    .iter()
                    .map(|(k, v)| Ok(format!("{k}: {}", self.emit(v, numeric_ctx)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{type_name}{{{}}}", parts.join(", ")))
            }
            StructLiteral::Anonymous { entries } => {
                let mut parts = Vec::with_capacity(entries.len());
                for (key_expr, value_expr) in entries {
                    let key = match &key_expr.kind {
                        ExprKind::Constant(Constant::String(s)) => s.clone(),
                        _ => return Err(CompileError::BadConstantKind(key_expr.id, "string")),
                    };
                    if !is_valid_field_name(&key) {
                        return Err(CompileError::BadFieldName(key_expr.id, key));
                    }
                    let value = self.emit(value_expr, numeric_ctx)?;
                    parts.push(format!("{value} AS {key}"));
                }
                Ok(format!("STRUCT({})", parts.join(", ")))
            }
        }
    }

    fn emit_call(&self, id: NodeId, call: &CallExpr, numeric_ctx: Option<&str>) -> Result<String> {
        let op = call.function.as_str();

        let Some(target) = call.target.as_deref() else {
            return self.emit_free_call(id, op, &call.args, numeric_ctx);
        };

        match op {
            "index" => self.emit_index(id, target, &call.args, numeric_ctx),
            "contains" => self.emit_contains(id, target, &call.args, numeric_ctx),
            "matches" => self.emit_matches(id, target, &call.args, numeric_ctx),
            "startsWith" => self.emit_method_builtin(id, "STARTS_WITH", target, &call.args, numeric_ctx),
            "endsWith" => self.emit_method_builtin(id, "ENDS_WITH", target, &call.args, numeric_ctx),
            "size" => self.emit_size(target, numeric_ctx),
            name if date_part_accessor(name).is_some() => {
                self.emit_date_part(id, name, target, &call.args, numeric_ctx)
            }
            _ => Err(CompileError::UnsupportedOperator(id, op.to_string())),
        }
    }

    fn emit_free_call(
        &self,
        id: NodeId,
        op: &str,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if op == "cond" {
            if args.len() != 3 {
                return Err(CompileError::BadArgumentCount(id, op.to_string(), 3, args.len()));
            }
            let cond = self.emit(&args[0], numeric_ctx)?;
            let then = self.emit(&args[1], numeric_ctx)?;
            // Strict propagation: the third argument's failure is surfaced,
            // not swallowed.
            let otherwise = self.emit(&args[2], numeric_ctx)?;
            return Ok(format!("IF({cond}, {then}, {otherwise})"));
        }

        if is_binary_op(op) && args.len() == 2 {
            return self.emit_binary_call(id, op, args, numeric_ctx);
        }

        if (op == "-" || op == "!") && args.len() == 1 {
            let inner = self.emit_operand(&args[0], 6, op, false, numeric_ctx)?;
            let sql_op = if op == "-" { "-" } else { "NOT " };
            return Ok(format!("{sql_op}{inner}"));
        }

        if op == "size" {
            if args.len() != 1 {
                return Err(CompileError::BadArgumentCount(id, op.to_string(), 1, args.len()));
            }
            return self.emit_size(&args[0], numeric_ctx);
        }

        if matches!(op, "int" | "uint" | "double" | "bool" | "string" | "bytes") {
            return self.emit_cast(id, op, args, numeric_ctx);
        }

        if op == "timestamp" {
            return self.emit_timestamp(id, args, numeric_ctx);
        }

        if op == "duration" {
            return self.emit_duration(id, args);
        }

        if op == "interval" {
            if args.len() != 2 {
                return Err(CompileError::BadArgumentCount(id, op.to_string(), 2, args.len()));
            }
            let n = self.emit(&args[0], numeric_ctx)?;
            let part = self.emit_date_part_literal(&args[1])?;
            return Ok(format!("INTERVAL {n} {part}"));
        }

        if op == "mod" && args.len() == 2 {
            let a = self.emit(&args[0], numeric_ctx)?;
            let b = self.emit(&args[1], numeric_ctx)?;
            return Ok(format!("MOD({a}, {b})"));
        }

        let parts = args
            .iter()
            .map(|a| self.emit(a, numeric_ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{}({})", op.to_ascii_uppercase(), parts.join(", ")))
    }

    fn emit_binary_call(
        &self,
        id: NodeId,
        op: &str,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if args.len() != 2 {
            return Err(CompileError::BadArgumentCount(id, op.to_string(), 2, args.len()));
        }
        let lhs_expr = &args[0];
        let rhs_expr = &args[1];
        let rhs_ty = self.types.get(rhs_expr.id);
        let prec = precedence(op);

        match op {
            "in" => self.emit_in(lhs_expr, rhs_expr, numeric_ctx),
            "&&" => {
                let l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                Ok(format!("{l} AND {r}"))
            }
            "||" => {
                let l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                Ok(format!("{l} OR {r}"))
            }
            "%" => {
                let l = self.emit(lhs_expr, numeric_ctx)?;
                let r = self.emit(rhs_expr, numeric_ctx)?;
                Ok(format!("MOD({l}, {r})"))
            }
            "==" | "!=" => {
                let mut l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                if is_json_text_extraction(&l) && matches!(rhs_ty, Some(t) if t.is_numeric()) {
                    l = format!("({l})::numeric");
                }
                if let ExprKind::Constant(Constant::Null) = rhs_expr.kind {
                    return Ok(format!("{l} IS{} NULL", if op == "!=" { " NOT" } else { "" }));
                }
                if let ExprKind::Constant(Constant::Bool(b)) = rhs_expr.kind {
                    let tag = if b { "TRUE" } else { "FALSE" };
                    return Ok(format!("{l} IS{} {tag}", if op == "!=" { " NOT" } else { "" }));
                }
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                let sql_op = if op == "==" { "=" } else { "!=" };
                Ok(format!("{l} {sql_op} {r}"))
            }
            "<" | "<=" | ">" | ">=" => {
                let mut l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                if is_json_text_extraction(&l) && matches!(rhs_ty, Some(t) if t.is_numeric()) {
                    l = format!("({l})::numeric");
                }
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                Ok(format!("{l} {op} {r}"))
            }
            "+" => self.emit_plus(lhs_expr, rhs_expr, prec, numeric_ctx),
            "-" => {
                let l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                Ok(format!("{l} - {r}"))
            }
            "*" | "/" => {
                let l = self.emit_operand(lhs_expr, prec, op, false, numeric_ctx)?;
                let r = self.emit_operand(rhs_expr, prec, op, true, numeric_ctx)?;
                Ok(format!("{l} {op} {r}"))
            }
            _ => Err(CompileError::UnsupportedOperator(id, op.to_string())),
        }
    }

    fn emit_plus(
        &self,
        lhs_expr: &Expr,
        rhs_expr: &Expr,
        prec: u8,
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        let lhs_ty = self.types.get(lhs_expr.id);
        let rhs_ty = self.types.get(rhs_expr.id);
        let is_str_lit = |e: &Expr| matches!(e.kind, ExprKind::Constant(Constant::String(_)));

        let is_concat = is_str_lit(lhs_expr)
            || is_str_lit(rhs_expr)
            || matches!((lhs_ty, rhs_ty), (Some(l), Some(r))
                if (l.is_string() && r.is_string()) || (l.is_list() && r.is_list()));

        if is_concat {
            let l = self.emit_operand(lhs_expr, prec, "+", false, numeric_ctx)?;
            let r = self.emit_operand(rhs_expr, prec, "+", true, numeric_ctx)?;
            return Ok(format!("{l} || {r}"));
        }

        if let (Some(lt), Some(rt)) = (lhs_ty, rhs_ty) {
            if lt.is_timestamp_family() && rt.is_duration_family() {
                let l = self.emit_operand(lhs_expr, prec, "+", false, numeric_ctx)?;
                let r = self.emit_operand(rhs_expr, prec, "+", true, numeric_ctx)?;
                return Ok(format!("{l} + {r}"));
            }
            if lt.is_duration_family() && rt.is_timestamp_family() {
                let l = self.emit_operand(rhs_expr, prec, "+", false, numeric_ctx)?;
                let r = self.emit_operand(lhs_expr, prec, "+", true, numeric_ctx)?;
                return Ok(format!("{l} + {r}"));
            }
        }

        let l = self.emit_operand(lhs_expr, prec, "+", false, numeric_ctx)?;
        let r = self.emit_operand(rhs_expr, prec, "+", true, numeric_ctx)?;
        Ok(format!("{l} + {r}"))
    }

    fn emit_in(&self, lhs_expr: &Expr, rhs_expr: &Expr, numeric_ctx: Option<&str>) -> Result<String> {
        let lhs_sql = self.emit(lhs_expr, numeric_ctx)?;

        if let Some((root, segments, _)) = flatten_select_chain(rhs_expr) {
            if let Chain::Json(chain) = self.resolve_chain(&root, &segments) {
                let refs: Vec<&str> = chain.segments.iter().map(String::as_str).collect();
                let path = jsonpath::json_preserving_path(&chain.root_sql, &refs);
                let expander = expander_name(chain.jsonb, chain.shape);
                return Ok(format!("{lhs_sql} = ANY(ARRAY(SELECT {expander}({path})))"));
            }
        }

        let rhs_sql = self.emit(rhs_expr, numeric_ctx)?;
        if matches!(rhs_expr.kind, ExprKind::List(_)) || flatten_select_chain(rhs_expr).is_some() {
            Ok(format!("{lhs_sql} = ANY({rhs_sql})"))
        } else {
            Ok(format!("{lhs_sql} IN {rhs_sql}"))
        }
    }

    fn emit_index(
        &self,
        id: NodeId,
        target: &Expr,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, "index".to_string(), 1, args.len()));
        }
        let key_expr = &args[0];
        let target_ty = self.types.get(target.id);
        let target_sql = self.emit(target, numeric_ctx)?;

        if matches!(target_ty, Some(elsql_core::ElType::Map(_, _))) {
            return match &key_expr.kind {
                ExprKind::Constant(Constant::String(s)) if is_valid_field_name(s) => {
                    Ok(format!("{target_sql}.{s}"))
                }
                _ => Err(CompileError::BadFieldName(id, "map index key".to_string())),
            };
        }

        match &key_expr.kind {
            ExprKind::Constant(Constant::Int(n)) => Ok(format!("{target_sql}[{}]", n + 1)),
            ExprKind::Constant(Constant::Uint(n)) => Ok(format!("{target_sql}[{}]", n + 1)),
            _ => {
                let key_sql = self.emit(key_expr, numeric_ctx)?;
                Ok(format!("{target_sql}[{key_sql} + 1]"))
            }
        }
    }

    fn emit_contains(
        &self,
        id: NodeId,
        target: &Expr,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, "contains".to_string(), 1, args.len()));
        }
        let target_sql = self.emit(target, numeric_ctx)?;
        let arg_sql = self.emit(&args[0], numeric_ctx)?;

        if let Some((root, segments, _)) = flatten_select_chain(target) {
            if let Chain::Json(_) = self.resolve_chain(&root, &segments) {
                return Ok(format!("{target_sql} ? {arg_sql}"));
            }
        }
        Ok(format!("POSITION({arg_sql} IN {target_sql}) > 0"))
    }

    fn emit_matches(
        &self,
        id: NodeId,
        target: &Expr,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, "matches".to_string(), 1, args.len()));
        }
        let target_sql = self.emit(target, numeric_ctx)?;
        if let ExprKind::Constant(Constant::String(pattern)) = &args[0].kind {
            let translated =
                elsql_regex::translate(pattern).map_err(|e| CompileError::BadRegexLiteral(id, e))?;
            return Ok(format!(
                "{target_sql} {} {}",
                translated.operator, translated.sql_literal
            ));
        }
        let pattern_sql = self.emit(&args[0], numeric_ctx)?;
        Ok(format!("{target_sql} ~ {pattern_sql}"))
    }

    fn emit_method_builtin(
        &self,
        id: NodeId,
        sql_name: &str,
        target: &Expr,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, sql_name.to_string(), 1, args.len()));
        }
        let t = self.emit(target, numeric_ctx)?;
        let a = self.emit(&args[0], numeric_ctx)?;
        Ok(format!("{sql_name}({t}, {a})"))
    }

    fn emit_size(&self, target: &Expr, numeric_ctx: Option<&str>) -> Result<String> {
        let ty = self.types.get(target.id);
        let sql = self.emit(target, numeric_ctx)?;

        if matches!(ty, Some(t) if t.is_string() || matches!(t, elsql_core::ElType::Bytes)) {
            return Ok(format!("LENGTH({sql})"));
        }
        if matches!(ty, Some(t) if t.is_list()) {
            return Ok(format!("ARRAY_LENGTH({sql}, 1)"));
        }
        if let Some((root, segments, _)) = flatten_select_chain(target) {
            if let Chain::Json(_) = self.resolve_chain(&root, &segments) {
                return Ok(format!("jsonb_array_length({sql})"));
            }
        }
        Ok(format!("LENGTH({sql})"))
    }

    fn emit_cast(&self, id: NodeId, op: &str, args: &[Expr], numeric_ctx: Option<&str>) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, op.to_string(), 1, args.len()));
        }
        let operand_ty = self.types.get(args[0].id);
        if op == "int" && matches!(operand_ty, Some(t) if t.is_timestamp_family()) {
            let sql = self.emit(&args[0], numeric_ctx)?;
            return Ok(format!("UNIX_SECONDS({sql})"));
        }

        let sql_type = match op {
            "bool" => "BOOL",
            "double" => "FLOAT64",
            "int" | "uint" => "INT64",
            "string" => "STRING",
            "bytes" => "BYTES",
            _ => return Err(CompileError::UnsupportedOperator(id, op.to_string())),
        };
        let sql = self.emit(&args[0], numeric_ctx)?;
        Ok(format!("CAST({sql} AS {sql_type})"))
    }

    fn emit_timestamp(&self, id: NodeId, args: &[Expr], numeric_ctx: Option<&str>) -> Result<String> {
        match args.len() {
            1 => {
                let s = self.emit(&args[0], numeric_ctx)?;
                Ok(format!("CAST({s} AS TIMESTAMP WITH TIME ZONE)"))
            }
            2 => {
                let dt = self.emit(&args[0], numeric_ctx)?;
                let tz = self.emit(&args[1], numeric_ctx)?;
                Ok(format!("TIMESTAMP({dt}, {tz})"))
            }
            n => Err(CompileError::BadArgumentCount(id, "timestamp".to_string(), 2, n)),
        }
    }

    fn emit_duration(&self, id: NodeId, args: &[Expr]) -> Result<String> {
        if args.len() != 1 {
            return Err(CompileError::BadArgumentCount(id, "duration".to_string(), 1, args.len()));
        }
        let literal = match &args[0].kind {
            ExprKind::Constant(Constant::String(s)) => s.clone(),
            _ => return Err(CompileError::BadConstantKind(id, "string")),
        };
        duration::lower_duration_literal(&literal)
            .ok_or_else(|| CompileError::BadDurationLiteral(id, literal))
    }

    fn emit_date_part_literal(&self, expr: &Expr) -> Result<String> {
        match &expr.kind {
            ExprKind::Constant(Constant::String(s)) => Ok(s.to_ascii_uppercase()),
            ExprKind::Identifier(name) => Ok(name.to_ascii_uppercase()),
            _ => Err(CompileError::BadConstantKind(expr.id, "date_part")),
        }
    }

    fn emit_date_part(
        &self,
        id: NodeId,
        name: &str,
        target: &Expr,
        args: &[Expr],
        numeric_ctx: Option<&str>,
    ) -> Result<String> {
        let (part, zero_base) = date_part_accessor(name).expect("caller checked name is a date-part accessor");
        if args.len() > 1 {
            return Err(CompileError::BadArgumentCount(id, name.to_string(), 1, args.len()));
        }
        let target_ty = self.types.get(target.id);
        let target_sql = self.emit(target, numeric_ctx)?;
        let mut sql = format!("EXTRACT({part} FROM {target_sql}");

        if let Some(tz_expr) = args.first() {
            if matches!(target_ty, Some(t) if t.is_timestamp_family())
                && matches!(tz_expr.kind, ExprKind::Constant(Constant::String(_)))
            {
                let tz_sql = self.emit(tz_expr, numeric_ctx)?;
                sql.push_str(" AT ");
                sql.push_str(&tz_sql);
            }
        }
        sql.push(')');
        if zero_base {
            sql.push_str(" - 1");
        }
        Ok(sql)
    }

    fn emit_comprehension(&self, comp: &ComprehensionExpr, _numeric_ctx: Option<&str>) -> Result<String> {
        let recognised = comprehension::recognise(comp)?;

        let (iter_sql, where_prefix, numeric_ctx) =
            if let Some((root, segments, _)) = flatten_select_chain(&comp.iter_range) {
                match self.resolve_chain(&root, &segments) {
                    Chain::Json(chain) => {
                        let refs: Vec<&str> = chain.segments.iter().map(String::as_str).collect();
                        let range_sql = if refs.is_empty() {
                            chain.root_sql.clone()
                        } else {
                            jsonpath::json_preserving_path(&chain.root_sql, &refs)
                        };
                        let expander = expander_name(chain.jsonb, chain.shape);
                        let typeof_fn = if chain.jsonb { "jsonb_typeof" } else { "json_typeof" };
                        let iter = format!("{expander}({range_sql})");
                        let prefix =
                            format!("{range_sql} IS NOT NULL AND {typeof_fn}({range_sql}) = 'array' AND ");
                        (iter, prefix, Some(comp.iter_var.clone()))
                    }
                    Chain::Other(sql) => {
                        (format!("UNNEST({sql})"), String::new(), None)
                    }
                }
            } else {
                let sql = self.emit(&comp.iter_range, None)?;
                (format!("UNNEST({sql})"), String::new(), None)
            };

        let numeric_ctx = numeric_ctx.as_deref();
        let v = comp.iter_var.as_str();

        match recognised.kind {
            ComprehensionKind::All => {
                let p = self.emit(recognised.predicate.expect("all has a predicate"), numeric_ctx)?;
                Ok(format!(
                    "NOT EXISTS (SELECT 1 FROM {iter_sql} AS {v} WHERE {where_prefix}NOT ({p}))"
                ))
            }
            ComprehensionKind::Exists => {
                let p = self.emit(recognised.predicate.expect("exists has a predicate"), numeric_ctx)?;
                Ok(format!("EXISTS (SELECT 1 FROM {iter_sql} AS {v} WHERE {where_prefix}{p})"))
            }
            ComprehensionKind::ExistsOne => {
                let p = self.emit(
                    recognised.predicate.expect("exists_one has a predicate"),
                    numeric_ctx,
                )?;
                Ok(format!(
                    "(SELECT COUNT(*) FROM {iter_sql} AS {v} WHERE {where_prefix}{p}) = 1"
                ))
            }
            ComprehensionKind::Filter => {
                let p = self.emit(recognised.predicate.expect("filter has a predicate"), numeric_ctx)?;
                Ok(format!("ARRAY(SELECT {v} FROM {iter_sql} AS {v} WHERE {where_prefix}{p})"))
            }
            ComprehensionKind::Map => {
                let t = self.emit(recognised.transform.expect("map has a transform"), numeric_ctx)?;
                Ok(format!("ARRAY(SELECT {t} FROM {iter_sql} AS {v})"))
            }
            ComprehensionKind::MapWithFilter => {
                let t = self.emit(
                    recognised.transform.expect("map-with-filter has a transform"),
                    numeric_ctx,
                )?;
                let f = self.emit(recognised.filter.expect("map-with-filter has a filter"), numeric_ctx)?;
                Ok(format!(
                    "ARRAY(SELECT {t} FROM {iter_sql} AS {v} WHERE {where_prefix}{f})"
                ))
            }
        }
    }
}
