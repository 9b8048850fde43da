//! The eight concrete input/output pairs carried by the design notes,
//! exercised end to end through [`elsql_compiler::compile`].

use elsql_compiler::compile;
use elsql_core::{Constant, ElType, Expr, TypeMap};
use elsql_schema::{FieldSchema, JsonElementShape, StaticSchemaProvider, StorageType};

fn ident(id: u64, name: &str) -> Expr {
    Expr::ident(id, name)
}

#[test]
fn scenario_1_starts_with_on_a_plain_string_field() {
    let ast = Expr::call(
        1,
        Some(ident(2, "name")),
        "startsWith",
        vec![Expr::constant(3, Constant::String("a".into()))],
    );
    let mut types = TypeMap::new();
    types.insert(2, ElType::String);

    let provider = StaticSchemaProvider::builder().with_table(
        "events",
        vec![FieldSchema::new("name", StorageType::Text, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(sql, "STARTS_WITH(name, 'a')");
}

#[test]
fn scenario_2_constant_folded_list_index() {
    let list = Expr::list(
        1,
        vec![
            Expr::constant(2, Constant::Int(1)),
            Expr::constant(3, Constant::Int(2)),
            Expr::constant(4, Constant::Int(3)),
        ],
    );
    let index = Expr::call(5, Some(list), "index", vec![Expr::constant(6, Constant::Int(0))]);
    let ast = Expr::call(7, None, "==", vec![index.clone(), Expr::constant(8, Constant::Int(1))]);

    let mut types = TypeMap::new();
    types.insert(1, ElType::list_of(ElType::Int));

    let provider = StaticSchemaProvider::builder();
    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(sql, "ARRAY[1, 2, 3][1] = 1");
}

#[test]
fn scenario_3_timestamp_minus_duration_compared_to_timestamp_conversion() {
    let created_at = ident(1, "created_at");
    let duration_call = Expr::call(2, None, "duration", vec![Expr::constant(3, Constant::String("60m".into()))]);
    let minus = Expr::call(4, None, "-", vec![created_at.clone(), duration_call]);

    let datetime_call = Expr::call(
        5,
        None,
        "datetime",
        vec![Expr::constant(6, Constant::String("2021-09-01 18:00:00".into()))],
    );
    let timestamp_call = Expr::call(
        7,
        None,
        "timestamp",
        vec![datetime_call, Expr::constant(8, Constant::String("Asia/Tokyo".into()))],
    );
    let ast = Expr::call(9, None, "<=", vec![minus, timestamp_call]);

    let mut types = TypeMap::new();
    types.insert(1, ElType::Timestamp);

    let provider = StaticSchemaProvider::builder().with_table(
        "events",
        vec![FieldSchema::new("created_at", StorageType::TimestampTz, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(
        sql,
        "created_at - INTERVAL 1 HOUR <= TIMESTAMP(DATETIME('2021-09-01 18:00:00'), 'Asia/Tokyo')"
    );
}

#[test]
fn scenario_4_deep_jsonb_numeric_comparison() {
    let chain = Expr::select(
        1,
        Expr::select(
            2,
            Expr::select(3, ident(4, "information_assets"), "metadata", false),
            "version",
            false,
        ),
        "major",
        false,
    );
    let ast = Expr::call(5, None, ">", vec![chain, Expr::constant(6, Constant::Int(1))]);

    let types = TypeMap::new();
    let provider = StaticSchemaProvider::builder().with_table(
        "information_assets",
        vec![FieldSchema::new("metadata", StorageType::Jsonb, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(
        sql,
        "(information_assets.metadata->'version'->>'major')::numeric > 1"
    );
}

#[test]
fn scenario_5_in_over_jsonb_array_with_simple_elements() {
    let chain = Expr::select(
        1,
        Expr::select(
            2,
            Expr::select(3, ident(4, "information_assets"), "metadata", false),
            "corpus",
            false,
        ),
        "tags",
        false,
    );
    let ast = Expr::call(5, None, "in", vec![Expr::constant(6, Constant::String("documentation".into())), chain]);

    let types = TypeMap::new();
    let provider = StaticSchemaProvider::builder().with_table(
        "information_assets",
        vec![FieldSchema::new("metadata", StorageType::Jsonb, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(
        sql,
        "'documentation' = ANY(ARRAY(SELECT jsonb_array_elements_text(information_assets.metadata->'corpus'->'tags')))"
    );
}

#[test]
fn scenario_6_all_comprehension_over_jsonb_array_of_text_scores() {
    let range = Expr::select(1, ident(2, "json_users"), "scores", false);
    let predicate = Expr::call(3, None, ">", vec![ident(4, "score"), Expr::constant(5, Constant::Int(70))]);

    let comp = Expr::comprehension(
        10,
        range,
        "score",
        None,
        "__result__",
        Expr::constant(11, Constant::Bool(true)),
        ident(12, "__result__"),
        Expr::call(13, None, "&&", vec![ident(14, "__result__"), predicate]),
        ident(15, "__result__"),
    );

    let types = TypeMap::new();
    let provider = StaticSchemaProvider::builder().with_table(
        "json_users",
        vec![FieldSchema::new("scores", StorageType::Jsonb, true)
            .with_json_element_shape(JsonElementShape::Scalar)],
    );

    let sql = compile(&comp, &types, &provider).unwrap();
    assert_eq!(
        sql,
        "NOT EXISTS (SELECT 1 FROM jsonb_array_elements_text(json_users.scores) AS score WHERE json_users.scores IS NOT NULL AND jsonb_typeof(json_users.scores) = 'array' AND NOT ((score)::numeric > 70))"
    );
}

#[test]
fn scenario_7_has_on_a_two_segment_jsonb_chain() {
    let chain = Expr::select(
        1,
        Expr::select(2, ident(3, "information_assets"), "metadata", false),
        "corpus",
        false,
    );
    let ast = Expr::select(4, chain, "section", true);

    let types = TypeMap::new();
    let provider = StaticSchemaProvider::builder().with_table(
        "information_assets",
        vec![FieldSchema::new("metadata", StorageType::Jsonb, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(
        sql,
        "jsonb_extract_path_text(information_assets.metadata, 'corpus', 'section') IS NOT NULL"
    );
}

#[test]
fn scenario_8_regex_digit_escape_translation() {
    let ast = Expr::call(
        1,
        Some(ident(2, "name")),
        "matches",
        vec![Expr::constant(3, Constant::String(r"\d{3}-\d{4}".into()))],
    );

    let types = TypeMap::new();
    let provider = StaticSchemaProvider::builder().with_table(
        "events",
        vec![FieldSchema::new("name", StorageType::Text, false)],
    );

    let sql = compile(&ast, &types, &provider).unwrap();
    assert_eq!(sql, "name ~ '[[:digit:]]{3}-[[:digit:]]{4}'");
}
