//! PostgreSQL JSON/JSONB navigation chain construction (C4).
//!
//! Pure string-building helpers operating on an already-resolved JSON root
//! expression and the select-chain segments below it. Resolving which
//! prefix of a select chain is the JSON root, and whether that root is JSON
//! or JSONB, is the walker's job (it needs the type provider for that); this
//! module only knows how to stitch the path operators together once that
//! decision has been made.

/// Build a navigation chain ending in text extraction: every segment but the
/// last uses `->` (JSON-preserving), the last uses `->>` (text).
pub fn value_path(root: &str, segments: &[&str]) -> String {
    let mut out = root.to_string();
    for (i, seg) in segments.iter().enumerate() {
        if i + 1 == segments.len() {
            out.push_str(&format!("->>'{seg}'"));
        } else {
            out.push_str(&format!("->'{seg}'"));
        }
    }
    out
}

/// Build a navigation chain that stays JSON/JSONB all the way through —
/// every segment uses `->`, including the last. Used when the chain feeds
/// an `in`-membership test or a comprehension range, where a terminal
/// `->>` would collapse the JSON array to text too early.
pub fn json_preserving_path(root: &str, segments: &[&str]) -> String {
    let mut out = root.to_string();
    for seg in segments {
        out.push_str(&format!("->'{seg}'"));
    }
    out
}

/// Build the `has(...)` presence test for a JSON-rooted select chain,
/// following §4.4 rule 5: a single JSONB segment uses the `?` existence
/// operator, a single plain-JSON segment falls back to a `->` read plus
/// `IS NOT NULL`, and anything two segments deep or longer uses
/// `jsonb_extract_path_text` regardless of JSON vs JSONB.
pub fn has_path(root: &str, segments: &[&str], root_is_jsonb: bool) -> String {
    match segments {
        [] => format!("{root} IS NOT NULL"),
        [only] if root_is_jsonb => format!("{root} ? '{only}'"),
        [only] => format!("{root} -> '{only}' IS NOT NULL"),
        many => {
            let quoted: Vec<String> = many.iter().map(|s| format!("'{s}'")).collect();
            format!("jsonb_extract_path_text({root}, {}) IS NOT NULL", quoted.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_path_extracts_text_only_on_the_final_segment() {
        assert_eq!(
            value_path("information_assets.metadata", &["version", "major"]),
            "information_assets.metadata->'version'->>'major'"
        );
    }

    #[test]
    fn json_preserving_path_never_extracts_text() {
        assert_eq!(
            json_preserving_path("information_assets.metadata", &["corpus", "tags"]),
            "information_assets.metadata->'corpus'->'tags'"
        );
    }

    #[test]
    fn has_path_rules_by_root_kind_and_depth() {
        assert_eq!(
            has_path("x.json", &["k"], false),
            "x.json -> 'k' IS NOT NULL"
        );
        assert_eq!(has_path("x.jsonb", &["k"], true), "x.jsonb ? 'k'");
        assert_eq!(
            has_path("information_assets.metadata", &["corpus", "section"], true),
            "jsonb_extract_path_text(information_assets.metadata, 'corpus', 'section') IS NOT NULL"
        );
    }
}
