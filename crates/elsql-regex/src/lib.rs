//! Translation of RE2-ish regex literals into PostgreSQL POSIX ERE (C2).
//!
//! Applied only to pattern strings that are themselves constant string
//! literals in the AST; the caller is responsible for leaving non-literal
//! patterns unchanged — this crate only ever sees the literal text.

use thiserror::Error;

/// A translated pattern, ready to splice into a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPattern {
    /// The pattern text, single-quote-escaped and wrapped in single quotes.
    pub sql_literal: String,
    /// The PostgreSQL match operator to pair the literal with: `~` normally,
    /// `~*` when an inline case-insensitivity flag was detected.
    pub operator: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegexError {
    /// The pattern uses an RE2 construct with no POSIX ERE equivalent and no
    /// special-cased handling (look-around, non-capturing groups, named
    /// groups, the `(?m)` flag, ...). Rather than pass it through and risk a
    /// runtime PostgreSQL parse error, translation is refused.
    #[error("regex pattern uses a construct with no POSIX ERE equivalent: {0}")]
    UnsupportedConstruct(String),
}

const UNSUPPORTED_MARKERS: &[(&str, &str)] = &[
    ("(?:", "non-capturing group (?:...)"),
    ("(?P<", "named group (?P<name>...)"),
    ("(?m)", "inline multiline flag (?m)"),
    ("(?=", "positive lookahead (?=...)"),
    ("(?!", "negative lookahead (?!...)"),
    ("(?<=", "positive lookbehind (?<=...)"),
    ("(?<!", "negative lookbehind (?<!...)"),
];

const ESCAPE_REPLACEMENTS: &[(&str, &str)] = &[
    (r"\b", r"\y"),
    (r"\B", "[^[:alnum:]_]"),
    (r"\d", "[[:digit:]]"),
    (r"\D", "[^[:digit:]]"),
    (r"\w", "[[:alnum:]_]"),
    (r"\W", "[^[:alnum:]_]"),
    (r"\s", "[[:space:]]"),
    (r"\S", "[^[:space:]]"),
];

/// Translate a single regex literal.
///
/// The inline case-insensitivity flag `(?i)` is detected and stripped, and
/// paired with the `~*` operator instead of `~`. Every other RE2 construct
/// with no POSIX ERE equivalent is rejected rather than passed through
/// unchanged, since PostgreSQL would otherwise fail at query execution time
/// rather than at compile time.
pub fn translate(pattern: &str) -> Result<TranslatedPattern, RegexError> {
    let case_insensitive = pattern.contains("(?i)");
    let stripped = pattern.replace("(?i)", "");

    for (marker, description) in UNSUPPORTED_MARKERS {
        if stripped.contains(marker) {
            return Err(RegexError::UnsupportedConstruct((*description).to_string()));
        }
    }

    let mut translated = stripped;
    for (from, to) in ESCAPE_REPLACEMENTS {
        translated = translated.replace(from, to);
    }

    let escaped = translated.replace('\'', "''");

    Ok(TranslatedPattern {
        sql_literal: format!("'{escaped}'"),
        operator: if case_insensitive { "~*" } else { "~" },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_every_documented_escape() {
        let cases = [
            (r"\bfoo\b", r"'\yfoo\y'"),
            (r"\Bfoo", "'[^[:alnum:]_]foo'"),
            (r"\d+", "'[[:digit:]]+'"),
            (r"\D+", "'[^[:digit:]]+'"),
            (r"\w+", "'[[:alnum:]_]+'"),
            (r"\W+", "'[^[:alnum:]_]+'"),
            (r"\s+", "'[[:space:]]+'"),
            (r"\S+", "'[^[:space:]]+'"),
        ];

        for (input, expected) in cases {
            let result = translate(input).expect("should translate");
            assert_eq!(result.sql_literal, expected);
            assert_eq!(result.operator, "~");
        }
    }

    #[test]
    fn passes_other_characters_through_unchanged() {
        let result = translate("^foo[0-9]+bar$").unwrap();
        assert_eq!(result.sql_literal, "'^foo[0-9]+bar$'");
    }

    #[test]
    fn single_quotes_are_doubled_and_the_literal_is_wrapped() {
        let result = translate("it's").unwrap();
        assert_eq!(result.sql_literal, "'it''s'");
    }

    #[test]
    fn inline_case_insensitive_flag_selects_the_tilde_star_operator() {
        let result = translate("(?i)foo\\d").unwrap();
        assert_eq!(result.sql_literal, "'foo[[:digit:]]'");
        assert_eq!(result.operator, "~*");
    }

    #[test]
    fn unsupported_constructs_are_rejected_not_passed_through() {
        assert!(matches!(
            translate("(?:foo|bar)"),
            Err(RegexError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            translate("(?P<name>foo)"),
            Err(RegexError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            translate("foo(?=bar)"),
            Err(RegexError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            translate("(?<=foo)bar"),
            Err(RegexError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            translate("foo(?m)bar"),
            Err(RegexError::UnsupportedConstruct(_))
        ));
    }
}
