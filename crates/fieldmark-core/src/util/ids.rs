//! Naming and identifier utilities.
//!
//! Provides the schema-name derivation used for every collection, the
//! backtick escaping used inside `filter_by` expressions, and the check
//! that keeps document IDs usable as URL path segments.

/// Suffix stripped from record type names before snake-casing.
const COLLECTION_SUFFIX: &str = "Collection";

/// Derive a schema name from a record type name.
///
/// Performs the following transformations:
/// 1. Drops any module path (`app::search::Media` → `Media`)
/// 2. Strips a trailing `Collection` unless that is the whole name
/// 3. Converts to lowercase snake_case
///
/// # Examples
///
/// ```
/// use fieldmark_core::util::ids::schema_name_for_type;
///
/// assert_eq!(schema_name_for_type("Content"), "content");
/// assert_eq!(schema_name_for_type("MediaItemCollection"), "media_item");
/// assert_eq!(schema_name_for_type("app::search::HTTPLogCollection"), "http_log");
/// assert_eq!(schema_name_for_type("Collection"), "collection");
/// ```
pub fn schema_name_for_type(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base).trim();

    let stem = match short.strip_suffix(COLLECTION_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => short,
    };

    to_snake_case(stem)
}

/// Convert a camel/pascal-case identifier to lowercase snake_case.
///
/// Word boundaries are placed before an uppercase letter that follows a
/// lowercase letter or digit, and before the last capital of an acronym
/// that is followed by a lowercase letter. Non-alphanumeric characters
/// become single underscores.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }

        out.extend(c.to_lowercase());
    }

    out.trim_end_matches('_').to_string()
}

/// Wrap a value in backticks for a `filter_by` expression.
///
/// Backticks inside the value are doubled.
///
/// # Examples
///
/// ```
/// use fieldmark_core::util::ids::escape_filter_value;
///
/// assert_eq!(escape_filter_value("film_Intro"), "`film_Intro`");
/// assert_eq!(escape_filter_value("a`b"), "`a``b`");
/// ```
pub fn escape_filter_value(value: &str) -> String {
    format!("`{}`", value.replace('`', "``"))
}

/// Build an `id:[...]` filter matching any of the given IDs.
pub fn id_filter<S: AsRef<str>>(ids: &[S]) -> String {
    let escaped: Vec<String> = ids
        .iter()
        .map(|id| escape_filter_value(id.as_ref()))
        .collect();
    format!("id:[{}]", escaped.join(","))
}

/// Returns `true` if the ID would change under form URL encoding.
///
/// Only ASCII letters, digits, `-`, `_` and `.` survive encoding unchanged.
/// The empty ID encodes to itself.
pub fn requires_url_encoding(id: &str) -> bool {
    !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
