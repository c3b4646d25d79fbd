//! Field type inference.
//!
//! Maps a declared field to an engine [`FieldType`]. Resolution order:
//!
//! 1. An explicit type on the field attribute wins.
//! 2. Otherwise the element/shape hint is parsed, falling back to the
//!    declared type when there is no hint.
//! 3. Primitive spellings map to scalars, named types to `object`.
//! 4. Containers (`list<T>`, `Vec<T>`, `T[]`, ...) map to the array type of
//!    their element. Maps keyed by integers use the value type.
//! 5. Anything else is `auto`.
//!
//! Inference is a pure function of its inputs.

use std::sync::LazyLock;

use regex::Regex;

use crate::attribute::FieldAttribute;
use crate::descriptor::FieldDescriptor;
use crate::field::FieldType;

/// Container prefixes recognised in hints.
const CONTAINER_PREFIXES: &[&str] = &[
    "array<",
    "non-empty-array<",
    "list<",
    "non-empty-list<",
    "Vec<",
    "VecDeque<",
    "HashSet<",
    "BTreeSet<",
    "HashMap<",
    "BTreeMap<",
];

/// Key types that make a two-argument container a plain sequence of values.
const INTEGER_KEYS: &[&str] = &[
    "int", "array-key", "usize", "u8", "u16", "u32", "u64", "i8", "i16", "i32", "i64",
];

static CONTAINER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:array|non-empty-array|list|non-empty-list|Vec|VecDeque|HashSet|BTreeSet|HashMap|BTreeMap)<\s*([^\s,>]+)(?:\s*,\s*[^\s>]+)?\s*>",
    )
    .expect("Invalid container hint regex")
});

/// Scalar categories a type spelling can denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
    Int,
    Float,
    Bool,
    String,
    Object,
}

impl Primitive {
    fn parse(name: &str) -> Option<Self> {
        let primitive = match name {
            "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16"
            | "u32" | "u64" | "u128" | "usize" => Primitive::Int,
            "float" | "double" | "f32" | "f64" => Primitive::Float,
            "bool" | "boolean" => Primitive::Bool,
            "string" | "String" | "str" | "&str" | "char" => Primitive::String,
            "object" => Primitive::Object,
            _ => return None,
        };
        Some(primitive)
    }

    fn scalar(self) -> FieldType {
        match self {
            Primitive::Int => FieldType::Int64,
            Primitive::Float => FieldType::Float,
            Primitive::Bool => FieldType::Bool,
            Primitive::String => FieldType::String,
            Primitive::Object => FieldType::Object,
        }
    }
}

/// Infer the engine type of a declared field under its attribute.
pub fn infer_field_type(field: &FieldDescriptor, attribute: &FieldAttribute) -> FieldType {
    if let Some(field_type) = attribute.field_type {
        return field_type;
    }

    let hinted = field.hint.as_deref().map(str::trim).filter(|h| !h.is_empty());
    match hinted.or_else(|| field.declared.type_name()) {
        Some(type_name) => infer_from_type_name(type_name),
        None => FieldType::Auto,
    }
}

/// Infer the engine type for a type spelling.
///
/// # Examples
///
/// ```
/// use fieldmark_schema::{FieldType, infer_from_type_name};
///
/// assert_eq!(infer_from_type_name("int"), FieldType::Int64);
/// assert_eq!(infer_from_type_name("list<string>"), FieldType::StringArray);
/// assert_eq!(infer_from_type_name("array<int, float>"), FieldType::FloatArray);
/// assert_eq!(infer_from_type_name("Vec<Author>"), FieldType::ObjectArray);
/// assert_eq!(infer_from_type_name("mixed"), FieldType::Auto);
/// ```
pub fn infer_from_type_name(type_name: &str) -> FieldType {
    let type_name = strip_option(type_name.trim());

    if let Some(primitive) = Primitive::parse(type_name) {
        return primitive.scalar();
    }

    if is_named_type(type_name) {
        return FieldType::Object;
    }

    if type_name.starts_with("array{") || type_name.starts_with('{') {
        return if type_name.ends_with("[]") {
            FieldType::ObjectArray
        } else {
            FieldType::Object
        };
    }

    let is_container = type_name.ends_with("[]")
        || CONTAINER_PREFIXES.iter().any(|p| type_name.starts_with(p));
    if !is_container {
        return FieldType::Auto;
    }

    let mut element = type_name.to_string();
    if let Some(caps) = CONTAINER_RE.captures(type_name) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let first = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        element = first.to_string();

        if whole.contains(',') && INTEGER_KEYS.contains(&first) {
            let value = whole
                .trim_end_matches('>')
                .rsplit(',')
                .next()
                .unwrap_or_default()
                .trim();
            if value.ends_with("[]") {
                return FieldType::Object;
            }
            element = value.to_string();
        }
    }

    array_of(element.trim_end_matches("[]"))
}

fn array_of(element: &str) -> FieldType {
    match Primitive::parse(element) {
        Some(Primitive::Int) => FieldType::Int64Array,
        Some(Primitive::Float) => FieldType::FloatArray,
        Some(Primitive::Bool) => FieldType::BoolArray,
        Some(Primitive::String) => FieldType::StringArray,
        Some(Primitive::Object) | None => FieldType::ObjectArray,
    }
}

/// Unwrap `Option<T>` and `?T`; nullability is tracked separately.
fn strip_option(type_name: &str) -> &str {
    if let Some(inner) = type_name
        .strip_prefix("Option<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return strip_option(inner.trim());
    }
    type_name.strip_prefix('?').unwrap_or(type_name)
}

/// A capitalised identifier or path, without generics or array suffix.
fn is_named_type(type_name: &str) -> bool {
    let last = type_name.rsplit("::").next().unwrap_or(type_name);
    let starts_upper = last.chars().next().is_some_and(|c| c.is_ascii_uppercase());

    starts_upper
        && type_name
            .split("::")
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_'))
}
