//! Schema columns and their engine types.

use std::fmt;
use std::str::FromStr;

use fieldmark_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Field types understood by the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Let the engine infer the type at ingest time.
    #[serde(rename = "auto")]
    Auto,
    /// `bool`
    #[serde(rename = "bool")]
    Bool,
    /// `bool[]`
    #[serde(rename = "bool[]")]
    BoolArray,
    /// `float`
    #[serde(rename = "float")]
    Float,
    /// `float[]`
    #[serde(rename = "float[]")]
    FloatArray,
    /// `geopoint`
    #[serde(rename = "geopoint")]
    Geopoint,
    /// `geopoint[]`
    #[serde(rename = "geopoint[]")]
    GeopointArray,
    /// `geopolygon`
    #[serde(rename = "geopolygon")]
    Geopolygon,
    /// `image`
    #[serde(rename = "image")]
    Image,
    /// `int32`
    #[serde(rename = "int32")]
    Int32,
    /// `int32[]`
    #[serde(rename = "int32[]")]
    Int32Array,
    /// `int64`
    #[serde(rename = "int64")]
    Int64,
    /// `int64[]`
    #[serde(rename = "int64[]")]
    Int64Array,
    /// `object`
    #[serde(rename = "object")]
    Object,
    /// `object[]`
    #[serde(rename = "object[]")]
    ObjectArray,
    /// `string`
    #[serde(rename = "string")]
    String,
    /// `string[]`
    #[serde(rename = "string[]")]
    StringArray,
    /// `string*`: string or array of strings.
    #[serde(rename = "string*")]
    StringAuto,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 18] = [
        FieldType::Auto,
        FieldType::Bool,
        FieldType::BoolArray,
        FieldType::Float,
        FieldType::FloatArray,
        FieldType::Geopoint,
        FieldType::GeopointArray,
        FieldType::Geopolygon,
        FieldType::Image,
        FieldType::Int32,
        FieldType::Int32Array,
        FieldType::Int64,
        FieldType::Int64Array,
        FieldType::Object,
        FieldType::ObjectArray,
        FieldType::String,
        FieldType::StringArray,
        FieldType::StringAuto,
    ];

    /// Engine spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Auto => "auto",
            FieldType::Bool => "bool",
            FieldType::BoolArray => "bool[]",
            FieldType::Float => "float",
            FieldType::FloatArray => "float[]",
            FieldType::Geopoint => "geopoint",
            FieldType::GeopointArray => "geopoint[]",
            FieldType::Geopolygon => "geopolygon",
            FieldType::Image => "image",
            FieldType::Int32 => "int32",
            FieldType::Int32Array => "int32[]",
            FieldType::Int64 => "int64",
            FieldType::Int64Array => "int64[]",
            FieldType::Object => "object",
            FieldType::ObjectArray => "object[]",
            FieldType::String => "string",
            FieldType::StringArray => "string[]",
            FieldType::StringAuto => "string*",
        }
    }

    /// Scalar numeric types. These are sortable unless sorting is disabled.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Float | FieldType::Int32 | FieldType::Int64)
    }

    /// Types that require nested-field support in the collection.
    pub fn is_object(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::ObjectArray)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::invalid_property(format!("Unknown field type \"{s}\"")))
    }
}

/// Distance metric for vector fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDistance {
    /// Cosine similarity.
    Cosine,
    /// Inner product.
    Ip,
}

/// One schema column.
///
/// Only built through [`Field::new`] and its setters, so a locale always
/// comes with its name suffix. Unset flags are omitted from the serialized
/// form so the engine applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Column name, including the locale suffix when a locale is set.
    pub name: String,

    /// Engine type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Enable faceting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<bool>,
    /// Documents may omit the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// Index the field for search and filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    /// Persist the value on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    /// Enable sorting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<bool>,
    /// Enable infix search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    /// Embedding dimensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_dim: Option<u32>,
    /// Embedding distance metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vec_dist: Option<VectorDistance>,
    /// Join reference, e.g. `authors.id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Optimise numeric range filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_index: Option<bool>,
    /// Stem values before indexing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem: Option<bool>,
}

impl Field {
    /// Create a field with every optional flag unset.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            facet: None,
            optional: None,
            index: None,
            store: None,
            sort: None,
            infix: None,
            locale: None,
            num_dim: None,
            vec_dist: None,
            reference: None,
            range_index: None,
            stem: None,
        }
    }

    /// Set the locale and append `_<locale>` to the name.
    ///
    /// Calling this again replaces the previous suffix instead of stacking a
    /// second one.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        if let Some(previous) = self.locale.take() {
            let suffix = format!("_{previous}");
            if let Some(stem) = self.name.strip_suffix(&suffix) {
                self.name = stem.to_string();
            }
        }
        let locale = locale.into();
        self.name = format!("{}_{locale}", self.name);
        self.locale = Some(locale);
        self
    }

    /// Locale the field is analysed with, if any.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Set the `facet` flag.
    pub fn with_facet(mut self, facet: bool) -> Self {
        self.facet = Some(facet);
        self
    }

    /// Set the `optional` flag.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Set the `sort` flag.
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the `index` flag.
    pub fn with_index(mut self, index: bool) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the `store` flag.
    pub fn with_store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the `infix` flag.
    pub fn with_infix(mut self, infix: bool) -> Self {
        self.infix = Some(infix);
        self
    }

    /// Configure the field as an embedding vector.
    pub fn with_vector(mut self, num_dim: u32, vec_dist: VectorDistance) -> Self {
        self.num_dim = Some(num_dim);
        self.vec_dist = Some(vec_dist);
        self
    }

    /// Reference a field of another collection, e.g. `authors.id`.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the `range_index` flag.
    pub fn with_range_index(mut self, range_index: bool) -> Self {
        self.range_index = Some(range_index);
        self
    }

    /// Set the `stem` flag.
    pub fn with_stem(mut self, stem: bool) -> Self {
        self.stem = Some(stem);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
