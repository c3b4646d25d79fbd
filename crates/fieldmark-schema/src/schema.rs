//! Collection schema sent to the search engine.

use std::collections::HashSet;

use fieldmark_core::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::field::Field;

/// A validated collection schema.
///
/// Field names are unique. `enable_nested_fields` is switched on
/// automatically when any field holds objects, unless it was set
/// explicitly. Unset options are omitted from the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_sorting_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_separators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbols_to_index: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_nested_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
}

impl Schema {
    /// Create a schema, rejecting duplicate field names.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_schema("Schema name must not be empty."));
        }
        validate_fields(&fields)?;

        let enable_nested_fields = nested_fields_required(&fields).then_some(true);
        Ok(Self {
            name,
            fields,
            default_sorting_field: None,
            token_separators: None,
            symbols_to_index: None,
            enable_nested_fields,
            metadata: None,
        })
    }

    /// Set the default sorting field.
    pub fn with_default_sorting_field(mut self, field: Option<String>) -> Self {
        self.default_sorting_field = field;
        self
    }

    /// Characters that split tokens in addition to whitespace.
    pub fn with_token_separators(mut self, separators: Vec<String>) -> Self {
        self.token_separators = Some(separators);
        self
    }

    /// Symbols that are indexed instead of dropped.
    pub fn with_symbols_to_index(mut self, symbols: Vec<String>) -> Self {
        self.symbols_to_index = Some(symbols);
        self
    }

    /// Set nested-field support explicitly, or pass `None` to derive it
    /// from the field types again.
    pub fn with_enable_nested_fields(mut self, enable: Option<bool>) -> Self {
        self.enable_nested_fields =
            enable.or_else(|| nested_fields_required(&self.fields).then_some(true));
        self
    }

    /// Attach a metadata entry. The value is stored in serialized form.
    pub fn with_metadata<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        Ok(self)
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Default sorting field, if any.
    pub fn default_sorting_field(&self) -> Option<&str> {
        self.default_sorting_field.as_deref()
    }

    /// Extra token separators.
    pub fn token_separators(&self) -> Option<&[String]> {
        self.token_separators.as_deref()
    }

    /// Indexed symbols.
    pub fn symbols_to_index(&self) -> Option<&[String]> {
        self.symbols_to_index.as_deref()
    }

    /// Nested-field support.
    pub fn enable_nested_fields(&self) -> Option<bool> {
        self.enable_nested_fields
    }

    /// Free-form metadata.
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// JSON body for collection creation.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn validate_fields(fields: &[Field]) -> Result<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(Error::invalid_schema(format!(
                "Field name \"{}\" is already used in this schema.",
                field.name
            )));
        }
    }
    Ok(())
}

fn nested_fields_required(fields: &[Field]) -> bool {
    fields.iter().any(|f| f.field_type.is_object())
}

// ============================================================================
// Tests
// ============================================================================
