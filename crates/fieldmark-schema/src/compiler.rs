//! Schema compilation.
//!
//! Turns a [`RecordDescriptor`] into the collection [`Schema`] plus the
//! derived `query_by` and `sort_by` search parameters.
//!
//! # Sort-by padding
//!
//! At most [`MAX_SORT_FIELDS`] entries are allowed. When fewer explicit
//! sortable fields exist, `_text_match:desc` is prepended. If the list is
//! still short and a default sorting field exists, `<field>:desc` is
//! appended. No further synthetic entries are added, so the result may hold
//! fewer than three entries.

use fieldmark_core::{Error, Result, schema_name_for_type};

use crate::attribute::{FieldAttribute, SortDirection};
use crate::descriptor::{FieldDescriptor, RecordDescriptor};
use crate::field::{Field, FieldType};
use crate::inference::infer_field_type;
use crate::schema::Schema;

/// Maximum number of entries in `sort_by`.
pub const MAX_SORT_FIELDS: usize = 3;

/// Relevance entry placed first in a padded `sort_by`.
pub const TEXT_MATCH_SORT: &str = "_text_match:desc";

/// Output of compiling a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    /// Collection schema.
    pub schema: Schema,
    /// Comma-separated queryable fields, highest priority first.
    pub query_by: String,
    /// Comma-separated sort expression, if any.
    pub sort_by: Option<String>,
}

impl CompiledSchema {
    /// Compile a record descriptor.
    pub fn compile(descriptor: &RecordDescriptor) -> Result<Self> {
        SchemaCompiler::new(descriptor)?.compile()
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// `query_by` and, when present, `sort_by` as request parameters.
    pub fn search_parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters = vec![("query_by", self.query_by.clone())];
        if let Some(sort_by) = &self.sort_by {
            parameters.push(("sort_by", sort_by.clone()));
        }
        parameters
    }
}

/// A declared field that carries a schema attribute.
#[derive(Debug, Clone)]
struct SchemaField<'a> {
    descriptor: &'a FieldDescriptor,
    attribute: &'a FieldAttribute,
    field_type: FieldType,
}

impl SchemaField<'_> {
    fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Compiles one record descriptor.
///
/// Only fields with exactly one [`FieldAttribute`] take part; reserved
/// names are skipped.
#[derive(Debug, Clone)]
pub struct SchemaCompiler<'a> {
    descriptor: &'a RecordDescriptor,
    fields: Vec<SchemaField<'a>>,
}

impl<'a> SchemaCompiler<'a> {
    /// Collect the attributed fields of a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProperty` when a field carries several attributes.
    pub fn new(descriptor: &'a RecordDescriptor) -> Result<Self> {
        let mut fields = Vec::new();

        for field in &descriptor.fields {
            if field.is_reserved() {
                continue;
            }
            let attribute = match field.attributes.as_slice() {
                [] => continue,
                [attribute] => attribute,
                _ => {
                    return Err(Error::invalid_property(format!(
                        "Field \"{}\" of \"{}\" has multiple field attributes; only one is allowed.",
                        field.name, descriptor.type_name
                    )));
                }
            };
            fields.push(SchemaField {
                descriptor: field,
                attribute,
                field_type: infer_field_type(field, attribute),
            });
        }

        Ok(Self { descriptor, fields })
    }

    /// Collection name derived from the record type name.
    pub fn schema_name(&self) -> String {
        schema_name_for_type(&self.descriptor.type_name)
    }

    /// Schema fields in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .map(|f| {
                let mut field = Field::new(f.name(), f.field_type);
                field.optional = f.descriptor.nullable.then_some(true);
                field.sort = field_sort_flag(f);
                field
            })
            .collect()
    }

    /// The single field marked as default sorting field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` when more than one field claims it.
    pub fn default_sorting_field(&self) -> Result<Option<&'a str>> {
        let mut found: Option<&'a str> = None;
        for field in &self.fields {
            if !field.attribute.is_default_sorting_field {
                continue;
            }
            if found.is_some() {
                return Err(Error::invalid_schema(format!(
                    "\"{}\" defines more than one default sorting field; only one is allowed.",
                    self.descriptor.type_name
                )));
            }
            found = Some(field.descriptor.name.as_str());
        }
        Ok(found)
    }

    /// Queryable fields ordered by descending query priority.
    ///
    /// Ties keep declaration order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` when no field is queryable.
    pub fn query_by(&self) -> Result<String> {
        let mut queryable: Vec<&SchemaField<'_>> =
            self.fields.iter().filter(|f| f.attribute.query).collect();

        // `sort_by` on slices is stable.
        queryable.sort_by(|a, b| {
            priority(b.attribute.query_priority).cmp(&priority(a.attribute.query_priority))
        });

        if queryable.is_empty() {
            return Err(Error::invalid_schema(format!(
                "\"{}\" does not define any queryable fields.",
                self.descriptor.type_name
            )));
        }

        Ok(queryable
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(","))
    }

    /// Sort expression with relevance and default-field padding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` naming the fourth sortable field, or when
    /// several default sorting fields are declared.
    pub fn sort_by(&self) -> Result<Option<String>> {
        let mut ordered: Vec<&SchemaField<'_>> = self.fields.iter().collect();
        ordered.sort_by(|a, b| {
            priority(b.attribute.sort_priority).cmp(&priority(a.attribute.sort_priority))
        });

        let mut entries: Vec<String> = Vec::with_capacity(MAX_SORT_FIELDS);
        for field in ordered {
            if !field.attribute.is_sortable(field.field_type) {
                continue;
            }
            if entries.len() == MAX_SORT_FIELDS {
                return Err(Error::invalid_schema(format!(
                    "\"{}\" defines too many sortable fields; only {MAX_SORT_FIELDS} are allowed. \
                     Field \"{}\" would be the fourth sortable field.",
                    self.descriptor.type_name,
                    field.name()
                )));
            }
            let direction = field
                .attribute
                .sort
                .map(|s| s.direction())
                .unwrap_or(SortDirection::Desc);
            entries.push(format!("{}:{direction}", field.name()));
        }

        let default_sorting_field = self.default_sorting_field()?;
        // Two synthetic slots at most: relevance first, then the default
        // sorting field. Each considered slot counts toward the limit even
        // when it adds nothing.
        let mut count = entries.len();
        for slot in 0..2 {
            if count >= MAX_SORT_FIELDS {
                break;
            }
            match (slot, default_sorting_field) {
                (0, _) => entries.insert(0, TEXT_MATCH_SORT.to_string()),
                (_, Some(name)) => entries.push(format!("{name}:desc")),
                (_, None) => {}
            }
            count += 1;
        }

        Ok((!entries.is_empty()).then(|| entries.join(",")))
    }

    /// Build the validated schema.
    pub fn schema(&self) -> Result<Schema> {
        let default_sorting_field = self.default_sorting_field()?.map(str::to_string);
        Ok(Schema::new(self.schema_name(), self.fields())?
            .with_default_sorting_field(default_sorting_field))
    }

    /// Build the schema and its search parameters.
    pub fn compile(&self) -> Result<CompiledSchema> {
        let compiled = CompiledSchema {
            schema: self.schema()?,
            query_by: self.query_by()?,
            sort_by: self.sort_by()?,
        };
        log::debug!(
            "Compiled schema \"{}\" from {}: query_by={}, sort_by={}",
            compiled.name(),
            self.descriptor.type_name,
            compiled.query_by,
            compiled.sort_by.as_deref().unwrap_or("-")
        );
        Ok(compiled)
    }
}

fn priority(value: Option<i32>) -> i32 {
    value.unwrap_or(0)
}

/// Field-level `sort` flag.
///
/// Numeric fields only record an explicit opt-out. Other fields are marked
/// sortable when anything asks for sorting on them, including being the
/// default sorting field.
fn field_sort_flag(field: &SchemaField<'_>) -> Option<bool> {
    let attribute = field.attribute;
    if field.field_type.is_numeric() {
        attribute.sort.is_some_and(|s| s.is_disabled()).then_some(false)
    } else {
        (attribute.is_sortable(field.field_type) || attribute.is_default_sorting_field)
            .then_some(true)
    }
}

// ============================================================================
// Tests
// ============================================================================
