//! Static description of a record type's declared fields.
//!
//! A [`RecordDescriptor`] is built once per record type and is the only
//! input the schema compiler and the document codec need. It lists every
//! declared field, schema field or not, in declaration order.

use serde_json::Value;

use crate::attribute::FieldAttribute;

/// Field name that can never carry data.
pub const RESERVED_FIELD_NAMES: &[&str] = &["schema"];

/// Returns `true` for names reserved by the record machinery.
pub fn is_reserved_field_name(name: &str) -> bool {
    RESERVED_FIELD_NAMES.contains(&name)
}

/// Declared value type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// Any integer type.
    Int,
    /// Any floating-point type.
    Float,
    /// `bool`
    Bool,
    /// Any string type.
    String,
    /// A struct, enum, or trait object, named by type.
    Named(String),
    /// An untyped sequence or map; needs a hint to be indexed precisely.
    Array,
    /// Arbitrary JSON.
    Mixed,
}

impl DeclaredType {
    /// The type name used when no hint is present.
    ///
    /// Returns `None` for declarations that say nothing about the shape.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            DeclaredType::Int => Some("int"),
            DeclaredType::Float => Some("float"),
            DeclaredType::Bool => Some("bool"),
            DeclaredType::String => Some("string"),
            DeclaredType::Named(name) => Some(name),
            DeclaredType::Array => Some("array"),
            DeclaredType::Mixed => None,
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name as it appears in documents.
    pub name: String,
    /// Declared value type.
    pub declared: DeclaredType,
    /// Element or shape hint such as `list<string>` or `Vec<i64>`.
    pub hint: Option<String>,
    /// Whether the field accepts null.
    pub nullable: bool,
    /// Value used when a document does not supply the field.
    pub default: Option<Value>,
    /// Schema attributes. At most one is allowed.
    pub attributes: Vec<FieldAttribute>,
}

impl FieldDescriptor {
    /// Declare a field.
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared,
            hint: None,
            nullable: false,
            default: None,
            attributes: Vec::new(),
        }
    }

    /// Declare a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::String)
    }

    /// Declare an integer field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Int)
    }

    /// Declare a floating-point field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Float)
    }

    /// Declare a boolean field.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Bool)
    }

    /// Declare a field holding a named type.
    pub fn named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Named(type_name.into()))
    }

    /// Declare a sequence field with an element hint.
    pub fn array(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Array).hint(hint)
    }

    /// Attach an element or shape hint.
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Allow null.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the field is missing.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Attach a schema attribute.
    pub fn attribute(mut self, attribute: FieldAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Whether the field is reserved and must not carry data.
    pub fn is_reserved(&self) -> bool {
        is_reserved_field_name(&self.name)
    }
}

/// Declared shape of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    /// Rust type name of the record, possibly module-qualified.
    pub type_name: String,
    /// Declared fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Start a descriptor for the named type.
    pub fn builder(type_name: impl Into<String>) -> RecordDescriptorBuilder {
        RecordDescriptorBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Start a descriptor named after `T`.
    pub fn for_type<T: ?Sized>() -> RecordDescriptorBuilder {
        Self::builder(std::any::type_name::<T>())
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Unqualified type name, e.g. `Media` for `app::search::Media`.
    pub fn short_type_name(&self) -> &str {
        let base = self.type_name.split('<').next().unwrap_or(&self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

/// Builder for [`RecordDescriptor`].
#[derive(Debug, Clone)]
pub struct RecordDescriptorBuilder {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptorBuilder {
    /// Append a declared field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> RecordDescriptor {
        RecordDescriptor {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
