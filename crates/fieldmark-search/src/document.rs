//! Records stored in search collections and their map codec.
//!
//! A record type implements [`Document`] on top of serde. The codec turns
//! records into the flat JSON objects sent to the engine and rebuilds
//! records from the objects found in search hits:
//!
//! - [`to_map`] drops null values and always writes the `id` key from
//!   [`Document::document_id`]
//! - [`from_map`] fills every declared field from the map, then from its
//!   declared default, then with null when the field is nullable. A
//!   mandatory field that stays unset is reported as a codec error.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use fieldmark_core::{Error, Result, Violation};
use fieldmark_schema::RecordDescriptor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Key under which the document identifier is stored.
pub const ID_FIELD: &str = "id";

/// A record type that can be indexed in its own collection.
///
/// # Example
///
/// ```
/// use fieldmark_schema::{FieldAttribute, FieldDescriptor, RecordDescriptor};
/// use fieldmark_search::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Article {
///     id: String,
///     title: String,
/// }
///
/// impl Document for Article {
///     fn descriptor() -> RecordDescriptor {
///         RecordDescriptor::builder("Article")
///             .field(FieldDescriptor::string("id"))
///             .field(FieldDescriptor::string("title").attribute(FieldAttribute::new().query()))
///             .build()
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Declared fields of the record type.
    fn descriptor() -> RecordDescriptor;

    /// Identifier of this record in its collection.
    ///
    /// Defaults to the record's own string `id` field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProperty` when the record has no string `id` field.
    fn document_id(&self) -> Result<String> {
        own_id_field(self)
    }

    /// Constraint violations of this record. Empty when valid.
    fn validate(&self) -> Vec<Violation> {
        Vec::new()
    }
}

fn own_id_field<T: Document>(record: &T) -> Result<String> {
    if let Value::Object(mut map) = serde_json::to_value(record)?
        && let Some(Value::String(id)) = map.remove(ID_FIELD)
    {
        return Ok(id);
    }
    Err(Error::invalid_property(format!(
        "\"{}\" does not expose a string \"id\" field and does not override `Document::document_id`.",
        std::any::type_name::<T>()
    )))
}

/// Serialize a record into a document map.
pub fn to_map<T: Document>(record: &T) -> Result<Map<String, Value>> {
    let Value::Object(map) = serde_json::to_value(record)? else {
        return Err(Error::codec(
            std::any::type_name::<T>(),
            "record does not serialize to a JSON object",
        ));
    };

    let mut map: Map<String, Value> = map.into_iter().filter(|(_, v)| !v.is_null()).collect();
    map.insert(ID_FIELD.to_string(), Value::String(record.document_id()?));
    Ok(map)
}

/// Rebuild a record from a document map.
pub fn from_map<T: Document>(map: Map<String, Value>) -> Result<T> {
    from_map_with(&T::descriptor(), map)
}

/// Rebuild a record using an already built descriptor.
pub fn from_map_with<T: Document>(descriptor: &RecordDescriptor, map: Map<String, Value>) -> Result<T> {
    let resolved = resolve_fields(descriptor, map)?;
    serde_json::from_value(Value::Object(resolved))
        .map_err(|e| Error::codec(descriptor.type_name.as_str(), e.to_string()))
}

/// Pick the value of every declared field from `map`.
///
/// Keys that are not declared fields are dropped.
///
/// # Errors
///
/// Returns `InvalidProperty` when `map` supplies a reserved field.
pub fn resolve_fields(
    descriptor: &RecordDescriptor,
    mut map: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut resolved = Map::new();

    for field in &descriptor.fields {
        if let Some(value) = map.remove(&field.name) {
            if field.is_reserved() {
                return Err(Error::invalid_property(format!(
                    "Field name \"{}\" is reserved and cannot be used.",
                    field.name
                )));
            }
            resolved.insert(field.name.clone(), value);
        } else if field.is_reserved() {
            continue;
        } else if let Some(default) = &field.default {
            resolved.insert(field.name.clone(), default.clone());
        } else if field.nullable {
            resolved.insert(field.name.clone(), Value::Null);
        }
    }

    Ok(resolved)
}

/// Type-erased view of a [`Document`], used where records of different
/// types travel together.
pub trait AnyDocument: Send + Sync {
    /// Access the concrete record.
    fn as_any(&self) -> &dyn Any;

    /// Collection type of the record.
    fn collection_type(&self) -> CollectionType;

    /// Serialize into a document map.
    fn to_document(&self) -> Result<Map<String, Value>>;

    /// Identifier of the record in its collection.
    fn record_id(&self) -> Result<String>;

    /// Constraint violations of the record.
    fn violations(&self) -> Vec<Violation>;
}

impl<T: Document> AnyDocument for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn collection_type(&self) -> CollectionType {
        CollectionType::of::<T>()
    }

    fn to_document(&self) -> Result<Map<String, Value>> {
        to_map(self)
    }

    fn record_id(&self) -> Result<String> {
        self.document_id()
    }

    fn violations(&self) -> Vec<Violation> {
        self.validate()
    }
}

impl dyn AnyDocument + '_ {
    /// Downcast to the concrete record type.
    pub fn downcast_ref<T: Document>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the record is of type `T`.
    pub fn is<T: Document>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

type DecodeFn = fn(&RecordDescriptor, Map<String, Value>) -> Result<Box<dyn AnyDocument>>;

fn decode_boxed<T: Document>(
    descriptor: &RecordDescriptor,
    map: Map<String, Value>,
) -> Result<Box<dyn AnyDocument>> {
    Ok(Box::new(from_map_with::<T>(descriptor, map)?))
}

/// Identity of a record type, with the hooks needed to describe it and to
/// decode its documents without knowing the type statically.
///
/// Equality and hashing use the type identity only.
#[derive(Clone, Copy)]
pub struct CollectionType {
    type_id: TypeId,
    type_name: &'static str,
    describe: fn() -> RecordDescriptor,
    decode: DecodeFn,
}

impl CollectionType {
    /// Collection type of `T`.
    pub fn of<T: Document>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            describe: T::descriptor,
            decode: decode_boxed::<T>,
        }
    }

    /// Rust type identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this is the collection type of `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build the record descriptor.
    pub fn descriptor(&self) -> RecordDescriptor {
        (self.describe)()
    }

    /// Decode a document map into a record of this type.
    pub fn decode(
        &self,
        descriptor: &RecordDescriptor,
        map: Map<String, Value>,
    ) -> Result<Box<dyn AnyDocument>> {
        (self.decode)(descriptor, map)
    }
}

impl PartialEq for CollectionType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CollectionType {}

impl Hash for CollectionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionType").field(&self.type_name).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
