//! Type-keyed registry of compiled collection schemas.
//!
//! Every record type is compiled once when the registry is built. The
//! built registry is immutable and can be shared across tasks behind an
//! `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = SchemaRegistry::builder()
//!     .register::<Content>()?
//!     .register::<Media>()?
//!     .build();
//!
//! let content = registry.get_type::<Content>()?;
//! println!("{}", content.compiled().query_by);
//! ```

use std::any::TypeId;
use std::collections::HashMap;

use fieldmark_core::{Error, Result};
use fieldmark_schema::{CompiledSchema, RecordDescriptor, Schema};
use serde_json::{Map, Value};

use crate::document::{AnyDocument, CollectionType, Document};

/// Pseudo collection name selecting every registered collection.
pub const ALL_COLLECTIONS: &str = "all";

/// A registered record type with its compiled schema.
#[derive(Debug, Clone)]
pub struct RegisteredCollection {
    collection_type: CollectionType,
    descriptor: RecordDescriptor,
    compiled: CompiledSchema,
}

impl RegisteredCollection {
    fn compile(collection_type: CollectionType) -> Result<Self> {
        let descriptor = collection_type.descriptor();
        let compiled = CompiledSchema::compile(&descriptor)?;
        Ok(Self {
            collection_type,
            descriptor,
            compiled,
        })
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        self.compiled.name()
    }

    /// Record type.
    pub fn collection_type(&self) -> CollectionType {
        self.collection_type
    }

    /// Declared fields of the record type.
    pub fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    /// Compiled schema and search parameters.
    pub fn compiled(&self) -> &CompiledSchema {
        &self.compiled
    }

    /// Collection schema.
    pub fn schema(&self) -> &Schema {
        &self.compiled.schema
    }

    /// Decode a document map into a record.
    pub fn decode(&self, map: Map<String, Value>) -> Result<Box<dyn AnyDocument>> {
        self.collection_type.decode(&self.descriptor, map)
    }
}

/// Immutable registry of record types keyed by type identity and by
/// collection name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: Vec<RegisteredCollection>,
    by_type: HashMap<TypeId, usize>,
    by_name: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Start building a registry.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Look up a record type.
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredType` when the type was never registered.
    pub fn get(&self, collection_type: &CollectionType) -> Result<&RegisteredCollection> {
        self.by_type
            .get(&collection_type.type_id())
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::UnregisteredType {
                type_name: collection_type.type_name().to_string(),
            })
    }

    /// Look up the record type `T`.
    pub fn get_type<T: Document>(&self) -> Result<&RegisteredCollection> {
        self.get(&CollectionType::of::<T>())
    }

    /// Look up a collection by name.
    pub fn by_name(&self, name: &str) -> Option<&RegisteredCollection> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Registered collections in registration order.
    pub fn collections(&self) -> impl Iterator<Item = &RegisteredCollection> {
        self.entries.iter()
    }

    /// Collection names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve user-supplied collection names.
    ///
    /// `all` selects every collection and cannot be combined with other
    /// names. The result follows registration order.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for unknown names, listing the valid ones,
    /// or when `all` is mixed with other names.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<CollectionType>> {
        for name in names {
            let name = name.as_ref();
            if name != ALL_COLLECTIONS && !self.by_name.contains_key(name) {
                let mut valid = vec![ALL_COLLECTIONS];
                valid.extend(self.names());
                return Err(Error::config(format!(
                    "The collection \"{name}\" is not valid. Valid collections are: \"{}\".",
                    valid.join("\", \"")
                )));
            }
        }

        if names.iter().any(|n| n.as_ref() == ALL_COLLECTIONS) {
            if names.len() > 1 {
                return Err(Error::config(format!(
                    "The collection \"{ALL_COLLECTIONS}\" cannot be combined with other collections."
                )));
            }
            return Ok(self.entries.iter().map(|e| e.collection_type).collect());
        }

        Ok(self
            .entries
            .iter()
            .filter(|e| names.iter().any(|n| n.as_ref() == e.name()))
            .map(|e| e.collection_type)
            .collect())
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    registry: SchemaRegistry,
}

impl SchemaRegistryBuilder {
    /// Compile and register the record type `T`.
    ///
    /// # Errors
    ///
    /// Propagates compilation errors. Returns `InvalidSchema` when `T` is
    /// already registered or another type compiles to the same collection
    /// name.
    pub fn register<T: Document>(self) -> Result<Self> {
        self.register_type(CollectionType::of::<T>())
    }

    /// Compile and register a record type.
    pub fn register_type(mut self, collection_type: CollectionType) -> Result<Self> {
        let registry = &mut self.registry;
        if registry.by_type.contains_key(&collection_type.type_id()) {
            return Err(Error::invalid_schema(format!(
                "\"{}\" is already registered.",
                collection_type.type_name()
            )));
        }

        let entry = RegisteredCollection::compile(collection_type)?;
        if let Some(&existing) = registry.by_name.get(entry.name()) {
            return Err(Error::invalid_schema(format!(
                "\"{}\" and \"{}\" both compile to the collection \"{}\".",
                registry.entries[existing].collection_type.type_name(),
                collection_type.type_name(),
                entry.name()
            )));
        }

        log::debug!(
            "Registered collection \"{}\" for {}",
            entry.name(),
            collection_type.type_name()
        );
        let index = registry.entries.len();
        registry.by_type.insert(collection_type.type_id(), index);
        registry.by_name.insert(entry.name().to_string(), index);
        registry.entries.push(entry);
        Ok(self)
    }

    /// Finish the registry.
    pub fn build(self) -> SchemaRegistry {
        self.registry
    }
}

// ============================================================================
// Tests
// ============================================================================
