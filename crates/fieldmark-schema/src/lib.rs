//! Schema compilation for Fieldmark.
//!
//! A record type describes its declared fields once, as a
//! [`RecordDescriptor`]. Fields carrying a [`FieldAttribute`] become schema
//! columns; their engine types are inferred from the declaration unless
//! overridden. The [`SchemaCompiler`] validates the result and derives the
//! `query_by` and `sort_by` search parameters.
//!
//! # Example
//!
//! ```
//! use fieldmark_schema::{CompiledSchema, FieldAttribute, FieldDescriptor, RecordDescriptor};
//!
//! let descriptor = RecordDescriptor::builder("ArticleCollection")
//!     .field(FieldDescriptor::string("id"))
//!     .field(FieldDescriptor::string("title").attribute(FieldAttribute::new().query()))
//!     .field(FieldDescriptor::int("year").attribute(FieldAttribute::new()))
//!     .build();
//!
//! let compiled = CompiledSchema::compile(&descriptor).unwrap();
//! assert_eq!(compiled.name(), "article");
//! assert_eq!(compiled.query_by, "title");
//! assert_eq!(compiled.sort_by.as_deref(), Some("_text_match:desc,year:desc"));
//! ```

pub mod attribute;
pub mod compiler;
pub mod descriptor;
pub mod field;
pub mod inference;
pub mod schema;

mod proptests;

pub use attribute::{FieldAttribute, SortDirection, SortSpec};
pub use compiler::{CompiledSchema, MAX_SORT_FIELDS, SchemaCompiler, TEXT_MATCH_SORT};
pub use descriptor::{
    DeclaredType, FieldDescriptor, RESERVED_FIELD_NAMES, RecordDescriptor,
    RecordDescriptorBuilder, is_reserved_field_name,
};
pub use field::{Field, FieldType, VectorDistance};
pub use inference::{infer_field_type, infer_from_type_name};
pub use schema::Schema;
