//! Demo record types.

use fieldmark_core::{Result, Violation};
use fieldmark_schema::{FieldAttribute, FieldDescriptor, FieldType, RecordDescriptor, SortDirection};
use fieldmark_search::Document;
use serde::{Deserialize, Serialize};

fn not_blank(violations: &mut Vec<Violation>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "This value should not be blank."));
    }
}

/// A page of site content. Translations carry their locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub title: String,
    pub content: String,
    pub locale: Option<String>,
}

impl Document for Content {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::for_type::<Self>()
            .field(FieldDescriptor::string("id").attribute(FieldAttribute::new()))
            .field(
                FieldDescriptor::string("title")
                    .attribute(FieldAttribute::new().query().sort(SortDirection::Asc)),
            )
            .field(
                FieldDescriptor::string("content").attribute(
                    FieldAttribute::new()
                        .query()
                        .query_priority(1)
                        .default_sorting_field()
                        .sort_priority(1),
                ),
            )
            .field(
                FieldDescriptor::string("locale")
                    .nullable()
                    .attribute(FieldAttribute::new().field_type(FieldType::String)),
            )
            .build()
    }

    fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        not_blank(&mut violations, "id", &self.id);
        not_blank(&mut violations, "title", &self.title);
        violations
    }
}

/// Kinds of media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// An image or a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub author: String,
    pub length: Option<f64>,
    pub description: Option<String>,
    pub caption: Option<String>,
}

impl Document for Media {
    fn descriptor() -> RecordDescriptor {
        let queryable = || FieldAttribute::new().query();
        RecordDescriptor::for_type::<Self>()
            .field(FieldDescriptor::string("type").attribute(FieldAttribute::new()))
            .field(FieldDescriptor::string("title").attribute(queryable()))
            .field(FieldDescriptor::string("author").attribute(queryable()))
            .field(
                FieldDescriptor::float("length")
                    .nullable()
                    .attribute(FieldAttribute::new()),
            )
            .field(
                FieldDescriptor::string("description")
                    .nullable()
                    .attribute(queryable()),
            )
            .field(FieldDescriptor::string("caption").nullable().attribute(queryable()))
            .build()
    }

    /// `<type>_<title>` with spaces, colons and ampersands replaced.
    fn document_id(&self) -> Result<String> {
        Ok(format!("{}_{}", self.kind.as_str(), self.title).replace([' ', ':', '&'], "_"))
    }

    fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        not_blank(&mut violations, "title", &self.title);
        not_blank(&mut violations, "author", &self.author);
        violations
    }
}
