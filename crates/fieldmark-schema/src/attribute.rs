//! Per-field schema metadata attached to a record's declared fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldType;

/// Sort direction in a `sort_by` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Lowercase spelling used in `sort_by`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort request on a field: a plain on/off switch or an explicit direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    /// `true` enables sorting (descending), `false` disables it.
    Flag(bool),
    /// Sorting enabled in the given direction.
    Direction(SortDirection),
}

impl SortSpec {
    /// Whether the field explicitly asks to be sorted on.
    pub fn requests_sort(&self) -> bool {
        matches!(self, SortSpec::Flag(true) | SortSpec::Direction(_))
    }

    /// Whether sorting was explicitly switched off.
    pub fn is_disabled(&self) -> bool {
        matches!(self, SortSpec::Flag(false))
    }

    /// Direction used in `sort_by`; a bare flag sorts descending.
    pub fn direction(&self) -> SortDirection {
        match self {
            SortSpec::Direction(direction) => *direction,
            SortSpec::Flag(_) => SortDirection::Desc,
        }
    }
}

/// Marks a declared field as a schema field and configures how it is
/// queried and sorted.
///
/// # Example
///
/// ```
/// use fieldmark_schema::{FieldAttribute, SortDirection};
///
/// let title = FieldAttribute::new().query().sort(SortDirection::Asc);
/// let body = FieldAttribute::new().query().query_priority(1).sort_priority(1);
/// # let _ = (title, body);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttribute {
    /// Explicit engine type; inferred from the declaration when unset.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Sort request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,

    /// Position in `sort_by`; higher comes first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_priority: Option<i32>,

    /// Use this field as the collection's default sorting field.
    #[serde(default)]
    pub is_default_sorting_field: bool,

    /// Include the field in `query_by`.
    #[serde(default)]
    pub query: bool,

    /// Position in `query_by`; higher comes first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_priority: Option<i32>,
}

impl FieldAttribute {
    /// Attribute with everything unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the inferred type.
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sort in the given direction.
    pub fn sort(mut self, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec::Direction(direction));
        self
    }

    /// Enable sorting without choosing a direction.
    pub fn sortable(mut self) -> Self {
        self.sort = Some(SortSpec::Flag(true));
        self
    }

    /// Disable sorting, including the implicit sorting of numeric fields.
    pub fn unsortable(mut self) -> Self {
        self.sort = Some(SortSpec::Flag(false));
        self
    }

    /// Set the `sort_by` priority.
    pub fn sort_priority(mut self, priority: i32) -> Self {
        self.sort_priority = Some(priority);
        self
    }

    /// Mark as the default sorting field.
    pub fn default_sorting_field(mut self) -> Self {
        self.is_default_sorting_field = true;
        self
    }

    /// Include in `query_by`.
    pub fn query(mut self) -> Self {
        self.query = true;
        self
    }

    /// Set the `query_by` priority.
    pub fn query_priority(mut self, priority: i32) -> Self {
        self.query_priority = Some(priority);
        self
    }

    /// Whether a field of `field_type` carrying this attribute is sortable.
    ///
    /// Numeric fields are sortable unless sorting is switched off. Other
    /// fields need an explicit sort request or a sort priority.
    pub fn is_sortable(&self, field_type: FieldType) -> bool {
        if field_type.is_numeric() {
            !self.sort.is_some_and(|s| s.is_disabled())
        } else {
            self.sort.is_some_and(|s| s.requests_sort()) || self.sort_priority.is_some()
        }
    }
}
