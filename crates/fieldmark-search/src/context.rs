//! Search requests and results.

use std::fmt;

use fieldmark_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::document::{CollectionType, Document};

/// Allowed page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    /// 1 hit per page.
    One,
    /// 2 hits per page.
    Two,
    /// 5 hits per page.
    Five,
    /// 10 hits per page.
    #[default]
    Ten,
    /// 20 hits per page.
    Twenty,
    /// 50 hits per page.
    Fifty,
    /// 100 hits per page.
    Hundred,
}

impl PageSize {
    /// Every page size, smallest first.
    pub const ALL: [PageSize; 7] = [
        PageSize::One,
        PageSize::Two,
        PageSize::Five,
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    /// Number of hits per page.
    pub fn get(self) -> u32 {
        match self {
            PageSize::One => 1,
            PageSize::Two => 2,
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| {
                let valid: Vec<String> = PageSize::ALL.iter().map(|s| s.get().to_string()).collect();
                Error::config(format!(
                    "Choose a valid page size value: {value} is not one of {}.",
                    valid.join(", ")
                ))
            })
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A paginated full-text query against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContext {
    collection: CollectionType,
    query: String,
    page: u32,
    page_size: PageSize,
}

impl SearchContext {
    /// First page of an empty query with the default page size.
    pub fn new(collection: CollectionType) -> Self {
        Self {
            collection,
            query: String::new(),
            page: 1,
            page_size: PageSize::default(),
        }
    }

    /// Context for the record type `T`.
    pub fn of<T: Document>() -> Self {
        Self::new(CollectionType::of::<T>())
    }

    /// Set the query text.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the 1-based page number.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for page 0.
    pub fn with_page(mut self, page: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::config("Page numbers start at 1."));
        }
        self.page = page;
        Ok(self)
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Collection to search.
    pub fn collection(&self) -> CollectionType {
        self.collection
    }

    /// Query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Hits per page.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }
}

/// One page of transformed search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult<I> {
    /// Transformed hits in hit order.
    pub items: Vec<I>,
    /// Total matches reported by the engine.
    pub total_count: u64,
}

impl<I> SearchResult<I> {
    /// Result without items.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

impl<I> Default for SearchResult<I> {
    fn default() -> Self {
        Self::empty()
    }
}
