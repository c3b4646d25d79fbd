//! Repositories feeding the demo collections and presenting their hits.

use async_trait::async_trait;
use fieldmark_core::Result;
use fieldmark_search::{AnyDocument, CollectionType, Repository, RepositoryData};
use serde::Serialize;
use serde_json::Value;

use super::collections::{Content, Media, MediaKind};
use super::data::{DataRepository, Image, Page, Video};

/// A search hit resolved back to its source record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchItem {
    Page(Page),
    Image(Image),
    Video(Video),
}

/// Document id of a page: the page id, suffixed with the locale for
/// translations.
pub fn content_id(page: &Page) -> String {
    match page.locale {
        Some(locale) => format!("{}_{locale}", page.id),
        None => page.id.to_string(),
    }
}

fn to_content(page: &Page) -> Content {
    Content {
        id: content_id(page),
        title: page.title.to_string(),
        content: page.content.to_string(),
        locale: page.locale.map(str::to_string),
    }
}

fn image_media(image: &Image) -> Media {
    Media {
        kind: MediaKind::Image,
        title: image.title.to_string(),
        author: image.author.to_string(),
        length: None,
        description: image.description.map(str::to_string),
        caption: image.caption.map(str::to_string),
    }
}

fn video_media(video: &Video) -> Media {
    Media {
        kind: MediaKind::Video,
        title: video.title.to_string(),
        author: video.author.to_string(),
        length: Some(video.length),
        description: video.description.map(str::to_string),
        caption: video.transcript.map(str::to_string),
    }
}

/// Pages as [`Content`] records. Unpublished pages are deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRepository {
    data: DataRepository,
}

impl ContentRepository {
    pub fn new(data: DataRepository) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Repository for ContentRepository {
    type Item = SearchItem;

    fn supports(&self, collection: &CollectionType) -> bool {
        collection.is::<Content>()
    }

    async fn data(&self) -> Result<RepositoryData> {
        let mut data = RepositoryData::default();
        for page in self.data.pages() {
            let record: Box<dyn AnyDocument> = Box::new(to_content(page));
            if page.unpublished {
                data.deletions.push(record);
            } else {
                data.upserts.push(record);
            }
        }
        Ok(data)
    }

    fn transform(&self, record: &dyn AnyDocument, _hit: &Value) -> Option<SearchItem> {
        let content = record.downcast_ref::<Content>()?;
        self.data
            .pages()
            .iter()
            .find(|page| content_id(page) == content.id)
            .cloned()
            .map(SearchItem::Page)
    }
}

/// Images and videos as [`Media`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaRepository {
    data: DataRepository,
}

impl MediaRepository {
    pub fn new(data: DataRepository) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Repository for MediaRepository {
    type Item = SearchItem;

    fn supports(&self, collection: &CollectionType) -> bool {
        collection.is::<Media>()
    }

    async fn data(&self) -> Result<RepositoryData> {
        let images = self.data.images().iter().map(image_media);
        let videos = self.data.videos().iter().map(video_media);
        Ok(RepositoryData {
            upserts: images
                .chain(videos)
                .map(|m| Box::new(m) as Box<dyn AnyDocument>)
                .collect(),
            deletions: Vec::new(),
        })
    }

    fn transform(&self, record: &dyn AnyDocument, _hit: &Value) -> Option<SearchItem> {
        let media = record.downcast_ref::<Media>()?;
        match media.kind {
            MediaKind::Image => self
                .data
                .images()
                .iter()
                .find(|image| image.title == media.title)
                .cloned()
                .map(SearchItem::Image),
            MediaKind::Video => self
                .data
                .videos()
                .iter()
                .find(|video| video.title == media.title)
                .cloned()
                .map(SearchItem::Video),
        }
    }
}
