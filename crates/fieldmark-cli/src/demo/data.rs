//! Sample application data behind the demo collections.

use serde::Serialize;

/// A site page, optionally translated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub id: u32,
    pub title: &'static str,
    pub content: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<&'static str>,
    /// Unpublished pages are removed from the index.
    #[serde(skip)]
    pub unpublished: bool,
}

/// A still image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub title: &'static str,
    pub author: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'static str>,
}

/// A video with its running time in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub title: &'static str,
    pub author: &'static str,
    pub length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<&'static str>,
}

const fn page(id: u32, title: &'static str, content: &'static str) -> Page {
    Page {
        id,
        title,
        content,
        locale: None,
        unpublished: false,
    }
}

const fn translated(
    id: u32,
    locale: &'static str,
    title: &'static str,
    content: &'static str,
) -> Page {
    Page {
        id,
        title,
        content,
        locale: Some(locale),
        unpublished: false,
    }
}

const fn unpublished(mut page: Page) -> Page {
    page.unpublished = true;
    page
}

static PAGES: [Page; 9] = [
    page(1, "Welcome", "What the handbook covers and who it is written for."),
    page(2, "Installing", "Set up the toolchain and run the test suite locally."),
    page(3, "Search API", "Query parameters, pagination and sorting of search results."),
    translated(1, "de", "Willkommen", "Worum es im Handbuch geht und für wen es gedacht ist."),
    page(4, "Contributing", "How to propose changes, write tests and review code."),
    unpublished(page(5, "Release notes 0.1", "Changes in the first public release.")),
    translated(2, "fr", "Installation", "Installer les outils et lancer les tests en local."),
    page(6, "Architecture", "Modules, data flow and the sync pipeline at a glance."),
    unpublished(translated(3, "de", "Such-API (alt)", "Veraltete Beschreibung der Suchparameter.")),
];

static IMAGES: [Image; 5] = [
    Image {
        title: "Harbour at Dawn",
        author: "A. Rivera",
        description: Some("Fishing boats leaving the harbour in early light."),
        caption: Some("Morning departure"),
    },
    Image {
        title: "Ridge Trail",
        author: "J. Kim",
        description: Some("A narrow path along an alpine ridge in late summer."),
        caption: Some("Hiking route"),
    },
    Image {
        title: "Night Market",
        author: "L. Müller",
        description: Some("Lanterns and food stalls on a crowded evening street."),
        caption: None,
    },
    Image {
        title: "Tea & Notes",
        author: "R. Singh",
        description: None,
        caption: Some("Desk still life"),
    },
    Image {
        title: "Portrait: The Beekeeper",
        author: "D. Lopez",
        description: Some("Environmental portrait of a beekeeper at work."),
        caption: Some("Portrait session"),
    },
];

static VIDEOS: [Video; 3] = [
    Video {
        title: "Indexing in Five Minutes",
        author: "M. Rossi",
        length: 5.5,
        description: Some("Walkthrough of the index command against a local service."),
        transcript: Some("Today we index the demo collections from scratch."),
    },
    Video {
        title: "Tuning Relevance",
        author: "E. Okoro",
        length: 12.0,
        description: Some("How query priorities and sort fields change result order."),
        transcript: None,
    },
    Video {
        title: "Q&A: Schema Design",
        author: "S. Patel",
        length: 41.25,
        description: None,
        transcript: Some("Questions from the community about field types."),
    },
];

/// Source of the demo data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataRepository;

impl DataRepository {
    /// All pages, published or not.
    pub fn pages(&self) -> &'static [Page] {
        &PAGES
    }

    /// All images.
    pub fn images(&self) -> &'static [Image] {
        &IMAGES
    }

    /// All videos.
    pub fn videos(&self) -> &'static [Video] {
        &VIDEOS
    }
}
