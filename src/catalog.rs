//! Catalog content lookups used to attach product and image URLs to order lines.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Reference to a catalog content item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLink(pub String);

impl ContentLink {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[async_trait]
pub trait CatalogUrlResolver: Send + Sync {
    /// Resolves a SKU to its content item
    async fn content_link(&self, code: &str) -> Option<ContentLink>;

    /// Canonical public URL of a content item
    async fn url(&self, link: &ContentLink) -> Option<String>;

    /// URL of the first media asset of a variant
    async fn variant_image_url(&self, link: &ContentLink) -> Option<String>;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    link: ContentLink,
    url: String,
    images: Vec<String>,
}

/// Catalog backed by a concurrent map keyed by SKU
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    entries: Arc<DashMap<String, CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, code: &str, url: impl Into<String>, images: Vec<String>) -> ContentLink {
        let link = ContentLink::new(format!("content:{}", code));
        self.entries.insert(
            code.to_string(),
            CatalogEntry {
                link: link.clone(),
                url: url.into(),
                images,
            },
        );
        link
    }

    fn by_link(&self, link: &ContentLink) -> Option<CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.link == *link)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl CatalogUrlResolver for InMemoryCatalog {
    async fn content_link(&self, code: &str) -> Option<ContentLink> {
        self.entries.get(code).map(|entry| entry.link.clone())
    }

    async fn url(&self, link: &ContentLink) -> Option<String> {
        self.by_link(link).map(|entry| entry.url)
    }

    async fn variant_image_url(&self, link: &ContentLink) -> Option<String> {
        self.by_link(link)
            .and_then(|entry| entry.images.into_iter().next())
    }
}
