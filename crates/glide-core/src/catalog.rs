//! Read-only video catalog

use crate::media_id::extract_media_id;
use crate::{CategoryRef, MediaId, Result, VideoInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub slug: String,
    pub title: String,
    pub media_url: String,
    #[serde(default, alias = "thumbnail", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Video {
    pub fn media_id(&self) -> Option<MediaId> {
        extract_media_id(&self.media_url)
    }

    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            title: self.title.clone(),
            source_url: self.media_url.clone(),
        }
    }
}

/// Category header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl From<&CategoryInfo> for CategoryRef {
    fn from(info: &CategoryInfo) -> Self {
        CategoryRef {
            slug: info.slug.clone(),
            name: Some(info.name.clone()),
        }
    }
}

/// A category and the videos listed under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category: CategoryInfo,
    #[serde(default)]
    pub contents: Vec<Video>,
}

/// Catalog collaborator consumed by the controllers
pub trait VideoCatalog {
    /// Look up by slug
    fn video_by_id(&self, id: &str) -> Option<Video>;
    fn all_videos(&self) -> Vec<Video>;
    /// Videos from `category_slug` other than the current one
    fn related_videos(&self, current: &MediaId, category_slug: &str) -> Vec<Video>;
    fn categories(&self) -> Vec<Category>;

    /// Category that lists the video with `slug`
    fn category_of(&self, slug: &str) -> Option<CategoryRef> {
        self.categories()
            .iter()
            .find(|c| c.contents.iter().any(|v| v.slug == slug))
            .map(|c| CategoryRef::from(&c.category))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    categories: Vec<Category>,
}

/// Catalog loaded once from JSON
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    categories: Vec<Category>,
}

impl StaticCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Parse `{ "categories": [{ "category": {..}, "contents": [..] }] }`
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        debug!(categories = doc.categories.len(), "Catalog loaded");
        Ok(Self::new(doc.categories))
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.contents.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VideoCatalog for StaticCatalog {
    fn video_by_id(&self, id: &str) -> Option<Video> {
        self.categories
            .iter()
            .flat_map(|c| c.contents.iter())
            .find(|v| v.slug == id)
            .cloned()
    }

    fn all_videos(&self) -> Vec<Video> {
        let mut seen = std::collections::HashSet::new();
        self.categories
            .iter()
            .flat_map(|c| c.contents.iter())
            .filter(|v| seen.insert(v.slug.clone()))
            .cloned()
            .collect()
    }

    fn related_videos(&self, current: &MediaId, category_slug: &str) -> Vec<Video> {
        self.categories
            .iter()
            .filter(|c| c.category.slug == category_slug)
            .flat_map(|c| c.contents.iter())
            .filter(|v| v.slug != current.as_str() && v.media_id().as_ref() != Some(current))
            .cloned()
            .collect()
    }

    fn categories(&self) -> Vec<Category> {
        self.categories.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {
                "category": { "slug": "music", "name": "Music" },
                "contents": [
                    { "slug": "first", "title": "First", "mediaUrl": "https://youtu.be/abc123" },
                    { "slug": "second", "title": "Second", "mediaUrl": "https://www.youtube.com/watch?v=def456", "thumbnailUrl": "https://img/2.jpg" },
                    { "slug": "third", "title": "Third", "mediaUrl": "not a video link" }
                ]
            },
            {
                "category": { "slug": "talks", "name": "Talks", "iconUrl": "/talks.svg" },
                "contents": [
                    { "slug": "fourth", "title": "Fourth", "mediaUrl": "youtube.com/embed/ghi789" }
                ]
            }
        ]
    }"#;

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_lookup_by_slug() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.video_by_id("second").unwrap().title, "Second");
        assert!(catalog.video_by_id("missing").is_none());
    }

    #[test]
    fn test_related_excludes_current_by_media_id() {
        let current = MediaId::new("abc123").unwrap();
        let related = catalog().related_videos(&current, "music");
        let slugs: Vec<_> = related.iter().map(|v| v.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second", "third"]);
    }

    #[test]
    fn test_related_unknown_category_is_empty() {
        let current = MediaId::new("abc123").unwrap();
        assert!(catalog().related_videos(&current, "nope").is_empty());
    }

    #[test]
    fn test_category_of() {
        let category = catalog().category_of("fourth").unwrap();
        assert_eq!(category.slug, "talks");
        assert_eq!(category.name.as_deref(), Some("Talks"));
    }

    #[test]
    fn test_unresolvable_entry_has_no_media_id() {
        let catalog = catalog();
        assert!(catalog.video_by_id("third").unwrap().media_id().is_none());
        assert_eq!(catalog.video_by_id("fourth").unwrap().media_id().unwrap().as_str(), "ghi789");
    }
}
