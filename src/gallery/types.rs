use crate::catalog::Asset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The public gallery's fixed filter vocabulary. Each filter is a
/// substring match against normalized category text, so several stored
/// labels ("Weddings", "destination wedding") can satisfy one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryFilter {
    All,
    Weddings,
    Couples,
    Baby,
    Family,
    Portraits,
    Events,
}

impl GalleryFilter {
    pub fn parse(raw: &str) -> GalleryFilter {
        match raw.trim().to_lowercase().as_str() {
            "weddings" | "wedding" => GalleryFilter::Weddings,
            "couples" | "couple" => GalleryFilter::Couples,
            "baby" => GalleryFilter::Baby,
            "family" => GalleryFilter::Family,
            "portraits" | "portrait" => GalleryFilter::Portraits,
            "events" | "event" => GalleryFilter::Events,
            _ => GalleryFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryFilter::All => "all",
            GalleryFilter::Weddings => "weddings",
            GalleryFilter::Couples => "couples",
            GalleryFilter::Baby => "baby",
            GalleryFilter::Family => "family",
            GalleryFilter::Portraits => "portraits",
            GalleryFilter::Events => "events",
        }
    }

    /// Substring matched against the normalized category, `None` for the
    /// unfiltered view.
    pub fn needle(&self) -> Option<&'static str> {
        match self {
            GalleryFilter::All => None,
            GalleryFilter::Weddings => Some("wedding"),
            GalleryFilter::Couples => Some("couple"),
            GalleryFilter::Baby => Some("baby"),
            GalleryFilter::Family => Some("family"),
            GalleryFilter::Portraits => Some("portrait"),
            GalleryFilter::Events => Some("event"),
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        match self.needle() {
            None => true,
            Some(needle) => asset.normalized_category().contains(needle),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryItem {
    pub id: u64,
    pub title: Option<String>,
    pub category: String,
    pub media_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Asset> for GalleryItem {
    fn from(asset: Asset) -> Self {
        let category = asset.display_category().to_string();
        Self {
            id: asset.id,
            title: asset.title,
            category,
            media_url: asset.media_url,
            created_at: asset.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryPage {
    pub items: Vec<GalleryItem>,
    pub page: usize,
    pub page_size: usize,
    /// False when the fetched window was shorter than the page size; the
    /// infinite scroll stops asking.
    pub has_more: bool,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GalleryQuery {
    pub filter: Option<String>,
    pub page: Option<usize>,
}
