use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display label for assets whose category is empty or whitespace. The
/// stored value is left untouched; this bucket only exists for grouping,
/// counting, and matching.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    /// Free-text label, stored exactly as provided. Matching is always on
    /// the normalized form.
    #[serde(default)]
    pub category: String,
    pub title: Option<String>,
    pub media_url: String,
    /// Present only for assets uploaded through this system. Externally
    /// linked assets have no backing object and must never reach the
    /// storage delete path.
    pub storage_path: Option<String>,
    /// Meaningful only within a category. Ties break by descending id.
    pub sort_order: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Category label with the Uncategorized fallback applied.
    pub fn display_category(&self) -> &str {
        let trimmed = self.category.trim();
        if trimmed.is_empty() { UNCATEGORIZED } else { trimmed }
    }

    pub fn normalized_category(&self) -> String {
        normalize_category(&self.category)
    }

    /// Normalized equality against another label.
    pub fn in_category(&self, label: &str) -> bool {
        self.normalized_category() == normalize_category(label)
    }
}

/// Trimmed, lowercased form used for all category comparisons. Empty input
/// normalizes to the Uncategorized bucket.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNCATEGORIZED.to_lowercase()
    } else {
        trimmed.to_lowercase()
    }
}

/// Insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub category: String,
    pub title: Option<String>,
    pub media_url: String,
    pub storage_path: Option<String>,
    pub sort_order: Option<i64>,
}

/// A category is either a member of the studio's fixed vocabulary or a
/// freeform label observed in the catalog. Both normalize the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Known(KnownCategory),
    Freeform(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownCategory {
    Weddings,
    Couples,
    Baby,
    Family,
    Portraits,
    Events,
}

impl KnownCategory {
    pub const ALL: [KnownCategory; 6] = [
        KnownCategory::Weddings,
        KnownCategory::Couples,
        KnownCategory::Baby,
        KnownCategory::Family,
        KnownCategory::Portraits,
        KnownCategory::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnownCategory::Weddings => "Weddings",
            KnownCategory::Couples => "Couples",
            KnownCategory::Baby => "Baby",
            KnownCategory::Family => "Family",
            KnownCategory::Portraits => "Portraits",
            KnownCategory::Events => "Events",
        }
    }
}

impl Category {
    pub fn parse(raw: &str) -> Category {
        let normalized = normalize_category(raw);
        for known in KnownCategory::ALL {
            if known.as_str().to_lowercase() == normalized {
                return Category::Known(known);
            }
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Category::Freeform(UNCATEGORIZED.to_string())
        } else {
            Category::Freeform(trimmed.to_string())
        }
    }

    pub fn display(&self) -> &str {
        match self {
            Category::Known(known) => known.as_str(),
            Category::Freeform(label) => label,
        }
    }

    pub fn normalized(&self) -> String {
        normalize_category(self.display())
    }
}

/// The catalog's primary ordering: `sort_order` ascending with unordered
/// rows last (newest first among themselves), ties broken by descending id.
pub fn compare_catalog_order(a: &Asset, b: &Asset) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.sort_order, b.sort_order) {
        (Some(x), Some(y)) => x
            .cmp(&y)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)),
    }
}

/// Ordering requested from the catalog. The primary ordering needs the
/// `sort_order` column; stores without it raise the typed degraded-schema
/// error instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// `sort_order` ascending, then `created_at` descending.
    SortOrderThenCreated,
    /// `created_at` descending only. The degraded fallback.
    CreatedDesc,
}

#[derive(Debug, Clone)]
pub struct AssetQuery {
    pub order_by: OrderBy,
    /// Substring match against the normalized category, not exact equality.
    pub category_contains: Option<String>,
    pub offset: usize,
    pub limit: usize,
}
