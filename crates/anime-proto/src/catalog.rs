//! Catalog records as returned by the Jikan v4 API.
//!
//! Only the fields the client reads are modelled; everything else in the
//! payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Literal shown when a record carries no broadcast time.
pub const NOT_ANNOUNCED: &str = "Not Announced";

/// Envelope shared by every list endpoint: `{ "data": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub data: Option<Vec<AnimeRecord>>,
}

impl CatalogPage {
    /// Records in response order. A missing or `null` `data` is an empty result.
    pub fn into_records(self) -> Vec<AnimeRecord> {
        self.data.unwrap_or_default()
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    pub mal_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: ImageSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
}

impl AnimeRecord {
    /// Broadcast day, if the record has a non-empty one.
    pub fn broadcast_day(&self) -> Option<&str> {
        self.broadcast
            .as_ref()
            .and_then(|b| b.day.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Broadcast time, or [`NOT_ANNOUNCED`].
    pub fn broadcast_time_label(&self) -> &str {
        self.broadcast
            .as_ref()
            .and_then(|b| b.time.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(NOT_ANNOUNCED)
    }

    /// Regular-size cover (used in the schedule and the popular grid).
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .jpg
            .image_url
            .as_deref()
            .or(self.images.webp.image_url.as_deref())
    }

    /// Large cover (used by the carousel), falling back to the regular one.
    pub fn large_image_url(&self) -> Option<&str> {
        self.images
            .jpg
            .large_image_url
            .as_deref()
            .or(self.images.webp.large_image_url.as_deref())
            .or_else(|| self.image_url())
    }
}
