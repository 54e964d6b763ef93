//! Article model served by the query API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Store-assigned identifier
    pub id: String,
    /// Identifier assigned by the upstream feed, unique in the store
    #[serde(rename = "articleID")]
    pub external_id: String,
    #[serde(rename = "teamId")]
    pub team_id: String,
    #[serde(rename = "optaMatchId")]
    pub opta_match_id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub teaser: Option<String>,
    pub content: String,
    pub url: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "galleryUrls", default, skip_serializing_if = "Vec::is_empty")]
    pub gallery_urls: Vec<String>,
    #[serde(rename = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub published: NaiveDateTime,
}

/// An article that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub external_id: String,
    pub team_id: String,
    pub opta_match_id: Option<String>,
    pub title: String,
    pub kind: Vec<String>,
    pub teaser: Option<String>,
    pub content: String,
    pub url: String,
    pub image_url: String,
    pub gallery_urls: Vec<String>,
    pub video_url: Option<String>,
    pub published: NaiveDateTime,
}

impl Article {
    /// Attach a store identifier to an unsaved article.
    pub fn from_new(id: String, new: NewArticle) -> Self {
        Self {
            id,
            external_id: new.external_id,
            team_id: new.team_id,
            opta_match_id: new.opta_match_id,
            title: new.title,
            kind: new.kind,
            teaser: new.teaser,
            content: new.content,
            url: new.url,
            image_url: new.image_url,
            gallery_urls: new.gallery_urls,
            video_url: new.video_url,
            published: new.published,
        }
    }
}

/// Counts reported by a bulk upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}
