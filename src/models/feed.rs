//! Records decoded from the upstream news feed.

use chrono::NaiveDateTime;

use super::NewArticle;

/// One entry of the list feed. Enough to detect new articles, not enough to store one.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedListItem {
    pub external_id: String,
    /// Club name from the feed envelope
    pub team_id: String,
    pub title: String,
    pub teaser: Option<String>,
    pub taxonomy: String,
    pub url: String,
    pub image_url: String,
    pub published: NaiveDateTime,
}

/// The full record of one article from the detail feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDetailItem {
    pub external_id: String,
    pub team_id: String,
    pub title: String,
    pub teaser: Option<String>,
    pub taxonomy: String,
    pub url: String,
    pub image_url: String,
    pub published: NaiveDateTime,
    pub body: String,
    pub gallery_urls: Vec<String>,
    pub video_url: Option<String>,
    pub opta_match_id: Option<String>,
}

impl From<FeedDetailItem> for NewArticle {
    fn from(item: FeedDetailItem) -> Self {
        NewArticle {
            external_id: item.external_id,
            team_id: item.team_id,
            opta_match_id: item.opta_match_id,
            title: item.title,
            kind: vec![item.taxonomy],
            teaser: item.teaser,
            content: item.body,
            url: item.url,
            image_url: item.image_url,
            gallery_urls: item.gallery_urls,
            video_url: item.video_url,
            published: item.published,
        }
    }
}
