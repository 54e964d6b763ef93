//! XML decoding for the list and detail documents.
//!
//! The root element name is not checked. Optional fields decode to `None` only
//! when the element is absent; a present but empty element gives `Some("")`.

use chrono::NaiveDateTime;
use roxmltree::{Document, Node};

use crate::errors::AppError;
use crate::models::{FeedDetailItem, FeedListItem};

/// Format of the `PublishDate` field. The feed sends no timezone.
pub const PUBLISH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decode the list document into list items.
pub fn parse_list(xml: &str) -> Result<Vec<FeedListItem>, AppError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let club_name = child_text(root, "ClubName").unwrap_or_default();

    let Some(items) = child(root, "NewsletterNewsItems") else {
        return Ok(Vec::new());
    };

    items
        .children()
        .filter(|node| node.has_tag_name("NewsletterNewsItem"))
        .map(|node| RawItem::read(node).into_list_item(&club_name))
        .collect()
}

/// Decode the detail document for a single article.
pub fn parse_detail(xml: &str) -> Result<FeedDetailItem, AppError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let club_name = child_text(root, "ClubName").unwrap_or_default();

    let raw = child(root, "NewsArticle")
        .map(RawItem::read)
        .filter(|raw| !raw.id.is_empty())
        .ok_or_else(|| AppError::NotFound("no article found in the feed response".to_string()))?;

    raw.into_detail_item(&club_name)
}

/// Item fields as they appear in the markup, before validation.
struct RawItem {
    id: String,
    publish_date: String,
    taxonomies: String,
    teaser: Option<String>,
    url: String,
    thumbnail: String,
    title: String,
    body: String,
    gallery: String,
    video_url: Option<String>,
    opta_match_id: Option<String>,
}

impl RawItem {
    fn read(node: Node<'_, '_>) -> Self {
        let text = |name: &str| child_text(node, name).unwrap_or_default();

        Self {
            id: text("NewsArticleID").trim().to_string(),
            publish_date: text("PublishDate").trim().to_string(),
            taxonomies: text("Taxonomies"),
            teaser: child_text(node, "TeaserText"),
            url: text("ArticleURL"),
            thumbnail: text("ThumbnailImageURL"),
            title: text("Title"),
            body: text("BodyText"),
            gallery: text("GalleryImageURLs"),
            video_url: child_text(node, "VideoURL"),
            opta_match_id: child_text(node, "OptaMatchId"),
        }
    }

    fn published(&self) -> Result<NaiveDateTime, AppError> {
        NaiveDateTime::parse_from_str(&self.publish_date, PUBLISH_DATE_FORMAT).map_err(|e| {
            AppError::Parse(format!(
                "article {} has invalid PublishDate '{}': {}",
                self.id, self.publish_date, e
            ))
        })
    }

    fn into_list_item(self, club_name: &str) -> Result<FeedListItem, AppError> {
        let published = self.published()?;
        Ok(FeedListItem {
            external_id: self.id,
            team_id: club_name.to_string(),
            title: self.title,
            teaser: self.teaser,
            taxonomy: self.taxonomies,
            url: self.url,
            image_url: self.thumbnail,
            published,
        })
    }

    fn into_detail_item(self, club_name: &str) -> Result<FeedDetailItem, AppError> {
        let published = self.published()?;
        Ok(FeedDetailItem {
            external_id: self.id,
            team_id: club_name.to_string(),
            title: self.title,
            teaser: self.teaser,
            taxonomy: self.taxonomies,
            url: self.url,
            image_url: self.thumbnail,
            published,
            body: self.body,
            gallery_urls: split_gallery(&self.gallery),
            video_url: self.video_url,
            opta_match_id: self.opta_match_id,
        })
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Text of a direct child element, `None` when the element is absent.
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).map(|element| {
        element
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    })
}

fn split_gallery(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
        .collect()
}
