//! Upstream news feed access.
//!
//! The feed publishes a list document with minimal metadata per article and a
//! detail document per article id. Both are XML.

mod client;
mod parser;

pub use client::HttpFeedClient;
pub use parser::{parse_detail, parse_list, PUBLISH_DATE_FORMAT};

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{FeedDetailItem, FeedListItem};

/// Source of articles for the reconciler.
#[async_trait]
pub trait ArticleFeed: Send + Sync {
    /// Fetch the current article list. One malformed item fails the whole list.
    async fn fetch_list(&self) -> Result<Vec<FeedListItem>, AppError>;

    /// Fetch the full record for one external id.
    async fn fetch_detail(&self, external_id: &str) -> Result<FeedDetailItem, AppError>;
}
