//! Article API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::models::Article;
use crate::AppState;

/// GET /api/article/list - List all stored articles.
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Vec<Article>> {
    let articles = state.repo.list_articles().await?;
    success(articles)
}

/// GET /api/article/{id} - Get a single article by its internal id.
///
/// Ids that are not UUIDs are reported as not found.
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Article> {
    let article = state.repo.get_article(&id).await?;
    success(article)
}
