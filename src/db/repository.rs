//! Article repository.
//!
//! Articles are keyed physically by a store-assigned UUID and logically by the
//! feed's external id, which has a UNIQUE index. Writes go through upsert only.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::with_timeout;
use crate::errors::AppError;
use crate::models::{Article, NewArticle, UpsertSummary};

const ARTICLE_COLUMNS: &str = "id, external_id, team_id, opta_match_id, title, kind, teaser, \
     content, url, image_url, gallery_urls, video_url, published";

/// Ids bound per `IN (...)` query, well under SQLite's bound-variable limit.
pub(crate) const FIND_EXISTING_CHUNK: usize = 500;

/// Database repository for article operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the subset of `external_ids` that is already stored.
    pub async fn find_existing(
        &self,
        external_ids: &HashSet<String>,
    ) -> Result<HashSet<String>, AppError> {
        // An empty IN list would need a special case in SQL; skip the query instead.
        if external_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<&str> = external_ids.iter().map(String::as_str).collect();

        with_timeout("find existing articles", async {
            let mut existing = HashSet::new();
            for chunk in ids.chunks(FIND_EXISTING_CHUNK) {
                let mut builder: QueryBuilder<Sqlite> =
                    QueryBuilder::new("SELECT external_id FROM articles WHERE external_id IN (");
                let mut separated = builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(")");

                let rows = builder.build().fetch_all(&self.pool).await?;
                existing.extend(rows.iter().map(|row| row.get::<String, _>("external_id")));
            }
            Ok::<HashSet<String>, AppError>(existing)
        })
        .await
    }

    /// Insert or update every article, matched by external id.
    ///
    /// Existing rows keep their id and get all other fields overwritten. The
    /// batch runs in one transaction, so a failure leaves the store untouched.
    pub async fn upsert_batch(&self, articles: &[NewArticle]) -> Result<UpsertSummary, AppError> {
        if articles.is_empty() {
            return Ok(UpsertSummary::default());
        }

        with_timeout("upsert articles", async {
            let mut summary = UpsertSummary::default();
            let mut tx = self.pool.begin().await?;

            for article in articles {
                let existing = sqlx::query("SELECT id FROM articles WHERE external_id = ?")
                    .bind(&article.external_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| batch_error(&article.external_id, e))?;

                let kind_json = serde_json::to_string(&article.kind)?;
                let gallery_json = serde_json::to_string(&article.gallery_urls)?;

                sqlx::query(
                    r#"INSERT INTO articles (
                        id, external_id, team_id, opta_match_id, title, kind, teaser,
                        content, url, image_url, gallery_urls, video_url, published
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(external_id) DO UPDATE SET
                        team_id = excluded.team_id,
                        opta_match_id = excluded.opta_match_id,
                        title = excluded.title,
                        kind = excluded.kind,
                        teaser = excluded.teaser,
                        content = excluded.content,
                        url = excluded.url,
                        image_url = excluded.image_url,
                        gallery_urls = excluded.gallery_urls,
                        video_url = excluded.video_url,
                        published = excluded.published"#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&article.external_id)
                .bind(&article.team_id)
                .bind(&article.opta_match_id)
                .bind(&article.title)
                .bind(&kind_json)
                .bind(&article.teaser)
                .bind(&article.content)
                .bind(&article.url)
                .bind(&article.image_url)
                .bind(&gallery_json)
                .bind(&article.video_url)
                .bind(article.published)
                .execute(&mut *tx)
                .await
                .map_err(|e| batch_error(&article.external_id, e))?;

                if existing.is_some() {
                    summary.updated += 1;
                } else {
                    summary.inserted += 1;
                }
            }

            tx.commit().await?;
            Ok::<_, AppError>(summary)
        })
        .await
    }

    /// Get an article by its store id.
    pub async fn get_article(&self, id: &str) -> Result<Article, AppError> {
        if Uuid::parse_str(id).is_err() {
            return Err(AppError::NotFound(format!("Invalid article id '{}'", id)));
        }

        let row = with_timeout("get article", async {
            let query = format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS);
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok::<_, AppError>(row)
        })
        .await?;

        row.as_ref()
            .map(article_from_row)
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))
    }

    /// List all articles in insertion order.
    pub async fn list_articles(&self) -> Result<Vec<Article>, AppError> {
        with_timeout("list articles", async {
            let query = format!("SELECT {} FROM articles ORDER BY seq", ARTICLE_COLUMNS);
            let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
            Ok::<Vec<Article>, AppError>(rows.iter().map(article_from_row).collect())
        })
        .await
    }
}

fn batch_error(external_id: &str, err: sqlx::Error) -> AppError {
    tracing::error!("Upsert failed for article {}: {:?}", external_id, err);
    AppError::Store(format!(
        "Batch upsert aborted at article {}: {}",
        external_id, err
    ))
}

// Helper functions for row conversion

fn article_from_row(row: &sqlx::sqlite::SqliteRow) -> Article {
    let kind_str: String = row.get("kind");
    let gallery_str: String = row.get("gallery_urls");
    let published: NaiveDateTime = row.get("published");

    let stored = NewArticle {
        external_id: row.get("external_id"),
        team_id: row.get("team_id"),
        opta_match_id: row.get("opta_match_id"),
        title: row.get("title"),
        kind: parse_json_array(&kind_str),
        teaser: row.get("teaser"),
        content: row.get("content"),
        url: row.get("url"),
        image_url: row.get("image_url"),
        gallery_urls: parse_json_array(&gallery_str),
        video_url: row.get("video_url"),
        published,
    };
    Article::from_new(row.get("id"), stored)
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn test_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn new_article(external_id: &str, title: &str) -> NewArticle {
        NewArticle {
            external_id: external_id.to_string(),
            team_id: "Brentford".to_string(),
            opta_match_id: None,
            title: title.to_string(),
            kind: vec!["News".to_string()],
            teaser: Some(format!("Teaser for {}", title)),
            content: format!("<p>{}</p>", title),
            url: format!("https://club.example.com/news/{}", external_id),
            image_url: format!("https://club.example.com/img/{}.jpg", external_id),
            gallery_urls: Vec::new(),
            video_url: None,
            published: NaiveDateTime::parse_from_str("2023-06-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_find_existing_spans_several_chunks() {
        let (repo, _dir) = test_repo().await;
        let count = FIND_EXISTING_CHUNK * 2 + 7;
        let last = (count - 1).to_string();
        repo.upsert_batch(&[new_article("0", "First"), new_article(&last, "Last")])
        .await
        .unwrap();

        let listed: HashSet<String> = (0..count).map(|i| i.to_string()).collect();
        let existing = repo.find_existing(&listed).await.unwrap();
        assert_eq!(existing, ids(&["0", last.as_str()]));
    }

    #[tokio::test]
    async fn test_upsert_batch_failure_commits_nothing() {
        let (repo, _dir) = test_repo().await;
        repo.upsert_batch(&[new_article("123", "Original")])
            .await
            .unwrap();

        // Reject one row in the middle of the batch
        sqlx::query(
            "CREATE TRIGGER reject_456 BEFORE INSERT ON articles \
             WHEN NEW.external_id = '456' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo
            .upsert_batch(&[
                new_article("123", "Changed"),
                new_article("456", "Test Article 2"),
                new_article("789", "Test Article 3"),
            ])
            .await
            .unwrap_err();

        match err {
            AppError::Store(msg) => assert!(msg.contains("456"), "got {}", msg),
            other => panic!("expected store error, got {:?}", other),
        }

        let articles = repo.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].external_id, "123");
        assert_eq!(articles[0].title, "Original");
    }

    #[tokio::test]
    async fn test_find_existing_empty_input() {
        let (repo, _dir) = test_repo().await;
        repo.upsert_batch(&[new_article("123", "Test Article 1")])
            .await
            .unwrap();

        let existing = repo.find_existing(&HashSet::new()).await.unwrap();
        assert!(existing.is_empty());
    }

    #[tokio::test]
    async fn test_find_existing_returns_subset() {
        let (repo, _dir) = test_repo().await;
        repo.upsert_batch(&[
            new_article("123", "Test Article 1"),
            new_article("456", "Test Article 2"),
        ])
        .await
        .unwrap();

        let existing = repo.find_existing(&ids(&["123", "789"])).await.unwrap();
        assert_eq!(existing, ids(&["123"]));
    }

    #[tokio::test]
    async fn test_upsert_then_get_round_trip() {
        let (repo, _dir) = test_repo().await;
        let mut article = new_article("123", "Test Article 1");
        article.opta_match_id = Some("g2301".to_string());
        article.gallery_urls = vec![
            "https://club.example.com/g/1.jpg".to_string(),
            "https://club.example.com/g/2.jpg".to_string(),
        ];
        article.video_url = Some("https://video.example.com/123".to_string());

        let summary = repo.upsert_batch(&[article.clone()]).await.unwrap();
        assert_eq!(summary, UpsertSummary { inserted: 1, updated: 0 });

        let listed = repo.list_articles().await.unwrap();
        assert_eq!(listed.len(), 1);
        let stored = &listed[0];
        assert!(!stored.id.is_empty());
        assert!(Uuid::parse_str(&stored.id).is_ok());

        let fetched = repo.get_article(&stored.id).await.unwrap();
        assert_eq!(fetched, Article::from_new(stored.id.clone(), article));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (repo, _dir) = test_repo().await;
        let batch = vec![
            new_article("123", "Test Article 1"),
            new_article("456", "Test Article 2"),
        ];

        let first = repo.upsert_batch(&batch).await.unwrap();
        let after_first = repo.list_articles().await.unwrap();
        let second = repo.upsert_batch(&batch).await.unwrap();
        let after_second = repo.list_articles().await.unwrap();

        assert_eq!(first, UpsertSummary { inserted: 2, updated: 0 });
        assert_eq!(second, UpsertSummary { inserted: 0, updated: 2 });
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_fields_and_keeps_id() {
        let (repo, _dir) = test_repo().await;
        repo.upsert_batch(&[new_article("123", "Old title")])
            .await
            .unwrap();
        let original_id = repo.list_articles().await.unwrap()[0].id.clone();

        let mut changed = new_article("123", "New title");
        changed.teaser = None;
        repo.upsert_batch(&[changed]).await.unwrap();

        let articles = repo.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, original_id);
        assert_eq!(articles[0].title, "New title");
        assert_eq!(articles[0].teaser, None);
    }

    #[tokio::test]
    async fn test_duplicate_ids_within_batch_collapse() {
        let (repo, _dir) = test_repo().await;
        let summary = repo
            .upsert_batch(&[
                new_article("123", "First"),
                new_article("123", "Second"),
            ])
            .await
            .unwrap();

        assert_eq!(summary, UpsertSummary { inserted: 1, updated: 1 });
        let articles = repo.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Second");
    }

    #[tokio::test]
    async fn test_upsert_empty_batch_is_noop() {
        let (repo, _dir) = test_repo().await;
        let summary = repo.upsert_batch(&[]).await.unwrap();
        assert_eq!(summary.total(), 0);
        assert!(repo.list_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_article_not_found() {
        let (repo, _dir) = test_repo().await;

        let missing = repo.get_article(&Uuid::new_v4().to_string()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let malformed = repo.get_article("123").await;
        assert!(matches!(malformed, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let (repo, _dir) = test_repo().await;
        repo.upsert_batch(&[
            new_article("789", "Test Article 3"),
            new_article("123", "Test Article 1"),
        ])
        .await
        .unwrap();
        repo.upsert_batch(&[new_article("456", "Test Article 2")])
            .await
            .unwrap();

        let titles: Vec<String> = repo
            .list_articles()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Test Article 3", "Test Article 1", "Test Article 2"]
        );
    }
}
