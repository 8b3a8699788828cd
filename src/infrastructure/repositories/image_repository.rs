//! Image Repository Implementation
//!
//! PostgreSQL implementation of the ImageRepository trait.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_versioned_write;
use crate::domain::{Audit, Image, ImageRepository, ImageSortKey};
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

const IMAGE_COLUMNS: &str =
    "id, url, alt_text, title, version, created, changed, creator_id, changed_user";

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    url: String,
    alt_text: Option<String>,
    title: Option<String>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            url: row.url,
            alt_text: row.alt_text,
            title: row.title,
            audit: row.audit,
        }
    }
}

/// PostgreSQL image repository implementation.
#[derive(Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1");
        let row = sqlx::query_as::<_, ImageRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Image::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Image>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, ImageRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Image::from).collect())
    }

    async fn list(&self, query: &ListQuery<ImageSortKey>) -> Result<Vec<Image>, AppError> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM images ORDER BY {} LIMIT $1 OFFSET $2",
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Image::from).collect())
    }

    async fn create(&self, image: &Image) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO images ({IMAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&query)
            .bind(image.id)
            .bind(&image.url)
            .bind(&image.alt_text)
            .bind(&image.title)
            .bind(image.audit.version)
            .bind(image.audit.created)
            .bind(image.audit.changed)
            .bind(image.audit.creator_id)
            .bind(image.audit.changed_user)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(&self, image: &Image, expected_version: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET url = $2, alt_text = $3, title = $4, version = $5, changed = $6, changed_user = $7
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(image.id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(&image.title)
        .bind(image.audit.version)
        .bind(image.audit.changed)
        .bind(image.audit.changed_user)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        ensure_versioned_write(result.rows_affected(), "Image", image.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Image", id));
        }

        Ok(())
    }
}
