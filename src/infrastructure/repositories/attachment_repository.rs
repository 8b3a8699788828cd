//! Attachment Repository Implementation
//!
//! PostgreSQL implementation of file attachment operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_versioned_write;
use crate::domain::{Attachment, AttachmentRepository, AttachmentSortKey, Audit};
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

const ATTACHMENT_COLUMNS: &str = "id, file_name, url, content_type, size_bytes, \
     version, created, changed, creator_id, changed_user";

/// Database row for the `attachments` table.
#[derive(Debug, sqlx::FromRow)]
struct AttachmentRow {
    id: Uuid,
    file_name: String,
    url: String,
    content_type: Option<String>,
    size_bytes: Option<i64>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            id: row.id,
            file_name: row.file_name,
            url: row.url,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            audit: row.audit,
        }
    }
}

/// PostgreSQL implementation of the AttachmentRepository.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    /// Creates a new PgAttachmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    /// Find an attachment by its ID.
    ///
    /// Returns None if the attachment does not exist.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let query = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1");
        let row = sqlx::query_as::<_, AttachmentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Attachment::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, AttachmentRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    async fn list(
        &self,
        query: &ListQuery<AttachmentSortKey>,
    ) -> Result<Vec<Attachment>, AppError> {
        let sql = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments ORDER BY {} LIMIT $1 OFFSET $2",
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, AttachmentRow>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    /// Create a new attachment.
    async fn create(&self, attachment: &Attachment) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO attachments ({ATTACHMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&query)
            .bind(attachment.id)
            .bind(&attachment.file_name)
            .bind(&attachment.url)
            .bind(&attachment.content_type)
            .bind(attachment.size_bytes)
            .bind(attachment.audit.version)
            .bind(attachment.audit.created)
            .bind(attachment.audit.changed)
            .bind(attachment.audit.creator_id)
            .bind(attachment.audit.changed_user)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(&self, attachment: &Attachment, expected_version: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE attachments
            SET file_name = $2, url = $3, content_type = $4, size_bytes = $5,
                version = $6, changed = $7, changed_user = $8
            WHERE id = $1 AND version = $9
            "#,
        )
        .bind(attachment.id)
        .bind(&attachment.file_name)
        .bind(&attachment.url)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(attachment.audit.version)
        .bind(attachment.audit.changed)
        .bind(attachment.audit.changed_user)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        ensure_versioned_write(result.rows_affected(), "Attachment", attachment.id)
    }

    /// Delete an attachment by ID.
    ///
    /// Returns an error if the attachment does not exist.
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Attachment", id));
        }

        Ok(())
    }
}
