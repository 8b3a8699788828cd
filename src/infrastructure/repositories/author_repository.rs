//! Author Repository Implementation
//!
//! PostgreSQL implementation of the AuthorRepository trait.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_versioned_write;
use crate::domain::{Audit, Author, AuthorRepository, AuthorSortKey};
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

const AUTHOR_COLUMNS: &str =
    "id, name, email, bio, version, created, changed, creator_id, changed_user";

#[derive(Debug, sqlx::FromRow)]
struct AuthorRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    bio: Option<String>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: row.id,
            name: row.name,
            email: row.email,
            bio: row.bio,
            audit: row.audit,
        }
    }
}

/// PostgreSQL author repository implementation.
#[derive(Clone)]
pub struct PgAuthorRepository {
    pool: PgPool,
}

impl PgAuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PgAuthorRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>, AppError> {
        let query = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1");
        let row = sqlx::query_as::<_, AuthorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Author::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Author>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, AuthorRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Author>, AppError> {
        let query = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE name = $1 ORDER BY created, id LIMIT 1"
        );
        let row = sqlx::query_as::<_, AuthorRow>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Author::from))
    }

    async fn list(&self, query: &ListQuery<AuthorSortKey>) -> Result<Vec<Author>, AppError> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY {} LIMIT $1 OFFSET $2",
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn create(&self, author: &Author) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO authors ({AUTHOR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&query)
            .bind(author.id)
            .bind(&author.name)
            .bind(&author.email)
            .bind(&author.bio)
            .bind(author.audit.version)
            .bind(author.audit.created)
            .bind(author.audit.changed)
            .bind(author.audit.creator_id)
            .bind(author.audit.changed_user)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(&self, author: &Author, expected_version: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE authors
            SET name = $2, email = $3, bio = $4, version = $5, changed = $6, changed_user = $7
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(author.id)
        .bind(&author.name)
        .bind(&author.email)
        .bind(&author.bio)
        .bind(author.audit.version)
        .bind(author.audit.changed)
        .bind(author.audit.changed_user)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        ensure_versioned_write(result.rows_affected(), "Author", author.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Author", id));
        }

        Ok(())
    }
}
