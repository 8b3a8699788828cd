//! Reference Repository Implementation
//!
//! PostgreSQL implementation of the ReferenceRepository trait. One
//! implementation serves every reference table; the table name comes from
//! `ReferenceKind`, never from caller input.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_versioned_write;
use crate::domain::{
    Audit, ReferenceEntity, ReferenceKind, ReferenceRepository, ReferenceSortKey,
};
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

/// Column list for reference queries.
const REFERENCE_COLUMNS: &str =
    "id, name, description, version, created, changed, creator_id, changed_user";

/// Database row shared by all reference tables.
#[derive(Debug, sqlx::FromRow)]
struct ReferenceRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl ReferenceRow {
    fn into_entity(self, kind: ReferenceKind) -> ReferenceEntity {
        ReferenceEntity {
            id: self.id,
            kind,
            name: self.name,
            description: self.description,
            audit: self.audit,
        }
    }
}

/// PostgreSQL reference repository implementation.
#[derive(Clone)]
pub struct PgReferenceRepository {
    pool: PgPool,
}

impl PgReferenceRepository {
    /// Create a new PgReferenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn into_entities(rows: Vec<ReferenceRow>, kind: ReferenceKind) -> Vec<ReferenceEntity> {
        rows.into_iter().map(|row| row.into_entity(kind)).collect()
    }
}

#[async_trait]
impl ReferenceRepository for PgReferenceRepository {
    async fn find_by_id(
        &self,
        kind: ReferenceKind,
        id: Uuid,
    ) -> Result<Option<ReferenceEntity>, AppError> {
        let query = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {} WHERE id = $1",
            kind.table()
        );
        let row = sqlx::query_as::<_, ReferenceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_entity(kind)))
    }

    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {} WHERE id = ANY($1)",
            kind.table()
        );
        let rows = sqlx::query_as::<_, ReferenceRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(Self::into_entities(rows, kind))
    }

    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceEntity>, AppError> {
        let query = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {} WHERE name = $1 ORDER BY created, id LIMIT 1",
            kind.table()
        );
        let row = sqlx::query_as::<_, ReferenceRow>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_entity(kind)))
    }

    async fn find_by_names(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {} WHERE name = ANY($1) ORDER BY created, id",
            kind.table()
        );
        let rows = sqlx::query_as::<_, ReferenceRow>(&query)
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        Ok(Self::into_entities(rows, kind))
    }

    async fn list(
        &self,
        kind: ReferenceKind,
        query: &ListQuery<ReferenceSortKey>,
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        let sql = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
            kind.table(),
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, ReferenceRow>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Self::into_entities(rows, kind))
    }

    async fn create(&self, entity: &ReferenceEntity) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO {} ({REFERENCE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            entity.kind.table()
        );
        sqlx::query(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.description)
            .bind(entity.audit.version)
            .bind(entity.audit.created)
            .bind(entity.audit.changed)
            .bind(entity.audit.creator_id)
            .bind(entity.audit.changed_user)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(
        &self,
        entity: &ReferenceEntity,
        expected_version: i32,
    ) -> Result<(), AppError> {
        let query = format!(
            r#"
            UPDATE {}
            SET name = $2, description = $3, version = $4, changed = $5, changed_user = $6
            WHERE id = $1 AND version = $7
            "#,
            entity.kind.table()
        );
        let result = sqlx::query(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.description)
            .bind(entity.audit.version)
            .bind(entity.audit.changed)
            .bind(entity.audit.changed_user)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        ensure_versioned_write(result.rows_affected(), entity.kind.label(), entity.id)
    }

    async fn delete(&self, kind: ReferenceKind, id: Uuid) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(kind.label(), id));
        }

        Ok(())
    }
}
