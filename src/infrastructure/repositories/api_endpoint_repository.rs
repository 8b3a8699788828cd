//! API Endpoint Repository Implementation
//!
//! PostgreSQL implementation of the ApiEndpointRepository trait. Writes
//! touch `api_endpoints` and `api_endpoint_api_tags` inside one transaction.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ensure_versioned_write, link_repository};
use crate::domain::{
    ApiEndpoint, ApiEndpointFilter, ApiEndpointRepository, ApiEndpointSortKey, Audit, Link,
    LinkDiff, LinkTable,
};
use crate::infrastructure::database::PgUnitOfWork;
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

const ENDPOINT_COLUMNS: &str = "id, name, route, http_method, description, environment_id, \
     attachment_id, version, created, changed, creator_id, changed_user";

#[derive(Debug, sqlx::FromRow)]
struct ApiEndpointRow {
    id: Uuid,
    name: String,
    route: String,
    http_method: String,
    description: Option<String>,
    environment_id: Uuid,
    attachment_id: Option<Uuid>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<ApiEndpointRow> for ApiEndpoint {
    fn from(row: ApiEndpointRow) -> Self {
        ApiEndpoint {
            id: row.id,
            name: row.name,
            route: row.route,
            http_method: row.http_method,
            description: row.description,
            environment_id: row.environment_id,
            attachment_id: row.attachment_id,
            audit: row.audit,
        }
    }
}

/// PostgreSQL API endpoint repository implementation.
#[derive(Clone)]
pub struct PgApiEndpointRepository {
    pool: PgPool,
    uow: PgUnitOfWork,
}

impl PgApiEndpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            uow: PgUnitOfWork::new(pool.clone()),
            pool,
        }
    }

    async fn insert_endpoint(
        conn: &mut PgConnection,
        endpoint: &ApiEndpoint,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO api_endpoints ({ENDPOINT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&query)
            .bind(endpoint.id)
            .bind(&endpoint.name)
            .bind(&endpoint.route)
            .bind(&endpoint.http_method)
            .bind(&endpoint.description)
            .bind(endpoint.environment_id)
            .bind(endpoint.attachment_id)
            .bind(endpoint.audit.version)
            .bind(endpoint.audit.created)
            .bind(endpoint.audit.changed)
            .bind(endpoint.audit.creator_id)
            .bind(endpoint.audit.changed_user)
            .execute(&mut *conn)
            .await?;

        link_repository::insert_links(conn, LinkTable::ApiEndpointApiTags, endpoint.id, tag_ids)
            .await
    }

    async fn update_endpoint(
        conn: &mut PgConnection,
        endpoint: &ApiEndpoint,
        expected_version: i32,
        tags: &LinkDiff,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE api_endpoints
            SET name = $2, route = $3, http_method = $4, description = $5, environment_id = $6,
                attachment_id = $7, version = $8, changed = $9, changed_user = $10
            WHERE id = $1 AND version = $11
            "#,
        )
        .bind(endpoint.id)
        .bind(&endpoint.name)
        .bind(&endpoint.route)
        .bind(&endpoint.http_method)
        .bind(&endpoint.description)
        .bind(endpoint.environment_id)
        .bind(endpoint.attachment_id)
        .bind(endpoint.audit.version)
        .bind(endpoint.audit.changed)
        .bind(endpoint.audit.changed_user)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;
        ensure_versioned_write(result.rows_affected(), "ApiEndpoint", endpoint.id)?;

        link_repository::apply_diff(conn, LinkTable::ApiEndpointApiTags, endpoint.id, tags).await
    }

    async fn delete_endpoint(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        link_repository::delete_all_links(conn, LinkTable::ApiEndpointApiTags, id).await?;

        let result = sqlx::query("DELETE FROM api_endpoints WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("ApiEndpoint", id));
        }

        Ok(())
    }
}

#[async_trait]
impl ApiEndpointRepository for PgApiEndpointRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiEndpoint>, AppError> {
        let query = format!("SELECT {ENDPOINT_COLUMNS} FROM api_endpoints WHERE id = $1");
        let row = sqlx::query_as::<_, ApiEndpointRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ApiEndpoint::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiEndpoint>, AppError> {
        let query = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM api_endpoints WHERE name = $1 ORDER BY created, id LIMIT 1"
        );
        let row = sqlx::query_as::<_, ApiEndpointRow>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ApiEndpoint::from))
    }

    async fn list(
        &self,
        query: &ListQuery<ApiEndpointSortKey>,
        filter: &ApiEndpointFilter,
    ) -> Result<Vec<ApiEndpoint>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ENDPOINT_COLUMNS} FROM api_endpoints"));

        if let Some(environment_id) = filter.environment_id {
            builder
                .push(" WHERE environment_id = ")
                .push_bind(environment_id);
        }

        builder
            .push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = builder
            .build_query_as::<ApiEndpointRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ApiEndpoint::from).collect())
    }

    async fn find_links(
        &self,
        table: LinkTable,
        endpoint_ids: &[Uuid],
    ) -> Result<Vec<Link>, AppError> {
        if table != LinkTable::ApiEndpointApiTags {
            return Err(AppError::Internal(format!(
                "{} is not an api endpoint join table",
                table.table()
            )));
        }
        link_repository::find_links(&self.pool, table, endpoint_ids).await
    }

    async fn create(&self, endpoint: &ApiEndpoint, tag_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::insert_endpoint(tx.conn(), endpoint, tag_ids).await;
        tx.finish(result).await
    }

    async fn update(
        &self,
        endpoint: &ApiEndpoint,
        expected_version: i32,
        tags: &LinkDiff,
    ) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::update_endpoint(tx.conn(), endpoint, expected_version, tags).await;
        tx.finish(result).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::delete_endpoint(tx.conn(), id).await;
        tx.finish(result).await
    }
}
