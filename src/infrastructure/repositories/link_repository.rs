//! Join Row Persistence
//!
//! Statements shared by the aggregate repositories for their
//! `{aggregate}_{related}s` join tables. Writes take a connection so they
//! run inside the caller's transaction.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Link, LinkDiff, LinkTable};
use crate::shared::error::AppError;

/// Load the join rows of every owner in `owner_ids` with one query.
pub async fn find_links(
    pool: &PgPool,
    table: LinkTable,
    owner_ids: &[Uuid],
) -> Result<Vec<Link>, AppError> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "SELECT id, {owner} AS owner_id, {related} AS related_id \
         FROM {table} \
         WHERE {owner} = ANY($1) \
         ORDER BY id",
        owner = table.owner_column(),
        related = table.related_column(),
        table = table.table(),
    );

    let links = sqlx::query_as::<_, Link>(&query)
        .bind(owner_ids)
        .fetch_all(pool)
        .await?;

    Ok(links)
}

/// Insert one join row per related id.
pub async fn insert_links(
    conn: &mut PgConnection,
    table: LinkTable,
    owner_id: Uuid,
    related_ids: &[Uuid],
) -> Result<(), AppError> {
    if related_ids.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {} (id, {}, {}) ",
        table.table(),
        table.owner_column(),
        table.related_column(),
    ));
    builder.push_values(related_ids, |mut row, related_id| {
        let link = Link::new(owner_id, *related_id);
        row.push_bind(link.id)
            .push_bind(link.owner_id)
            .push_bind(link.related_id);
    });
    builder.build().execute(&mut *conn).await?;

    Ok(())
}

/// Remove the join rows pointing at any of `related_ids`.
pub async fn delete_links(
    conn: &mut PgConnection,
    table: LinkTable,
    owner_id: Uuid,
    related_ids: &[Uuid],
) -> Result<(), AppError> {
    if related_ids.is_empty() {
        return Ok(());
    }

    let query = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = ANY($2)",
        table.table(),
        table.owner_column(),
        table.related_column(),
    );
    sqlx::query(&query)
        .bind(owner_id)
        .bind(related_ids)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Remove every join row of one owner.
pub async fn delete_all_links(
    conn: &mut PgConnection,
    table: LinkTable,
    owner_id: Uuid,
) -> Result<u64, AppError> {
    let query = format!(
        "DELETE FROM {} WHERE {} = $1",
        table.table(),
        table.owner_column(),
    );
    let result = sqlx::query(&query)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Apply removals before additions so a re-added id never collides.
pub async fn apply_diff(
    conn: &mut PgConnection,
    table: LinkTable,
    owner_id: Uuid,
    diff: &LinkDiff,
) -> Result<(), AppError> {
    delete_links(conn, table, owner_id, &diff.removed).await?;
    insert_links(conn, table, owner_id, &diff.added).await
}
