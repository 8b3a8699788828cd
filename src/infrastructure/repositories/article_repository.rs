//! Article Repository Implementation
//!
//! PostgreSQL implementation of the ArticleRepository trait. Writes touch
//! `articles`, `article_blog_categories` and `article_blog_tags` inside one
//! transaction.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ensure_versioned_write, link_repository};
use crate::domain::{
    Article, ArticleFilter, ArticleLinkChanges, ArticleLinks, ArticleRepository, ArticleSortKey,
    Audit, Link, LinkTable,
};
use crate::infrastructure::database::PgUnitOfWork;
use crate::shared::error::AppError;
use crate::shared::pagination::ListQuery;

const ARTICLE_COLUMNS: &str = "id, title, summary, content, author_id, image_id, attachment_id, \
     version, created, changed, creator_id, changed_user";

/// Join tables owned by articles.
const ARTICLE_LINK_TABLES: [LinkTable; 2] =
    [LinkTable::ArticleBlogCategories, LinkTable::ArticleBlogTags];

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: Uuid,
    title: String,
    summary: Option<String>,
    content: Option<String>,
    author_id: Uuid,
    image_id: Option<Uuid>,
    attachment_id: Option<Uuid>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            summary: row.summary,
            content: row.content,
            author_id: row.author_id,
            image_id: row.image_id,
            attachment_id: row.attachment_id,
            audit: row.audit,
        }
    }
}

/// PostgreSQL article repository implementation.
#[derive(Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
    uow: PgUnitOfWork,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            uow: PgUnitOfWork::new(pool.clone()),
            pool,
        }
    }

    async fn insert_article(
        conn: &mut PgConnection,
        article: &Article,
        links: &ArticleLinks,
    ) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO articles ({ARTICLE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&query)
            .bind(article.id)
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.content)
            .bind(article.author_id)
            .bind(article.image_id)
            .bind(article.attachment_id)
            .bind(article.audit.version)
            .bind(article.audit.created)
            .bind(article.audit.changed)
            .bind(article.audit.creator_id)
            .bind(article.audit.changed_user)
            .execute(&mut *conn)
            .await?;

        link_repository::insert_links(
            conn,
            LinkTable::ArticleBlogCategories,
            article.id,
            &links.categories,
        )
        .await?;
        link_repository::insert_links(conn, LinkTable::ArticleBlogTags, article.id, &links.tags)
            .await
    }

    async fn update_article(
        conn: &mut PgConnection,
        article: &Article,
        expected_version: i32,
        changes: &ArticleLinkChanges,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = $2, summary = $3, content = $4, author_id = $5, image_id = $6,
                attachment_id = $7, version = $8, changed = $9, changed_user = $10
            WHERE id = $1 AND version = $11
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(article.author_id)
        .bind(article.image_id)
        .bind(article.attachment_id)
        .bind(article.audit.version)
        .bind(article.audit.changed)
        .bind(article.audit.changed_user)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;
        ensure_versioned_write(result.rows_affected(), "Article", article.id)?;

        link_repository::apply_diff(
            conn,
            LinkTable::ArticleBlogCategories,
            article.id,
            &changes.categories,
        )
        .await?;
        link_repository::apply_diff(conn, LinkTable::ArticleBlogTags, article.id, &changes.tags)
            .await
    }

    async fn delete_article(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        for table in ARTICLE_LINK_TABLES {
            link_repository::delete_all_links(conn, table, id).await?;
        }

        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Article", id));
        }

        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, AppError> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Article::from))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Article>, AppError> {
        let query = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE title = $1 ORDER BY created, id LIMIT 1"
        );
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Article::from))
    }

    async fn list(
        &self,
        query: &ListQuery<ArticleSortKey>,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));

        if let Some(author_id) = filter.author_id {
            builder.push(" WHERE author_id = ").push_bind(author_id);
        }

        builder
            .push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = builder
            .build_query_as::<ArticleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn find_links(
        &self,
        table: LinkTable,
        article_ids: &[Uuid],
    ) -> Result<Vec<Link>, AppError> {
        if !ARTICLE_LINK_TABLES.contains(&table) {
            return Err(AppError::Internal(format!(
                "{} is not an article join table",
                table.table()
            )));
        }
        link_repository::find_links(&self.pool, table, article_ids).await
    }

    async fn create(&self, article: &Article, links: &ArticleLinks) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::insert_article(tx.conn(), article, links).await;
        tx.finish(result).await
    }

    async fn update(
        &self,
        article: &Article,
        expected_version: i32,
        changes: &ArticleLinkChanges,
    ) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::update_article(tx.conn(), article, expected_version, changes).await;
        tx.finish(result).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.uow.begin().await?;
        let result = Self::delete_article(tx.conn(), id).await;
        tx.finish(result).await
    }
}
