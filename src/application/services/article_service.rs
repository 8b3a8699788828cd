//! Article Service
//!
//! Articles are the aggregate exemplar: each one links to blog categories
//! (by id) and blog tags (by name), and owns an optional image and
//! attachment. Related data is resolved through the collaborator services
//! with one batched lookup per relation.
//!
//! Writes to the article row and its join rows share one transaction in
//! the repository. Owned sub-resources go through their own services and
//! are therefore outside that transaction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use super::attachment_service::AttachmentService;
use super::author_service::AuthorService;
use super::image_service::ImageService;
use super::reference_service::ReferenceService;
use super::relations::{
    ensure_owned, index_by_id, lookup, normalize_names, parse_id, resolve_references,
    resolve_tag_names, unique_ids,
};
use crate::application::dto::{
    ArticleDto, AttachmentChange, AttachmentPayload, CreateArticleDto, DeleteArticleDto,
    EntityIdDto, GetArticleDto, ImageChange, ImagePayload, ListArticlesDto, OwnedPayload,
    UpdateArticleDto,
};
use crate::domain::{
    group_by_owner, Article, ArticleField, ArticleFilter, ArticleLinkChanges, ArticleLinks,
    ArticleRepository, ArticleSortKey, Audit, LinkDiff, LinkTable, ReferenceKind,
};
use crate::shared::error::AppError;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// Article service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleService: Send + Sync {
    /// Create an article with its links and owned sub-resources
    async fn create_article(
        &self,
        ctx: &RequestContext,
        request: CreateArticleDto,
    ) -> Result<String, AppError>;

    /// Get an article by id, or by title when no id is given
    async fn get_article(&self, request: GetArticleDto) -> Result<ArticleDto, AppError>;

    /// Update supplied fields, links and owned sub-resources
    async fn update_article(
        &self,
        ctx: &RequestContext,
        request: UpdateArticleDto,
    ) -> Result<String, AppError>;

    /// Delete the article, or only clear the listed fields
    async fn delete_article(
        &self,
        ctx: &RequestContext,
        request: DeleteArticleDto,
    ) -> Result<bool, AppError>;

    /// Paged listing with related data resolved
    async fn list_articles(&self, request: ListArticlesDto) -> Result<Vec<ArticleDto>, AppError>;
}

/// Sub-resources created or replaced during a write.
#[derive(Debug, Default)]
struct OwnedChanges {
    created_image: Option<Uuid>,
    created_attachment: Option<Uuid>,
    superseded_image: Option<Uuid>,
    superseded_attachment: Option<Uuid>,
}

/// ArticleService implementation
pub struct ArticleServiceImpl<A>
where
    A: ArticleRepository,
{
    article_repo: Arc<A>,
    references: Arc<dyn ReferenceService>,
    authors: Arc<dyn AuthorService>,
    images: Arc<dyn ImageService>,
    attachments: Arc<dyn AttachmentService>,
    max_page_limit: i64,
}

impl<A> ArticleServiceImpl<A>
where
    A: ArticleRepository,
{
    pub fn new(
        article_repo: Arc<A>,
        references: Arc<dyn ReferenceService>,
        authors: Arc<dyn AuthorService>,
        images: Arc<dyn ImageService>,
        attachments: Arc<dyn AttachmentService>,
        max_page_limit: i64,
    ) -> Self {
        Self {
            article_repo,
            references,
            authors,
            images,
            attachments,
            max_page_limit,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Article, AppError> {
        self.article_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Article", id))
    }

    async fn current_links(&self, table: LinkTable, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let links = self.article_repo.find_links(table, &[id]).await?;
        Ok(links.into_iter().map(|l| l.related_id).collect())
    }

    /// Resolve related data for a page of articles, one lookup per relation.
    async fn assemble(&self, articles: Vec<Article>) -> Result<Vec<ArticleDto>, AppError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        let (category_links, tag_links) = futures::try_join!(
            self.article_repo
                .find_links(LinkTable::ArticleBlogCategories, &ids),
            self.article_repo.find_links(LinkTable::ArticleBlogTags, &ids),
        )?;

        let author_ids = unique_ids(&articles.iter().map(|a| a.author_id).collect::<Vec<_>>());
        let image_ids = unique_ids(&articles.iter().filter_map(|a| a.image_id).collect::<Vec<_>>());
        let attachment_ids =
            unique_ids(&articles.iter().filter_map(|a| a.attachment_id).collect::<Vec<_>>());
        let category_ids =
            unique_ids(&category_links.iter().map(|l| l.related_id).collect::<Vec<_>>());
        let tag_ids = unique_ids(&tag_links.iter().map(|l| l.related_id).collect::<Vec<_>>());

        let (authors, images, attachments, categories, tags) = futures::try_join!(
            self.authors.get_authors(&author_ids),
            self.images.get_images(&image_ids),
            self.attachments.get_attachments(&attachment_ids),
            self.references
                .get_references(ReferenceKind::BlogCategory, &category_ids),
            self.references
                .get_references(ReferenceKind::BlogTag, &tag_ids),
        )?;

        let authors = index_by_id(authors, |a| &a.id);
        let images = index_by_id(images, |i| &i.id);
        let attachments = index_by_id(attachments, |a| &a.id);
        let categories = index_by_id(categories, |c| &c.id);
        let tags = index_by_id(tags, |t| &t.id);
        let category_links = group_by_owner(&category_links);
        let tag_links = group_by_owner(&tag_links);

        articles
            .into_iter()
            .map(|article| {
                let blog_categories = category_links
                    .get(&article.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(|id| lookup(&categories, *id, "BlogCategory"))
                    .collect::<Result<Vec<_>, _>>()?;
                let blog_tags = tag_links
                    .get(&article.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(|id| lookup(&tags, *id, "BlogTag"))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ArticleDto {
                    id: article.id.to_string(),
                    title: article.title,
                    summary: article.summary,
                    content: article.content,
                    author: lookup(&authors, article.author_id, "Author")?,
                    image: article
                        .image_id
                        .map(|id| lookup(&images, id, "Image"))
                        .transpose()?,
                    attachment: article
                        .attachment_id
                        .map(|id| lookup(&attachments, id, "Attachment"))
                        .transpose()?,
                    blog_categories,
                    blog_tags,
                    audit: article.audit.into(),
                })
            })
            .collect()
    }

    /// Best-effort removal of sub-resources no longer referenced.
    async fn discard_owned(&self, image: Option<Uuid>, attachment: Option<Uuid>) {
        if let Some(id) = image {
            if let Err(e) = self.images.delete_image(EntityIdDto::new(id)).await {
                warn!(image_id = %id, error = %e, "Failed to delete unreferenced image");
            }
        }
        if let Some(id) = attachment {
            if let Err(e) = self.attachments.delete_attachment(EntityIdDto::new(id)).await {
                warn!(attachment_id = %id, error = %e, "Failed to delete unreferenced attachment");
            }
        }
    }

    /// Apply owned sub-resource payloads to `article`, recording what changed.
    ///
    /// On error, `changes` still lists whatever was created before the failure.
    async fn apply_owned(
        &self,
        ctx: &RequestContext,
        article: &mut Article,
        image: Option<ImageChange>,
        attachment: Option<AttachmentChange>,
        changes: &mut OwnedChanges,
    ) -> Result<(), AppError> {
        match image {
            Some(OwnedPayload::Create(create)) => {
                let id = parse_id(&self.images.create_image(ctx, create).await?)?;
                changes.created_image = Some(id);
                changes.superseded_image = article.image_id.replace(id);
            }
            Some(OwnedPayload::Update(_, update)) => {
                self.images.update_image(ctx, update).await?;
            }
            None => {}
        }

        match attachment {
            Some(OwnedPayload::Create(create)) => {
                let id = parse_id(&self.attachments.create_attachment(ctx, create).await?)?;
                changes.created_attachment = Some(id);
                changes.superseded_attachment = article.attachment_id.replace(id);
            }
            Some(OwnedPayload::Update(_, update)) => {
                self.attachments.update_attachment(ctx, update).await?;
            }
            None => {}
        }

        Ok(())
    }
}

#[async_trait]
impl<A> ArticleService for ArticleServiceImpl<A>
where
    A: ArticleRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request))]
    async fn create_article(
        &self,
        ctx: &RequestContext,
        request: CreateArticleDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let author_id = require_id(request.author_id, "author_id")?;
        let tag_names = normalize_names(&request.blog_tags, "blog_tags")?;
        let image = request.image.map(ImagePayload::into_owned).transpose()?;
        let attachment = request
            .attachment
            .map(AttachmentPayload::into_owned)
            .transpose()?;
        // A new article owns nothing yet, so an id-bearing payload is foreign.
        if let Some(id) = image.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(None, id, "image")?;
        }
        if let Some(id) = attachment.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(None, id, "attachment")?;
        }

        self.authors.get_authors(&[author_id]).await?;
        let categories = resolve_references(
            self.references.as_ref(),
            ReferenceKind::BlogCategory,
            &request.blog_category_ids,
        )
        .await?;
        let tags = resolve_tag_names(
            self.references.as_ref(),
            ctx,
            ReferenceKind::BlogTag,
            &tag_names,
        )
        .await?;

        let mut article = Article {
            id: Uuid::now_v7(),
            title: request.title.trim().to_string(),
            summary: request.summary,
            content: request.content,
            author_id,
            image_id: None,
            attachment_id: None,
            audit: Audit::new(ctx),
        };

        let mut owned = OwnedChanges::default();
        if let Err(e) = self
            .apply_owned(ctx, &mut article, image, attachment, &mut owned)
            .await
        {
            self.discard_owned(owned.created_image, owned.created_attachment)
                .await;
            return Err(e);
        }

        let links = ArticleLinks { categories, tags };
        if let Err(e) = self.article_repo.create(&article, &links).await {
            self.discard_owned(owned.created_image, owned.created_attachment)
                .await;
            return Err(e);
        }

        info!(id = %article.id, "Article created");
        Ok(article.id.to_string())
    }

    async fn get_article(&self, request: GetArticleDto) -> Result<ArticleDto, AppError> {
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let article = match (request.id, title) {
            (Some(id), _) => self.fetch(id).await?,
            (None, Some(title)) => self
                .article_repo
                .find_by_title(title)
                .await?
                .ok_or_else(|| AppError::not_found("Article", title))?,
            (None, None) => {
                return Err(AppError::Validation("id, title: id or title is required".into()))
            }
        };

        self.assemble(vec![article])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("article assembly returned nothing".into()))
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn update_article(
        &self,
        ctx: &RequestContext,
        request: UpdateArticleDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;
        let tag_names = request
            .blog_tags
            .as_deref()
            .map(|names| normalize_names(names, "blog_tags"))
            .transpose()?;
        let image = request.image.map(ImagePayload::into_owned).transpose()?;
        let attachment = request
            .attachment
            .map(AttachmentPayload::into_owned)
            .transpose()?;

        let mut article = self.fetch(id).await?;
        article
            .audit
            .check_expected(request.expected_version, "Article")?;
        if let Some(image_id) = image.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(article.image_id, image_id, "image")?;
        }
        if let Some(attachment_id) = attachment.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(article.attachment_id, attachment_id, "attachment")?;
        }

        if let Some(author_id) = request.author_id {
            self.authors.get_authors(&[author_id]).await?;
            article.author_id = author_id;
        }

        let mut links = ArticleLinkChanges::default();
        if let Some(category_ids) = &request.blog_category_ids {
            let requested = resolve_references(
                self.references.as_ref(),
                ReferenceKind::BlogCategory,
                category_ids,
            )
            .await?;
            let current = self
                .current_links(LinkTable::ArticleBlogCategories, id)
                .await?;
            links.categories = LinkDiff::between(&current, &requested);
        }
        if let Some(names) = &tag_names {
            let requested = resolve_tag_names(
                self.references.as_ref(),
                ctx,
                ReferenceKind::BlogTag,
                names,
            )
            .await?;
            let current = self.current_links(LinkTable::ArticleBlogTags, id).await?;
            links.tags = LinkDiff::between(&current, &requested);
        }

        let mut owned = OwnedChanges::default();
        if let Err(e) = self
            .apply_owned(ctx, &mut article, image, attachment, &mut owned)
            .await
        {
            self.discard_owned(owned.created_image, owned.created_attachment)
                .await;
            return Err(e);
        }

        if let Some(title) = request.title {
            article.title = title.trim().to_string();
        }
        if let Some(summary) = request.summary {
            article.summary = Some(summary);
        }
        if let Some(content) = request.content {
            article.content = Some(content);
        }

        let expected = article.audit.touch(ctx);
        if let Err(e) = self.article_repo.update(&article, expected, &links).await {
            self.discard_owned(owned.created_image, owned.created_attachment)
                .await;
            return Err(e);
        }

        self.discard_owned(owned.superseded_image, owned.superseded_attachment)
            .await;

        info!(id = %id, version = article.audit.version, "Article updated");
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn delete_article(
        &self,
        ctx: &RequestContext,
        request: DeleteArticleDto,
    ) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        let fields = request
            .fields_to_delete
            .iter()
            .map(|f| ArticleField::parse(f))
            .collect::<Result<Vec<_>, _>>()?;

        let mut article = self.fetch(id).await?;

        if !fields.is_empty() {
            for field in fields {
                article.clear(field);
            }
            let expected = article.audit.touch(ctx);
            self.article_repo
                .update(&article, expected, &ArticleLinkChanges::default())
                .await?;

            info!(id = %id, version = article.audit.version, "Article fields cleared");
            return Ok(true);
        }

        if let Some(image_id) = article.image_id {
            self.images.delete_image(EntityIdDto::new(image_id)).await?;
        }
        if let Some(attachment_id) = article.attachment_id {
            self.attachments
                .delete_attachment(EntityIdDto::new(attachment_id))
                .await?;
        }
        self.article_repo.delete(id).await?;

        info!(id = %id, "Article deleted");
        Ok(true)
    }

    async fn list_articles(&self, request: ListArticlesDto) -> Result<Vec<ArticleDto>, AppError> {
        let query = request
            .page
            .validate::<ArticleSortKey>(self.max_page_limit)?;
        let filter = ArticleFilter {
            author_id: request.author_id,
        };

        let articles = self.article_repo.list(&query, &filter).await?;
        self.assemble(articles).await
    }
}
