//! In-memory repository implementations
//!
//! Behave like the PostgreSQL repositories where the services can observe
//! it: version compare-and-swap, oldest-first natural key lookups, batched
//! `ANY` lookups and atomic aggregate writes.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use content_backend::domain::{
    ApiEndpoint, ApiEndpointFilter, ApiEndpointRepository, ApiEndpointSortKey, Article,
    ArticleFilter, ArticleLinkChanges, ArticleLinks, ArticleRepository, ArticleSortKey,
    Attachment, AttachmentRepository, AttachmentSortKey, Audit, Author, AuthorRepository,
    AuthorSortKey, Image, ImageRepository, ImageSortKey, Link, LinkDiff, LinkTable,
    ReferenceEntity, ReferenceKind, ReferenceRepository, ReferenceSortKey,
};
use content_backend::shared::error::AppError;
use content_backend::shared::pagination::{ListQuery, SortKey, SortOrder};

/// A stored row.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn audit(&self) -> &Audit;
    /// Value of a text sort column.
    fn text(&self, column: &str) -> String;
}

impl Record for ReferenceEntity {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, _column: &str) -> String {
        self.name.clone()
    }
}

impl Record for Author {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, _column: &str) -> String {
        self.name.clone()
    }
}

impl Record for Image {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, _column: &str) -> String {
        self.title.clone().unwrap_or_default()
    }
}

impl Record for Attachment {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, _column: &str) -> String {
        self.file_name.clone()
    }
}

impl Record for Article {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, _column: &str) -> String {
        self.title.clone()
    }
}

impl Record for ApiEndpoint {
    fn id(&self) -> Uuid {
        self.id
    }
    fn audit(&self) -> &Audit {
        &self.audit
    }
    fn text(&self, column: &str) -> String {
        match column {
            "route" => self.route.clone(),
            _ => self.name.clone(),
        }
    }
}

fn compare<T: Record>(a: &T, b: &T, column: &str) -> Ordering {
    match column {
        "id" => a.id().cmp(&b.id()),
        "created" => a.audit().created.cmp(&b.audit().created),
        "changed" => a.audit().changed.cmp(&b.audit().changed),
        other => a.text(other).cmp(&b.text(other)),
    }
}

/// Sort and slice rows the way `ORDER BY col dir, id ASC LIMIT OFFSET` does.
pub fn page<T: Record, K: SortKey>(mut rows: Vec<T>, query: &ListQuery<K>) -> Vec<T> {
    let column = query.sort.key.column();
    rows.sort_by(|a, b| {
        let primary = compare(a, b, column);
        let primary = match query.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    });
    rows.into_iter()
        .skip(query.offset as usize)
        .take(query.limit as usize)
        .collect()
}

/// One table of rows.
pub struct Table<T> {
    rows: Mutex<Vec<T>>,
    fail_writes: AtomicBool,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<T: Record> Table<T> {
    /// Make every following write fail as a lost connection would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            Err(AppError::Internal("simulated write failure".into()))
        } else {
            Ok(())
        }
    }

    pub fn all(&self) -> Vec<T> {
        self.rows.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.rows.lock().iter().find(|r| r.id() == id).cloned()
    }

    pub fn get_many(&self, ids: &[Uuid]) -> Vec<T> {
        self.rows
            .lock()
            .iter()
            .filter(|r| ids.contains(&r.id()))
            .cloned()
            .collect()
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.lock().iter().filter(|r| predicate(r)).cloned().collect();
        rows.sort_by(|a, b| compare(a, b, "created").then_with(|| a.id().cmp(&b.id())));
        rows
    }

    /// Oldest row matching `predicate`.
    pub fn first(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.filter(predicate).into_iter().next()
    }

    pub fn insert(&self, row: T) -> Result<(), AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock();
        if rows.iter().any(|r| r.id() == row.id()) {
            return Err(AppError::Internal(format!("duplicate key {}", row.id())));
        }
        rows.push(row);
        Ok(())
    }

    /// Replace the row only if its stored version is `expected_version`.
    pub fn update(&self, row: T, expected_version: i32, entity: &str) -> Result<(), AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock();
        match rows
            .iter_mut()
            .find(|r| r.id() == row.id() && r.audit().version == expected_version)
        {
            Some(stored) => {
                *stored = row;
                Ok(())
            }
            None => Err(AppError::Conflict(format!(
                "{} {} was modified concurrently",
                entity,
                row.id()
            ))),
        }
    }

    pub fn remove(&self, id: Uuid, entity: &str) -> Result<(), AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Err(AppError::not_found(entity, id));
        }
        Ok(())
    }
}

/// Rows of every join table.
#[derive(Default)]
pub struct LinkStore {
    rows: Mutex<Vec<(LinkTable, Link)>>,
}

impl LinkStore {
    pub fn find(&self, table: LinkTable, owner_ids: &[Uuid]) -> Vec<Link> {
        self.rows
            .lock()
            .iter()
            .filter(|(t, l)| *t == table && owner_ids.contains(&l.owner_id))
            .map(|(_, l)| *l)
            .collect()
    }

    pub fn related(&self, table: LinkTable, owner_id: Uuid) -> Vec<Uuid> {
        self.find(table, &[owner_id])
            .into_iter()
            .map(|l| l.related_id)
            .collect()
    }

    fn insert(&self, table: LinkTable, owner_id: Uuid, related: &[Uuid]) {
        let mut rows = self.rows.lock();
        rows.extend(related.iter().map(|r| (table, Link::new(owner_id, *r))));
    }

    fn apply(&self, table: LinkTable, owner_id: Uuid, diff: &LinkDiff) {
        self.rows.lock().retain(|(t, l)| {
            !(*t == table && l.owner_id == owner_id && diff.removed.contains(&l.related_id))
        });
        self.insert(table, owner_id, &diff.added);
    }

    fn remove_owner(&self, tables: &[LinkTable], owner_id: Uuid) {
        self.rows
            .lock()
            .retain(|(t, l)| !(tables.contains(t) && l.owner_id == owner_id));
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryReferenceRepository {
    pub rows: Table<ReferenceEntity>,
}

impl MemoryReferenceRepository {
    pub fn count(&self, kind: ReferenceKind) -> usize {
        self.rows.filter(|r| r.kind == kind).len()
    }

    pub fn count_named(&self, kind: ReferenceKind, name: &str) -> usize {
        self.rows.filter(|r| r.kind == kind && r.name == name).len()
    }
}

#[async_trait]
impl ReferenceRepository for MemoryReferenceRepository {
    async fn find_by_id(
        &self,
        kind: ReferenceKind,
        id: Uuid,
    ) -> Result<Option<ReferenceEntity>, AppError> {
        Ok(self.rows.get(id).filter(|r| r.kind == kind))
    }

    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        Ok(self
            .rows
            .get_many(ids)
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect())
    }

    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceEntity>, AppError> {
        Ok(self.rows.first(|r| r.kind == kind && r.name == name))
    }

    async fn find_by_names(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        Ok(self
            .rows
            .filter(|r| r.kind == kind && names.contains(&r.name)))
    }

    async fn list(
        &self,
        kind: ReferenceKind,
        query: &ListQuery<ReferenceSortKey>,
    ) -> Result<Vec<ReferenceEntity>, AppError> {
        Ok(page(self.rows.filter(|r| r.kind == kind), query))
    }

    async fn create(&self, entity: &ReferenceEntity) -> Result<(), AppError> {
        self.rows.insert(entity.clone())
    }

    async fn update(&self, entity: &ReferenceEntity, expected_version: i32) -> Result<(), AppError> {
        self.rows
            .update(entity.clone(), expected_version, entity.kind.label())
    }

    async fn delete(&self, kind: ReferenceKind, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, kind.label())
    }
}

#[derive(Default)]
pub struct MemoryAuthorRepository {
    pub rows: Table<Author>,
}

#[async_trait]
impl AuthorRepository for MemoryAuthorRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>, AppError> {
        Ok(self.rows.get(id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Author>, AppError> {
        Ok(self.rows.get_many(ids))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Author>, AppError> {
        Ok(self.rows.first(|a| a.name == name))
    }

    async fn list(&self, query: &ListQuery<AuthorSortKey>) -> Result<Vec<Author>, AppError> {
        Ok(page(self.rows.all(), query))
    }

    async fn create(&self, author: &Author) -> Result<(), AppError> {
        self.rows.insert(author.clone())
    }

    async fn update(&self, author: &Author, expected_version: i32) -> Result<(), AppError> {
        self.rows.update(author.clone(), expected_version, "Author")
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, "Author")
    }
}

#[derive(Default)]
pub struct MemoryImageRepository {
    pub rows: Table<Image>,
}

#[async_trait]
impl ImageRepository for MemoryImageRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        Ok(self.rows.get(id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Image>, AppError> {
        Ok(self.rows.get_many(ids))
    }

    async fn list(&self, query: &ListQuery<ImageSortKey>) -> Result<Vec<Image>, AppError> {
        Ok(page(self.rows.all(), query))
    }

    async fn create(&self, image: &Image) -> Result<(), AppError> {
        self.rows.insert(image.clone())
    }

    async fn update(&self, image: &Image, expected_version: i32) -> Result<(), AppError> {
        self.rows.update(image.clone(), expected_version, "Image")
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, "Image")
    }
}

#[derive(Default)]
pub struct MemoryAttachmentRepository {
    pub rows: Table<Attachment>,
}

#[async_trait]
impl AttachmentRepository for MemoryAttachmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        Ok(self.rows.get(id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, AppError> {
        Ok(self.rows.get_many(ids))
    }

    async fn list(
        &self,
        query: &ListQuery<AttachmentSortKey>,
    ) -> Result<Vec<Attachment>, AppError> {
        Ok(page(self.rows.all(), query))
    }

    async fn create(&self, attachment: &Attachment) -> Result<(), AppError> {
        self.rows.insert(attachment.clone())
    }

    async fn update(&self, attachment: &Attachment, expected_version: i32) -> Result<(), AppError> {
        self.rows
            .update(attachment.clone(), expected_version, "Attachment")
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, "Attachment")
    }
}

const ARTICLE_TABLES: [LinkTable; 2] =
    [LinkTable::ArticleBlogCategories, LinkTable::ArticleBlogTags];

#[derive(Default)]
pub struct MemoryArticleRepository {
    pub rows: Table<Article>,
    pub links: LinkStore,
}

#[async_trait]
impl ArticleRepository for MemoryArticleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, AppError> {
        Ok(self.rows.get(id))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Article>, AppError> {
        Ok(self.rows.first(|a| a.title == title))
    }

    async fn list(
        &self,
        query: &ListQuery<ArticleSortKey>,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, AppError> {
        let rows = self
            .rows
            .filter(|a| filter.author_id.map_or(true, |id| a.author_id == id));
        Ok(page(rows, query))
    }

    async fn find_links(
        &self,
        table: LinkTable,
        article_ids: &[Uuid],
    ) -> Result<Vec<Link>, AppError> {
        Ok(self.links.find(table, article_ids))
    }

    async fn create(&self, article: &Article, links: &ArticleLinks) -> Result<(), AppError> {
        self.rows.insert(article.clone())?;
        self.links
            .insert(LinkTable::ArticleBlogCategories, article.id, &links.categories);
        self.links
            .insert(LinkTable::ArticleBlogTags, article.id, &links.tags);
        Ok(())
    }

    async fn update(
        &self,
        article: &Article,
        expected_version: i32,
        changes: &ArticleLinkChanges,
    ) -> Result<(), AppError> {
        self.rows
            .update(article.clone(), expected_version, "Article")?;
        self.links
            .apply(LinkTable::ArticleBlogCategories, article.id, &changes.categories);
        self.links
            .apply(LinkTable::ArticleBlogTags, article.id, &changes.tags);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, "Article")?;
        self.links.remove_owner(&ARTICLE_TABLES, id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryApiEndpointRepository {
    pub rows: Table<ApiEndpoint>,
    pub links: LinkStore,
}

#[async_trait]
impl ApiEndpointRepository for MemoryApiEndpointRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiEndpoint>, AppError> {
        Ok(self.rows.get(id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiEndpoint>, AppError> {
        Ok(self.rows.first(|e| e.name == name))
    }

    async fn list(
        &self,
        query: &ListQuery<ApiEndpointSortKey>,
        filter: &ApiEndpointFilter,
    ) -> Result<Vec<ApiEndpoint>, AppError> {
        let rows = self.rows.filter(|e| {
            filter
                .environment_id
                .map_or(true, |id| e.environment_id == id)
        });
        Ok(page(rows, query))
    }

    async fn find_links(
        &self,
        table: LinkTable,
        endpoint_ids: &[Uuid],
    ) -> Result<Vec<Link>, AppError> {
        Ok(self.links.find(table, endpoint_ids))
    }

    async fn create(&self, endpoint: &ApiEndpoint, tag_ids: &[Uuid]) -> Result<(), AppError> {
        self.rows.insert(endpoint.clone())?;
        self.links
            .insert(LinkTable::ApiEndpointApiTags, endpoint.id, tag_ids);
        Ok(())
    }

    async fn update(
        &self,
        endpoint: &ApiEndpoint,
        expected_version: i32,
        tags: &LinkDiff,
    ) -> Result<(), AppError> {
        self.rows
            .update(endpoint.clone(), expected_version, "ApiEndpoint")?;
        self.links
            .apply(LinkTable::ApiEndpointApiTags, endpoint.id, tags);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.rows.remove(id, "ApiEndpoint")?;
        self.links
            .remove_owner(&[LinkTable::ApiEndpointApiTags], id);
        Ok(())
    }
}
