//! Join rows between aggregates and reference entities.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join tables owned by aggregates.
///
/// Table names follow `{aggregate}_{related}s`; each table has columns
/// `id`, `<owner_column>`, `<related_column>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkTable {
    ArticleBlogCategories,
    ArticleBlogTags,
    ApiEndpointApiTags,
}

impl LinkTable {
    pub fn table(&self) -> &'static str {
        match self {
            Self::ArticleBlogCategories => "article_blog_categories",
            Self::ArticleBlogTags => "article_blog_tags",
            Self::ApiEndpointApiTags => "api_endpoint_api_tags",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            Self::ArticleBlogCategories | Self::ArticleBlogTags => "article_id",
            Self::ApiEndpointApiTags => "api_endpoint_id",
        }
    }

    pub fn related_column(&self) -> &'static str {
        match self {
            Self::ArticleBlogCategories => "blog_category_id",
            Self::ArticleBlogTags => "blog_tag_id",
            Self::ApiEndpointApiTags => "api_tag_id",
        }
    }
}

/// A single join row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Link {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub related_id: Uuid,
}

impl Link {
    pub fn new(owner_id: Uuid, related_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            related_id,
        }
    }
}

/// Group join rows by owner, keeping row order.
pub fn group_by_owner(links: &[Link]) -> HashMap<Uuid, Vec<Uuid>> {
    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in links {
        grouped.entry(link.owner_id).or_default().push(link.related_id);
    }
    grouped
}

/// Set difference between the links an aggregate has and the ones requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
}

impl LinkDiff {
    pub fn between(current: &[Uuid], requested: &[Uuid]) -> Self {
        let current_set: HashSet<&Uuid> = current.iter().collect();
        let requested_set: HashSet<&Uuid> = requested.iter().collect();

        let mut seen = HashSet::new();
        let added = requested
            .iter()
            .filter(|id| !current_set.contains(id) && seen.insert(**id))
            .copied()
            .collect();
        let removed = current
            .iter()
            .filter(|id| !requested_set.contains(id))
            .copied()
            .collect();

        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
