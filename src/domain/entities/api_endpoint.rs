//! API endpoint aggregate and repository trait.
//!
//! Maps to the `api_endpoints` table plus the join table
//! `api_endpoint_api_tags`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use super::link::{Link, LinkDiff, LinkTable};
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// HTTP methods an endpoint may declare.
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Normalize and check an HTTP method name.
pub fn normalize_http_method(method: &str) -> Result<String, AppError> {
    let upper = method.trim().to_ascii_uppercase();
    if HTTP_METHODS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(AppError::Validation(format!(
            "http_method: '{}' is not a supported method",
            method
        )))
    }
}

/// A catalogued API endpoint.
///
/// Maps to the `api_endpoints` table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(200) NOT NULL
/// - route: TEXT NOT NULL
/// - http_method: VARCHAR(10) NOT NULL
/// - description: TEXT NULL
/// - environment_id: UUID NOT NULL REFERENCES app_environments(id)
/// - attachment_id: UUID NULL REFERENCES attachments(id)
/// - audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub id: Uuid,
    pub name: String,
    pub route: String,
    pub http_method: String,
    pub description: Option<String>,
    pub environment_id: Uuid,
    pub attachment_id: Option<Uuid>,
    pub audit: Audit,
}

impl ApiEndpoint {
    pub fn clear(&mut self, field: ApiEndpointField) {
        match field {
            ApiEndpointField::Description => self.description = None,
            ApiEndpointField::AttachmentId => self.attachment_id = None,
        }
    }
}

/// Endpoint columns that a field-clearing delete may null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpointField {
    Description,
    AttachmentId,
}

impl ApiEndpointField {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" => Ok(Self::Description),
            "attachment" | "attachment_id" => Ok(Self::AttachmentId),
            "id" | "name" | "route" | "http_method" | "environment_id" | "version" | "created"
            | "changed" => Err(AppError::Validation(format!(
                "fields_to_delete: '{}' is required and cannot be cleared",
                s
            ))),
            _ => Err(AppError::Validation(format!(
                "fields_to_delete: unknown api endpoint field '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEndpointSortKey {
    Id,
    Name,
    Route,
    Created,
    Changed,
}

impl SortKey for ApiEndpointSortKey {
    const DEFAULT: Self = Self::Id;

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "route" => Some(Self::Route),
            "created" => Some(Self::Created),
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Route => "route",
            Self::Created => "created",
            Self::Changed => "changed",
        }
    }
}

/// Equality filters for endpoint listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiEndpointFilter {
    pub environment_id: Option<Uuid>,
}

/// Repository trait for the ApiEndpoint aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiEndpointRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiEndpoint>, AppError>;

    /// First endpoint (oldest) with exactly this name.
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiEndpoint>, AppError>;

    async fn list(
        &self,
        query: &ListQuery<ApiEndpointSortKey>,
        filter: &ApiEndpointFilter,
    ) -> Result<Vec<ApiEndpoint>, AppError>;

    async fn find_links(&self, table: LinkTable, endpoint_ids: &[Uuid])
        -> Result<Vec<Link>, AppError>;

    async fn create(&self, endpoint: &ApiEndpoint, tag_ids: &[Uuid]) -> Result<(), AppError>;

    async fn update(
        &self,
        endpoint: &ApiEndpoint,
        expected_version: i32,
        tags: &LinkDiff,
    ) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
