//! Audit and versioning fields shared by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::shared::RequestContext;

/// Version a freshly created row starts at.
pub const INITIAL_VERSION: i32 = 1;

/// Optimistic version counter plus creation/change stamps.
///
/// Columns, present on every table:
/// - version: INTEGER NOT NULL
/// - created: TIMESTAMPTZ NOT NULL
/// - changed: TIMESTAMPTZ NOT NULL
/// - creator_id: UUID NOT NULL
/// - changed_user: UUID NOT NULL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Audit {
    pub version: i32,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
    pub creator_id: Uuid,
    pub changed_user: Uuid,
}

impl Audit {
    /// Stamps for a row being created now by the context's actor.
    pub fn new(ctx: &RequestContext) -> Self {
        let now = Utc::now();
        Self {
            version: INITIAL_VERSION,
            created: now,
            changed: now,
            creator_id: ctx.actor_id,
            changed_user: ctx.actor_id,
        }
    }

    /// Advance to the next version for an update by the context's actor.
    ///
    /// Returns the version the stored row must still have for the write to
    /// apply.
    pub fn touch(&mut self, ctx: &RequestContext) -> i32 {
        let previous = self.version;
        self.version += 1;
        self.changed = Utc::now();
        self.changed_user = ctx.actor_id;
        previous
    }

    /// Compare a caller's expected version against the stored one.
    pub fn check_expected(&self, expected: Option<i32>, entity: &str) -> Result<(), AppError> {
        match expected {
            Some(v) if v != self.version => Err(AppError::Conflict(format!(
                "{} is at version {}, expected {}",
                entity, self.version, v
            ))),
            _ => Ok(()),
        }
    }
}
