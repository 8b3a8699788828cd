//! Request Context
//!
//! The acting principal for a mutating operation. Audit columns
//! (`creator_id`, `changed_user`) are filled from here.

use uuid::Uuid;

/// Who is performing the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub actor_id: Uuid,
}

impl RequestContext {
    pub fn new(actor_id: Uuid) -> Self {
        Self { actor_id }
    }
}
