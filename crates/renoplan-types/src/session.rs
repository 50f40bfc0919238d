//! Per-request caller context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is making a request. Resolved once and passed explicitly to every
/// operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Signed-in user, `None` for anonymous visitors.
    pub user_id: Option<Uuid>,
    pub is_admin: bool,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
