//! Per-request caller identity.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use renoplan_core::USER_ID_HEADER;
use renoplan_core::repo::UserRoleRepository;
use renoplan_types::{AppRole, SessionContext};
use std::sync::Arc;
use uuid::Uuid;

/// The caller's [`SessionContext`], resolved once per request from the
/// `x-user-id` header. Requests without the header are anonymous.
#[derive(Debug, Clone, Copy)]
pub struct Session(pub SessionContext);

impl Session {
    /// The signed-in user's id; anonymous callers are rejected.
    pub fn require_user(&self) -> Result<Uuid, ApiError> {
        self.0
            .user_id
            .ok_or_else(|| ApiError::forbidden("sign in required"))
    }

    pub fn require_admin(&self) -> Result<Uuid, ApiError> {
        let user_id = self.require_user()?;
        if !self.0.is_admin {
            return Err(ApiError::forbidden("admin role required"));
        }
        Ok(user_id)
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Session(SessionContext::anonymous()));
        };

        let user_id = value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::invalid(format!("invalid {} header", USER_ID_HEADER)))?;
        let is_admin = state.store.has_role(user_id, AppRole::Admin)?;

        Ok(Session(SessionContext::user(user_id, is_admin)))
    }
}
