//! Authorization gate, called explicitly by protected handlers.

use crate::api::middleware::RequestClaims;
use crate::auth::AuthError;
use crate::store::{Role, User, UserStore};

/// Resolve the middleware claim into a live user record, optionally
/// enforcing a role.
///
/// # Errors
/// `NotAuthenticated` when no claim is attached, `UserNotFound` when the
/// account no longer exists in this namespace, `Forbidden` on role mismatch.
pub async fn require_user(
    store: &UserStore,
    claims: &RequestClaims,
    required_role: Option<Role>,
) -> Result<User, AuthError> {
    let claims = claims.0.as_ref().ok_or(AuthError::NotAuthenticated)?;

    let user = store
        .find_by_username(&claims.username)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if let Some(role) = required_role {
        if user.role != role {
            return Err(AuthError::Forbidden);
        }
    }

    Ok(user)
}
