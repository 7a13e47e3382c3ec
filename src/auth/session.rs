//! Session orchestration: login, refresh-token rotation, and logout.
//!
//! Each account holds at most one live session. Login and refresh both
//! overwrite the stored refresh token and device fingerprint in a single
//! update, so any previously issued refresh token stops working the moment a
//! newer one exists.

use tracing::debug;

use super::{
    error::AuthError, fingerprint::Fingerprint, password, token::TokenSuite,
};
use crate::store::{StoredSession, User, UserStore};

/// A freshly issued access/refresh pair, still unencrypted.
#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Authenticate credentials and start a session.
///
/// Unknown username and wrong password both fail with
/// `AuthError::InvalidCredentials` so responses cannot be used to enumerate
/// accounts.
///
/// # Errors
/// `InvalidCredentials` on bad username/password, `Store` on backend failure.
pub async fn login(
    store: &UserStore,
    tokens: &TokenSuite,
    username: &str,
    password: &str,
    fingerprint: &Fingerprint,
) -> Result<TokenPair, AuthError> {
    let user = store
        .find_by_username(username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    debug!(username = %user.username, "login verified");
    issue(store, tokens, &user, fingerprint).await
}

/// Rotate an active session with a presented refresh token.
///
/// The stored refresh token and fingerprint must both match exactly; a prior
/// logout or a newer login leaves a mismatch and permanently invalidates the
/// presented token.
///
/// # Errors
/// `TokenExpired`/`TokenInvalid` on a bad token, `UserNotFound` for deleted
/// accounts, `RefreshTokenMismatch`/`DeviceMismatch` on rotation or binding
/// violations, `Store` on backend failure.
pub async fn refresh(
    store: &UserStore,
    tokens: &TokenSuite,
    presented: &str,
    fingerprint: &Fingerprint,
) -> Result<TokenPair, AuthError> {
    let claims = tokens.refresh.verify(presented)?;

    let user = store
        .find_by_username(&claims.username)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    check_rotation(user.session.as_ref(), presented, fingerprint)?;

    debug!(username = %user.username, "refresh token rotated");
    issue(store, tokens, &user, fingerprint).await
}

/// Check a presented refresh token against the stored session.
///
/// A cleared session (logout) and a superseded token (newer login or
/// refresh) both fail the same way; a fingerprint change fails separately.
fn check_rotation(
    session: Option<&StoredSession>,
    presented: &str,
    fingerprint: &Fingerprint,
) -> Result<(), AuthError> {
    let session = session.ok_or(AuthError::RefreshTokenMismatch)?;
    if session.refresh_token != presented {
        return Err(AuthError::RefreshTokenMismatch);
    }
    if &session.fingerprint != fingerprint {
        return Err(AuthError::DeviceMismatch);
    }
    Ok(())
}

/// End the session: any outstanding refresh token becomes unusable.
///
/// # Errors
/// `Store` on backend failure.
pub async fn logout(store: &UserStore, user: &User) -> Result<(), AuthError> {
    store.clear_session(user.id).await
}

async fn issue(
    store: &UserStore,
    tokens: &TokenSuite,
    user: &User,
    fingerprint: &Fingerprint,
) -> Result<TokenPair, AuthError> {
    let access = tokens.access.sign(&user.username)?;
    let refresh = tokens.refresh.sign(&user.username)?;

    // Refresh token and fingerprint land in one update so a crash cannot
    // leave a new token bound to a stale device.
    store.set_session(user.id, &refresh, fingerprint).await?;

    Ok(TokenPair { access, refresh })
}
