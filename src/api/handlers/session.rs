//! Login, refresh-token rotation, and logout endpoints.

use axum::{
    extract::{Extension, Path},
    http::{
        header::{HeaderValue, InvalidHeaderValue, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Form,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::types::{LoginForm, TokenResponse};
use crate::api::guard::require_user;
use crate::api::middleware::{cookie_value, RequestClaims, REFRESH_TOKEN_COOKIE};
use crate::auth::{session, state::CookieConfig, AuthError, AuthState, Fingerprint};
use crate::store::{Namespace, UserStore};

#[utoipa::path(
    post,
    path = "/{namespace}/login",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 200, description = "Session started, refresh cookie set", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    Path(namespace): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);
    let fingerprint = Fingerprint::from_headers(&headers);

    let pair = session::login(
        &store,
        state.tokens(),
        &form.username,
        &form.password,
        &fingerprint,
    )
    .await?;

    info!(namespace = %store.namespace(), "login succeeded");
    token_response(&state, &pair.access, &pair.refresh)
}

#[utoipa::path(
    post,
    path = "/{namespace}/refresh-token",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 200, description = "Tokens rotated, refresh cookie replaced", body = TokenResponse),
        (status = 401, description = "Missing cookie, stale token, or device mismatch"),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Path(namespace): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);

    let raw = cookie_value(&headers, REFRESH_TOKEN_COOKIE).ok_or(AuthError::NotAuthenticated)?;
    // Un-openable cookie values fall through to signature verification.
    let presented = state.envelope().open(&raw).unwrap_or(raw);

    let fingerprint = Fingerprint::from_headers(&headers);
    let pair = session::refresh(&store, state.tokens(), &presented, &fingerprint).await?;

    info!(namespace = %store.namespace(), "refresh token rotated");
    token_response(&state, &pair.access, &pair.refresh)
}

#[utoipa::path(
    post,
    path = "/{namespace}/logout",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 200, description = "Session cleared, refresh cookie removed", body = TokenResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "auth"
)]
pub async fn logout(
    Path(namespace): Path<String>,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    claims: Extension<RequestClaims>,
) -> Result<Response, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);

    let user = require_user(&store, &claims, None).await?;
    session::logout(&store, &user).await?;

    info!(namespace = %store.namespace(), username = %user.username, "logout");

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        clear_refresh_cookie(state.cookie()).map_err(|_| AuthError::Internal)?,
    );
    Ok((StatusCode::OK, headers, Json(TokenResponse::cleared())).into_response())
}

/// Seal both tokens, set the refresh cookie, and return the access token in
/// the body. The refresh token never appears in a response body.
fn token_response(state: &AuthState, access: &str, refresh: &str) -> Result<Response, AuthError> {
    let sealed_access = state.envelope().seal(access).map_err(|_| AuthError::Internal)?;
    let sealed_refresh = state.envelope().seal(refresh).map_err(|_| AuthError::Internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        refresh_cookie(state.cookie(), &sealed_refresh).map_err(|_| AuthError::Internal)?,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(TokenResponse::bearer(sealed_access)),
    )
        .into_response())
}

/// Build the httponly refresh-token cookie.
fn refresh_cookie(config: &CookieConfig, value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.max_age_seconds;
    let mut cookie =
        format!("{REFRESH_TOKEN_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_refresh_cookie(config: &CookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{REFRESH_TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
