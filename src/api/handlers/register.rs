use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
    Form,
};
use sqlx::PgPool;
use tracing::{error, info};

use super::types::{RegisterForm, UserResponse};
use crate::auth::{password, AuthError};
use crate::store::{normalize_username, Namespace, UserStore};

#[utoipa::path(
    post,
    path = "/{namespace}/register",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Username already registered or malformed input"),
    ),
    tag = "auth"
)]
pub async fn register(
    Path(namespace): Path<String>,
    pool: Extension<PgPool>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);

    let username = normalize_username(&form.username);
    if username.is_empty() || form.password.is_empty() {
        return Err(AuthError::MalformedRequest);
    }

    let password_hash = password::hash(&form.password).map_err(|err| {
        error!("Failed to hash password: {err}");
        AuthError::Internal
    })?;

    let user = store.create_user(&username, &password_hash).await?;
    info!(namespace = %store.namespace(), username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}
