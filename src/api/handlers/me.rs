use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;

use super::types::UserResponse;
use crate::api::guard::require_user;
use crate::api::middleware::RequestClaims;
use crate::auth::AuthError;
use crate::store::{Namespace, UserStore};

#[utoipa::path(
    get,
    path = "/{namespace}/me",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "users"
)]
pub async fn me(
    Path(namespace): Path<String>,
    pool: Extension<PgPool>,
    claims: Extension<RequestClaims>,
) -> Result<impl IntoResponse, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);
    let user = require_user(&store, &claims, None).await?;
    Ok(Json(UserResponse::from(&user)))
}
