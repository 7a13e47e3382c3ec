//! User listing and role administration.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde_json::json;
use sqlx::PgPool;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::types::{ListQuery, SetRoleForm, UserResponse};
use crate::api::guard::require_user;
use crate::api::middleware::RequestClaims;
use crate::auth::AuthError;
use crate::store::{Namespace, Role, UserStore};

#[utoipa::path(
    get,
    path = "/{namespace}/users",
    params(
        ("namespace" = String, Path, description = "Tenant namespace"),
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Maximum rows to return"),
    ),
    responses(
        (status = 200, description = "Users in this namespace", body = [UserResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "users"
)]
pub async fn list_users(
    Path(namespace): Path<String>,
    Query(query): Query<ListQuery>,
    pool: Extension<PgPool>,
    claims: Extension<RequestClaims>,
) -> Result<impl IntoResponse, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);
    require_user(&store, &claims, None).await?;

    let users = store.list(query.skip, query.limit).await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

#[utoipa::path(
    put,
    path = "/{namespace}/set-role",
    params(("namespace" = String, Path, description = "Tenant namespace")),
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Target user not found"),
    ),
    tag = "users"
)]
pub async fn set_role(
    Path(namespace): Path<String>,
    pool: Extension<PgPool>,
    claims: Extension<RequestClaims>,
    Form(form): Form<SetRoleForm>,
) -> Result<Response, AuthError> {
    let store = UserStore::new(pool.0, Namespace::parse(&namespace)?);
    let admin = require_user(&store, &claims, Some(Role::Admin)).await?;

    let role = Role::from_str(&form.target_role)?;
    let target_id = Uuid::parse_str(&form.user_id).map_err(|_| AuthError::MalformedRequest)?;

    match store.set_role(target_id, role).await? {
        Some(user) => {
            info!(
                namespace = %store.namespace(),
                admin = %admin.username,
                target = %user.username,
                role = role.as_str(),
                "role updated"
            );
            Ok(Json(UserResponse::from(&user)).into_response())
        }
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error_code": "user_not_found",
                "error": "User not found",
            })),
        )
            .into_response()),
    }
}
