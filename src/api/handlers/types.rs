//! Request/response types for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::{Role, User};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SetRoleForm {
    pub target_role: String,
    pub user_id: String,
}

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    100
}

/// Token body returned by login and refresh; logout returns it with both
/// fields cleared.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    #[must_use]
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token: Some(access_token),
            token_type: Some("bearer".to_string()),
        }
    }

    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            access_token: None,
            token_type: None,
        }
    }
}

/// Public view of a user record. The password hash never leaves the store
/// layer.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn token_response_bearer_shape() -> Result<()> {
        let value = serde_json::to_value(TokenResponse::bearer("sealed".to_string()))?;
        let token_type = value
            .get("token_type")
            .and_then(serde_json::Value::as_str)
            .context("missing token_type")?;
        assert_eq!(token_type, "bearer");
        assert_eq!(
            value.get("access_token").and_then(serde_json::Value::as_str),
            Some("sealed")
        );
        Ok(())
    }

    #[test]
    fn token_response_cleared_is_null() -> Result<()> {
        let value = serde_json::to_value(TokenResponse::cleared())?;
        assert!(value
            .get("access_token")
            .context("missing access_token")?
            .is_null());
        assert!(value
            .get("token_type")
            .context("missing token_type")?
            .is_null());
        Ok(())
    }

    #[test]
    fn user_response_never_carries_the_password_hash() -> Result<()> {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$sensitive".to_string(),
            role: Role::User,
            session: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(UserResponse::from(&user))?;
        assert!(value.get("password_hash").is_none());
        assert!(value.get("refresh_token").is_none());
        assert_eq!(
            value.get("username").and_then(serde_json::Value::as_str),
            Some("alice")
        );
        assert_eq!(
            value.get("role").and_then(serde_json::Value::as_str),
            Some("user")
        );
        Ok(())
    }

    #[test]
    fn list_query_defaults() -> Result<()> {
        let query: ListQuery = serde_json::from_str("{}")?;
        assert_eq!(query.skip, 0);
        assert_eq!(query.limit, 100);
        let query: ListQuery = serde_json::from_str(r#"{"skip": 5, "limit": 10}"#)?;
        assert_eq!(query.skip, 5);
        assert_eq!(query.limit, 10);
        Ok(())
    }
}
