//! Namespace-scoped credential store.
//!
//! Every operation runs against exactly one tenant namespace. A `UserStore`
//! is derived per request from the shared pool and the namespace path
//! segment; nothing namespace-related is cached or mutated across requests.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::fmt;
use std::str::FromStr;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::{AuthError, Fingerprint};

const MAX_NAMESPACE_LEN: usize = 64;

/// Validated tenant partition name, parsed from the request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace(String);

impl Namespace {
    /// Lowercase and validate a namespace segment (`[a-z0-9_-]{1,64}`).
    ///
    /// # Errors
    /// `AuthError::MalformedRequest` when the segment is empty, too long, or
    /// carries characters outside the allowed set.
    pub fn parse(segment: &str) -> Result<Self, AuthError> {
        let normalized = segment.trim().to_lowercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_NAMESPACE_LEN
            && normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(normalized))
        } else {
            Err(AuthError::MalformedRequest)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account role; exact equality, no hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(AuthError::MalformedRequest),
        }
    }
}

/// The active session bound to a user record, replaced atomically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSession {
    pub refresh_token: String,
    pub fingerprint: Fingerprint,
}

/// Identity record owned by the store.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub session: Option<StoredSession>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize a username for storage and lookup.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

const USER_COLUMNS: &str = "id, username, password_hash, role, refresh_token, \
     device_ip, device_user_agent, created_at, updated_at";

/// Request-scoped handle: shared pool plus one namespace.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
    namespace: Namespace,
}

impl UserStore {
    #[must_use]
    pub fn new(pool: PgPool, namespace: Namespace) -> Self {
        Self { pool, namespace }
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Insert a new user with the non-privileged default role.
    ///
    /// # Errors
    /// `AuthError::UsernameTaken` when the normalized username already exists
    /// in this namespace, `AuthError::Store` on backend failure.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let query = format!(
            "INSERT INTO users (namespace, username, password_hash) \
             VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.namespace = %self.namespace
        );
        let row = sqlx::query(&query)
            .bind(self.namespace.as_str())
            .bind(normalize_username(username))
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AuthError::UsernameTaken
                } else {
                    AuthError::Store(err)
                }
            })?;

        user_from_row(&row)
    }

    /// # Errors
    /// `AuthError::Store` on backend failure.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE namespace = $1 AND username = $2");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.namespace = %self.namespace
        );
        let row = sqlx::query(&query)
            .bind(self.namespace.as_str())
            .bind(normalize_username(username))
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// List users in this namespace, oldest first.
    ///
    /// # Errors
    /// `AuthError::Store` on backend failure.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, AuthError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE namespace = $1 \
             ORDER BY created_at OFFSET $2 LIMIT $3"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.namespace = %self.namespace
        );
        let rows = sqlx::query(&query)
            .bind(self.namespace.as_str())
            .bind(skip.max(0))
            .bind(limit.clamp(0, 1000))
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Replace the stored session. Refresh token and fingerprint are written
    /// in one statement so the record is never half-rotated.
    ///
    /// # Errors
    /// `AuthError::Store` on backend failure.
    pub async fn set_session(
        &self,
        id: Uuid,
        refresh_token: &str,
        fingerprint: &Fingerprint,
    ) -> Result<(), AuthError> {
        let query = "UPDATE users SET refresh_token = $3, device_ip = $4, \
             device_user_agent = $5, updated_at = NOW() \
             WHERE namespace = $1 AND id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.namespace = %self.namespace
        );
        sqlx::query(query)
            .bind(self.namespace.as_str())
            .bind(id)
            .bind(refresh_token)
            .bind(&fingerprint.ip)
            .bind(&fingerprint.user_agent)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        Ok(())
    }

    /// Drop the stored session; outstanding refresh tokens stop matching.
    ///
    /// # Errors
    /// `AuthError::Store` on backend failure.
    pub async fn clear_session(&self, id: Uuid) -> Result<(), AuthError> {
        let query = "UPDATE users SET refresh_token = NULL, device_ip = NULL, \
             device_user_agent = NULL, updated_at = NOW() \
             WHERE namespace = $1 AND id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.namespace = %self.namespace
        );
        sqlx::query(query)
            .bind(self.namespace.as_str())
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        Ok(())
    }

    /// Assign a role, returning the updated record or `None` if the target
    /// does not exist in this namespace.
    ///
    /// # Errors
    /// `AuthError::Store` on backend failure.
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AuthError> {
        let query = format!(
            "UPDATE users SET role = $3, updated_at = NOW() \
             WHERE namespace = $1 AND id = $2 RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.namespace = %self.namespace
        );
        let row = sqlx::query(&query)
            .bind(self.namespace.as_str())
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<User, AuthError> {
    let role: String = row.get("role");
    let role = Role::from_str(&role)
        .map_err(|_| AuthError::Store(sqlx::Error::Decode(format!("unknown role: {role}").into())))?;

    let refresh_token: Option<String> = row.get("refresh_token");
    let device_ip: Option<String> = row.get("device_ip");
    let device_user_agent: Option<String> = row.get("device_user_agent");
    // All three fields are written together; a partially present session is
    // treated as absent.
    let session = match (refresh_token, device_ip, device_user_agent) {
        (Some(refresh_token), Some(ip), Some(user_agent)) => Some(StoredSession {
            refresh_token,
            fingerprint: Fingerprint::new(ip, user_agent),
        }),
        _ => None,
    };

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role,
        session,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn namespace_accepts_valid_segments() {
        let ns = Namespace::parse("acme").expect("namespace");
        assert_eq!(ns.as_str(), "acme");
        let ns = Namespace::parse("Acme-01_test ").expect("namespace");
        assert_eq!(ns.as_str(), "acme-01_test");
    }

    #[test]
    fn namespace_rejects_invalid_segments() {
        assert!(Namespace::parse("").is_err());
        assert!(Namespace::parse("  ").is_err());
        assert!(Namespace::parse("has space").is_err());
        assert!(Namespace::parse("dot.ted").is_err());
        assert!(Namespace::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn username_normalization() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::from_str("user").ok(), Some(Role::User));
        assert_eq!(Role::from_str("admin").ok(), Some(Role::Admin));
        assert!(Role::from_str("root").is_err());
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(
            serde_json::to_string(&Role::Admin).expect("serialize"),
            "\"admin\""
        );
    }
}
