//! Auth configuration and shared request state.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use super::{
    envelope::Envelope,
    token::{TokenSuite, DEFAULT_ACCESS_TTL_SECONDS, DEFAULT_REFRESH_TTL_SECONDS},
};

const DEFAULT_COOKIE_MAX_AGE_SECONDS: i64 = 900;

/// Auth settings collected from the CLI/environment.
#[derive(Clone)]
pub struct AuthConfig {
    access_secret: SecretString,
    refresh_secret: SecretString,
    envelope_key: SecretString,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    cookie_max_age_seconds: i64,
    cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        access_secret: SecretString,
        refresh_secret: SecretString,
        envelope_key: SecretString,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            envelope_key,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            cookie_max_age_seconds: DEFAULT_COOKIE_MAX_AGE_SECONDS,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_max_age_seconds(mut self, seconds: i64) -> Self {
        self.cookie_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub(crate) fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub(crate) fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"***")
            .field("refresh_secret", &"***")
            .field("envelope_key", &"***")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("cookie_max_age_seconds", &self.cookie_max_age_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// Refresh-cookie attributes shared by login, refresh, and logout.
#[derive(Clone, Copy, Debug)]
pub struct CookieConfig {
    pub max_age_seconds: i64,
    pub secure: bool,
}

/// Immutable per-process auth state handed to handlers and middleware.
pub struct AuthState {
    tokens: TokenSuite,
    envelope: Envelope,
    cookie: CookieConfig,
}

impl AuthState {
    /// Derive signing keys and the transport envelope from configuration.
    ///
    /// # Errors
    /// Returns an error if the envelope key is not a base64 encoded 32-byte
    /// value.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let envelope = Envelope::from_base64(config.envelope_key.expose_secret())
            .context("Invalid envelope key")?;
        let tokens = TokenSuite::new(
            config.access_secret.expose_secret().as_bytes(),
            config.refresh_secret.expose_secret().as_bytes(),
            config.access_ttl_seconds(),
            config.refresh_ttl_seconds(),
        );
        Ok(Self {
            tokens,
            envelope,
            cookie: CookieConfig {
                max_age_seconds: config.cookie_max_age_seconds,
                secure: config.cookie_secure,
            },
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenSuite {
        &self.tokens
    }

    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[must_use]
    pub const fn cookie(&self) -> &CookieConfig {
        &self.cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64ct::{Base64, Encoding};

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
            SecretString::from(Base64::encode_string(&[9u8; 32])),
        )
    }

    #[test]
    fn defaults_and_overrides() {
        let config = config();
        assert_eq!(config.access_ttl_seconds(), DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(config.refresh_ttl_seconds(), DEFAULT_REFRESH_TTL_SECONDS);
        assert_eq!(
            config.cookie_max_age_seconds,
            DEFAULT_COOKIE_MAX_AGE_SECONDS
        );
        assert!(!config.cookie_secure);

        let config = config
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_cookie_max_age_seconds(30)
            .with_cookie_secure(true);
        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert_eq!(config.cookie_max_age_seconds, 30);
        assert!(config.cookie_secure);
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("access-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn from_config_builds_working_state() {
        let state = AuthState::from_config(&config()).expect("state");
        let token = state.tokens().access.sign("alice").expect("sign");
        let sealed = state.envelope().seal(&token).expect("seal");
        let opened = state.envelope().open(&sealed).expect("open");
        let claims = state.tokens().access.verify(&opened).expect("verify");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn from_config_rejects_bad_envelope_key() {
        let config = AuthConfig::new(
            SecretString::from("a"),
            SecretString::from("b"),
            SecretString::from("too-short"),
        );
        assert!(AuthState::from_config(&config).is_err());
    }
}
