//! Request authentication middleware.
//!
//! Runs before every handler. Pulls the access token out of the bearer
//! header or the access-token cookie, unwraps the transport envelope, and
//! verifies the signature. A verified claim lands in request extensions; a
//! missing carrier leaves the request anonymous so public routes share the
//! same pass.

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::{token::Claims, AuthError, AuthState};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Claims attached by the middleware; `None` for anonymous requests.
#[derive(Clone, Debug, Default)]
pub struct RequestClaims(pub Option<Claims>);

pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_claims(&state, request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(RequestClaims(claims));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Resolve the token carrier into verified claims.
///
/// An un-openable envelope value passes through to signature verification
/// unchanged, collapsing corrupt-envelope and bad-signature into one
/// "invalid token" outcome.
fn resolve_claims(state: &AuthState, headers: &HeaderMap) -> Result<Option<Claims>, AuthError> {
    let Some(raw) = extract_carrier(headers)? else {
        return Ok(None);
    };

    let token = state.envelope().open(&raw).unwrap_or(raw);
    if token.split('.').count() != 3 {
        return Err(AuthError::TokenInvalid);
    }

    let claims = state.tokens().access.verify(&token)?;
    Ok(Some(claims))
}

/// Pick the token carrier: bearer header first, access cookie second.
///
/// # Errors
/// `AuthError::MalformedRequest` for an unparsable header or a scheme other
/// than "bearer".
fn extract_carrier(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::MalformedRequest)?;
        let mut parts = value.split_whitespace();
        let scheme = parts.next().ok_or(AuthError::MalformedRequest)?;
        let token = parts.next().ok_or(AuthError::MalformedRequest)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedRequest);
        }
        return Ok(Some(token.to_string()));
    }

    Ok(cookie_value(headers, ACCESS_TOKEN_COOKIE))
}

/// Read a single cookie value from the Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{token::Signer, AuthConfig};
    use axum::http::HeaderValue;
    use base64ct::{Base64, Encoding};
    use secrecy::SecretString;

    fn state() -> AuthState {
        let config = AuthConfig::new(
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
            SecretString::from(Base64::encode_string(&[3u8; 32])),
        );
        AuthState::from_config(&config).expect("state")
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {value}")).expect("header"),
        );
        headers
    }

    #[test]
    fn anonymous_when_no_carrier() {
        let state = state();
        let claims = resolve_claims(&state, &HeaderMap::new()).expect("resolve");
        assert!(claims.is_none());
    }

    #[test]
    fn sealed_bearer_token_verifies() {
        let state = state();
        let token = state.tokens().access.sign("alice").expect("sign");
        let sealed = state.envelope().seal(&token).expect("seal");

        let claims = resolve_claims(&state, &bearer(&sealed))
            .expect("resolve")
            .expect("claims");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn plain_bearer_token_passes_through_the_envelope() {
        let state = state();
        let token = state.tokens().access.sign("alice").expect("sign");

        let claims = resolve_claims(&state, &bearer(&token))
            .expect("resolve")
            .expect("claims");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn sealed_cookie_token_verifies() {
        let state = state();
        let token = state.tokens().access.sign("alice").expect("sign");
        let sealed = state.envelope().seal(&token).expect("seal");

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("other=1; access_token={sealed}")).expect("header"),
        );

        let claims = resolve_claims(&state, &headers)
            .expect("resolve")
            .expect("claims");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn bearer_takes_priority_over_cookie() {
        let state = state();
        let alice = state.tokens().access.sign("alice").expect("sign");
        let bob = state.tokens().access.sign("bob").expect("sign");

        let mut headers = bearer(&state.envelope().seal(&alice).expect("seal"));
        let sealed_bob = state.envelope().seal(&bob).expect("seal");
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("access_token={sealed_bob}")).expect("header"),
        );

        let claims = resolve_claims(&state, &headers)
            .expect("resolve")
            .expect("claims");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn non_bearer_scheme_is_a_bad_request() {
        let state = state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw"));
        assert!(matches!(
            resolve_claims(&state, &headers),
            Err(AuthError::MalformedRequest)
        ));
    }

    #[test]
    fn header_without_token_is_a_bad_request() {
        let state = state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(matches!(
            resolve_claims(&state, &headers),
            Err(AuthError::MalformedRequest)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let state = state();
        assert!(matches!(
            resolve_claims(&state, &bearer("garbage")),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn expired_token_is_reported_expired() {
        let state = state();
        let expired = Signer::new(b"access-secret", -10).sign("alice").expect("sign");
        let sealed = state.envelope().seal(&expired).expect("seal");
        assert!(matches!(
            resolve_claims(&state, &bearer(&sealed)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn foreign_key_token_is_invalid() {
        let state = state();
        let other = Signer::new(b"other-secret", 900).sign("alice").expect("sign");
        assert!(matches!(
            resolve_claims(&state, &bearer(&other)),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn cookie_value_parses_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; refresh_token=xyz; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, REFRESH_TOKEN_COOKIE),
            Some("xyz".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
