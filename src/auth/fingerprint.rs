//! Device fingerprint: originating IP plus raw User-Agent string.
//!
//! Sessions are bound to the fingerprint presented at login; any change in
//! either component invalidates the refresh flow.

use axum::http::{header::USER_AGENT, HeaderMap};

const UNKNOWN: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub ip: String,
    pub user_agent: String,
}

impl Fingerprint {
    #[must_use]
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Derive the fingerprint from request headers.
    ///
    /// The client IP comes from `x-forwarded-for` (first hop) or
    /// `x-real-ip`; the User-Agent is compared verbatim, so a client update
    /// that changes the string ends the session.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = client_ip(headers).unwrap_or_else(|| UNKNOWN.to_string());
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(UNKNOWN)
            .to_string();
        Self { ip, user_agent }
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let fingerprint = Fingerprint::from_headers(&headers);
        assert_eq!(fingerprint.ip, "1.2.3.4");
        assert_eq!(fingerprint.user_agent, "curl/8.0");
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(Fingerprint::from_headers(&headers).ip, "9.9.9.9");

        let headers = HeaderMap::new();
        let fingerprint = Fingerprint::from_headers(&headers);
        assert_eq!(fingerprint.ip, "unknown");
        assert_eq!(fingerprint.user_agent, "unknown");
    }

    #[test]
    fn equality_is_exact() {
        let first = Fingerprint::new("1.2.3.4", "curl/8.0");
        let same = Fingerprint::new("1.2.3.4", "curl/8.0");
        let other_ip = Fingerprint::new("1.2.3.5", "curl/8.0");
        let other_agent = Fingerprint::new("1.2.3.4", "curl/8.1");
        assert_eq!(first, same);
        assert_ne!(first, other_ip);
        assert_ne!(first, other_agent);
    }
}
