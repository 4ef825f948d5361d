//! Session cookie policy.
//!
//! A session lives entirely in two cookies:
//! - `IDHUB_JWT`: the signed token, HttpOnly
//! - `IDHUB_IDENTITY`: the claimed address for display, readable by scripts
//!
//! Both are built from one [`Session`] (or one teardown call), so they always
//! share path, flags and expiry.

use axum::http::{header::InvalidHeaderValue, header::SET_COOKIE, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

pub const TOKEN_COOKIE: &str = "IDHUB_JWT";
pub const IDENTITY_COOKIE: &str = "IDHUB_IDENTITY";

const COOKIE_PATH: &str = "/";

/// An authenticated session: one token, one identity, one expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: String,
    pub expires_at: DateTime<Utc>,
}

/// Attributes shared by every cookie the service emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Add the `Secure` attribute (HTTPS-only deployments).
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// `Set-Cookie` values that establish `session`, token cookie first.
    pub fn establish(&self, session: &Session) -> [String; 2] {
        let expires = format!("Expires={}", http_date(&session.expires_at));
        [
            self.render(TOKEN_COOKIE, &session.token, &expires, true),
            self.render(IDENTITY_COOKIE, &session.identity, &expires, false),
        ]
    }

    /// `Set-Cookie` values that expire both cookies immediately.
    ///
    /// Path and HttpOnly match [`CookiePolicy::establish`]; clients only drop
    /// a cookie when the clearing directive matches the original.
    pub fn teardown(&self) -> [String; 2] {
        [
            self.render(TOKEN_COOKIE, "", "Max-Age=0", true),
            self.render(IDENTITY_COOKIE, "", "Max-Age=0", false),
        ]
    }

    /// Append the establishing directives to `headers`.
    ///
    /// Both directives are appended or neither is; on error `headers` is
    /// left untouched and the caller should tear the session down instead.
    pub fn apply_establish(
        &self,
        headers: &mut HeaderMap,
        session: &Session,
    ) -> Result<(), InvalidHeaderValue> {
        append_pair(headers, self.establish(session))
    }

    /// Append the teardown directives to `headers`.
    pub fn apply_teardown(&self, headers: &mut HeaderMap) {
        if let Err(e) = append_pair(headers, self.teardown()) {
            tracing::error!(error = %e, "Unrepresentable teardown Set-Cookie value");
        }
    }

    fn render(&self, name: &str, value: &str, lifetime: &str, http_only: bool) -> String {
        let mut parts = vec![
            format!("{}={}", name, sanitize(value)),
            format!("Path={}", COOKIE_PATH),
            lifetime.to_string(),
        ];
        if http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }
}

/// Read a cookie value from a request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn append_pair(headers: &mut HeaderMap, cookies: [String; 2]) -> Result<(), InvalidHeaderValue> {
    let [first, second] = cookies;
    let first = HeaderValue::from_str(&first)?;
    let second = HeaderValue::from_str(&second)?;

    headers.append(SET_COOKIE, first);
    headers.append(SET_COOKIE, second);
    Ok(())
}

/// RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(at: &DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// Cookie values never carry separators or control characters
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, ';' | ',' | ' ' | '"' | '\\'))
        .collect()
}
