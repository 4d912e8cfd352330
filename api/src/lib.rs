//! HTTP transport for the Redink writing-practice service.
//!
//! # Architecture
//!
//! One [`ApiClient`] per process. It owns a connection-pooled
//! [`reqwest::Client`], the server base URL, and the current [`Session`]
//! (session cookie plus CSRF token, captured at login). Endpoint methods are
//! grouped by resource:
//!
//! | Module | Endpoints |
//! |--------|-----------|
//! | [`auth`] | signup, login, logout, me |
//! | [`writings`] | list, get, create, update, delete |
//! | [`analysis`] | submit for analysis, fetch analysis status |
//!
//! Every method performs exactly one HTTP round trip and classifies failures
//! into [`ApiError`]. Retry and backoff policy belongs to callers - the
//! polling scheduler in particular owns all timing decisions, which keeps
//! these calls trivially testable in isolation.
//!
//! # Authentication
//!
//! The server issues two cookies at login: `token` (the HttpOnly session)
//! and `csrf_token`. It double-submit-checks CSRF on every non-GET request,
//! so the client replays both cookies verbatim and mirrors the CSRF token
//! into the `X-CSRF-Token` header on mutating calls.

pub mod analysis;
pub mod auth;
mod error;
pub mod writings;

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

pub use error::{ApiError, ErrorBody, ErrorCode};

/// Default server base, matching the development API server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;

/// Error bodies larger than this are truncated before decoding.
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Session cookie issued at login.
const SESSION_COOKIE: &str = "token";
/// CSRF double-submit cookie.
const CSRF_COOKIE: &str = "csrf_token";
/// Header mirroring the CSRF cookie on mutating requests.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Authenticated session state captured at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Value of the `token` cookie. Opaque to the client.
    pub token: String,
    /// CSRF token, sent back both as a cookie and as a header.
    pub csrf_token: String,
}

impl fmt::Debug for Session {
    // Session tokens must not end up in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("csrf_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{raw}': {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Option<Session>>,
}

impl ApiClient {
    /// Build a client against the given base URL (no trailing slash
    /// required). Fails on an unparsable URL or if TLS setup fails.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
            raw: base_url.to_owned(),
            source: e,
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: trimmed.to_owned(),
            session: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().expect("session lock poisoned").clone()
    }

    /// Install a session (restored from disk, or captured at login).
    pub fn set_session(&self, session: Session) {
        *self.session.write().expect("session lock poisoned") = Some(session);
    }

    pub fn clear_session(&self) {
        *self.session.write().expect("session lock poisoned") = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.read().expect("session lock poisoned").is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach the session cookie pair, and the CSRF header for mutating
    /// requests. Requests without a session go out bare; the server answers
    /// 401 and the caller classifies it.
    fn with_session(&self, builder: RequestBuilder, mutating: bool) -> RequestBuilder {
        let Some(session) = self.session() else {
            return builder;
        };
        let cookie = format!(
            "{SESSION_COOKIE}={}; {CSRF_COOKIE}={}",
            session.token, session.csrf_token
        );
        let builder = builder.header(COOKIE, cookie);
        if mutating {
            builder.header(CSRF_HEADER, session.csrf_token)
        } else {
            builder
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.with_session(self.http.get(self.endpoint(path)), false)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.with_session(self.http.post(self.endpoint(path)), true)
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.with_session(self.http.put(self.endpoint(path)), true)
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.with_session(self.http.delete(self.endpoint(path)), true)
    }

    /// Decode a success body as `T`, or classify the failure.
    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidBody(e.to_string()));
        }
        Err(Self::read_error(status, response).await)
    }

    /// Check for success on endpoints whose body we discard.
    pub(crate) async fn expect_success(response: Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::read_error(status, response).await)
    }

    pub(crate) async fn read_error(status: StatusCode, response: Response) -> ApiError {
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return ApiError::Http(e),
        };
        let truncated = &bytes[..bytes.len().min(MAX_ERROR_BODY_BYTES)];
        let body = serde_json::from_slice::<ErrorBody>(truncated).ok();
        if body.is_none() {
            tracing::debug!(status = %status, "error response body was not the uniform shape");
        }
        ApiError::classify(status, body)
    }
}

/// Extract a cookie's value from `Set-Cookie` response headers.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(SET_COOKIE) {
        if let Ok(raw) = value.to_str()
            && let Some(rest) = raw.strip_prefix(name)
            && let Some(rest) = rest.strip_prefix('=')
        {
            let end = rest.find(';').unwrap_or(rest.len());
            return Some(rest[..end].to_owned());
        }
    }
    None
}
