//! HTTP transport boundary.
//!
//! The dispatch engine only ever talks to a [`Transport`]; [`HttpTransport`]
//! is the production implementation over `reqwest`, with optional basic
//! auth and request rate limiting.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::error::{CoreError, RpcError};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request and returns the raw response.
///
/// Implementations report connection-level failures only; status codes
/// and bodies are interpreted by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RpcError>;
}

/// `reqwest`-backed [`Transport`].
pub struct HttpTransport {
    client: reqwest::Client,
    auth: Option<(String, String)>,
    limiter: Option<DirectRateLimiter>,
}

impl HttpTransport {
    /// Create a transport.
    ///
    /// `user` and `pass` must be given together or not at all. If
    /// `requests_per_second` is set, every outbound HTTP request (a batch
    /// counts as one) waits for the limiter first. `timeout` bounds each
    /// whole request; connection setup is bounded separately.
    pub fn new(
        user: Option<&str>,
        pass: Option<&str>,
        requests_per_second: Option<u32>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let auth = resolve_auth(user, pass)?;

        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(RpcError::Transport)?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            auth,
            limiter,
        })
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RpcError> {
        self.wait_for_rate_limit().await;

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

// ==============================================================================
// Connection Settings
// ==============================================================================

pub(crate) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
) -> Result<Option<(String, String)>, CoreError> {
    match (user, pass) {
        (Some(u), Some(p)) => Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => Err(CoreError::Config(
            "both rpc user and rpc pass must be set together".to_owned(),
        )),
        (None, None) => Ok(None),
    }
}

/// Validate an endpoint URL; only `http` and `https` are supported.
pub fn parse_connection(connection: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::Config(format!(
            "invalid connection `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CoreError::Config(format!(
            "unsupported connection scheme `{other}`; expected http or https"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_connection_http_url() {
        let parsed = parse_connection("http://127.0.0.1:8545").expect("should parse");
        assert_eq!(parsed.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn parse_connection_keeps_path() {
        let parsed = parse_connection("https://mainnet.example.org/v3/key").expect("should parse");
        assert_eq!(parsed.path(), "/v3/key");
    }

    #[test]
    fn parse_connection_invalid_scheme() {
        let err = parse_connection("ws://127.0.0.1:8546").expect_err("must reject websockets");
        assert!(err.to_string().contains("unsupported connection scheme"));
    }

    #[test]
    fn parse_connection_rejects_garbage() {
        let err = parse_connection("127.0.0.1:8545").expect_err("must reject bare host");
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn resolve_auth_rejects_partial_credentials() {
        let err = resolve_auth(Some("user"), None).expect_err("must reject partial auth");
        assert!(err.to_string().contains("must be set together"));
        assert!(resolve_auth(None, Some("pass")).is_err());
    }

    #[test]
    fn resolve_auth_accepts_user_and_pass() {
        let auth = resolve_auth(Some("alice"), Some("secret")).expect("auth must parse");
        assert_eq!(auth, Some(("alice".to_owned(), "secret".to_owned())));
        assert_eq!(resolve_auth(None, None).expect("no auth"), None);
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let err = HttpTransport::new(None, None, Some(0), DEFAULT_REQUEST_TIMEOUT)
            .err()
            .expect("zero rps must fail");
        assert!(err.to_string().contains("requests_per_second"));
    }

    #[test]
    fn success_status_range() {
        let ok = HttpResponse {
            status: 200,
            body: String::new(),
        };
        let bad = HttpResponse {
            status: 502,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
