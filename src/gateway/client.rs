use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::errors::{normalize_error, parse_success};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::identity::SharedSession;

/// Header carrying the subject identifier on every call made with a session.
pub const SUBJECT_HEADER: &str = "x-user-id";

/// Outbound HTTP to the backend gateway.
///
/// Credentials are read from the shared session at the moment a request is
/// built, so a login or logout is visible to the very next call. No retries and
/// no caching: each call is one round trip.
#[derive(Clone)]
pub struct GatewayClient {
    base: String,
    http: reqwest::Client,
    session: SharedSession,
}

impl GatewayClient {
    pub fn new(config: &ClientConfig, session: SharedSession) -> ClientResult<Self> {
        let parsed = Url::parse(config.api_base.trim()).map_err(|e| {
            ClientError::validation("api_base", format!("invalid gateway URL '{}': {}", config.api_base, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::validation(
                "api_base",
                format!("gateway URL must be http or https, got '{}'", parsed.scheme()),
            ));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(t) = config.timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().map_err(|e| ClientError::transport(e.to_string()))?;
        Ok(Self { base: parsed.as_str().trim_end_matches('/').to_string(), http, session })
    }

    pub fn base(&self) -> &str { &self.base }

    pub fn session(&self) -> &SharedSession { &self.session }

    /// Resolve an absolute API path (`/api/...`, query string allowed) against the base,
    /// keeping any path prefix the base carries.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        if !path.starts_with('/') {
            return Err(ClientError::validation("path", format!("API path must start with '/': {}", path)));
        }
        Url::parse(&format!("{}{}", self.base, path))
            .map_err(|e| ClientError::validation("path", format!("invalid API path '{}': {}", path, e)))
    }

    /// `Authorization` and subject headers for the current session; empty when signed out.
    pub fn credential_headers(&self) -> ClientResult<HeaderMap> {
        let session = self.session.read().snapshot();
        let mut headers = HeaderMap::new();
        if let Some(token) = session.credential() {
            let mut v = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::session("Stored credential is not a valid header value"))?;
            v.set_sensitive(true);
            headers.insert(AUTHORIZATION, v);
        }
        if let Some(uid) = session.subject_id() {
            let v = HeaderValue::from_str(uid)
                .map_err(|_| ClientError::session("Stored subject identifier is not a valid header value"))?;
            headers.insert(SUBJECT_HEADER, v);
        }
        Ok(headers)
    }

    /// Issue one JSON request and return the body as-is.
    pub async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        let url = self.url(path)?;
        let mut rb = self.http.request(method.clone(), url).headers(self.credential_headers()?);
        if let Some(b) = body {
            rb = rb.json(b);
        }
        self.send(&method, path, rb).await
    }

    /// Multipart POST. The content type is left to the transport so the
    /// boundary parameter is generated with the body.
    pub async fn upload(&self, path: &str, form: Form) -> ClientResult<Value> {
        let url = self.url(path)?;
        let rb = self.http.post(url).headers(self.credential_headers()?).multipart(form);
        self.send(&Method::POST, path, rb).await
    }

    async fn send(&self, method: &Method, path: &str, rb: RequestBuilder) -> ClientResult<Value> {
        // query strings may carry phone numbers or push tokens
        let route = path.split('?').next().unwrap_or(path);
        let started = Instant::now();
        let resp = match rb.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "tunfin::gateway", %method, path = route, error = %e, "no response");
                return Err(ClientError::transport(e.to_string()));
            }
        };
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            warn!(target: "tunfin::gateway", %method, path = route, error = %e, "reading response body failed");
            ClientError::transport(e.to_string())
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !status.is_success() {
            let err = normalize_error(status, &bytes);
            info!(
                target: "tunfin::gateway",
                %method, path = route, status = status.as_u16(), elapsed_ms,
                message = err.message(),
                "call failed"
            );
            return Err(err);
        }
        debug!(target: "tunfin::gateway", %method, path = route, status = status.as_u16(), elapsed_ms, bytes = bytes.len(), "call ok");
        Ok(parse_success(&bytes))
    }
}

pub fn decode<T: DeserializeOwned>(path: &str, v: Value) -> ClientResult<T> {
    let route = path.split('?').next().unwrap_or(path);
    serde_json::from_value(v).map_err(|e| ClientError::decode(format!("unexpected response from {}: {}", route, e)))
}
