//! API client shared by every CareHub domain service.
//!
//! This module provides the `ApiClient` struct. Services hand it a path and
//! a payload; it decorates the request, performs the exchange and returns
//! either the decoded body or a classified `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::classifier::{Failure, ResponseClassifier};
use super::error::{ApiError, ErrorKind};
use super::headers::DefaultHeaders;
use super::interceptor::{self, MultipartPayload, RequestBody, RequestContext};
use super::observer::{NoopObserver, SessionObserver};
use crate::config::ClientConfig;
use crate::session::{CookieJar, KeyValueStore, MemoryStore, SessionScope, SessionStore};

/// API client for the CareHub backend.
/// Clone is cheap: the HTTP client, session store and cached default
/// headers are shared between clones.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    headers: Arc<DefaultHeaders>,
    session: Arc<SessionStore>,
    classifier: Arc<ResponseClassifier>,
    cookie_host: Option<String>,
    scope: SessionScope,
    timeout: Option<Duration>,
}

/// Assembles the client together with the session store it shares its
/// cached headers with.
pub struct ApiClientBuilder {
    config: ClientConfig,
    primary: Option<Arc<dyn KeyValueStore>>,
    mirror: Option<Arc<dyn KeyValueStore>>,
    cookies: Option<Arc<CookieJar>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl ApiClientBuilder {
    /// Durable store for the session. Defaults to an in-memory store.
    pub fn primary_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.primary = Some(store);
        self
    }

    pub fn mirror_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.mirror = Some(store);
        self
    }

    pub fn cookie_jar(mut self, cookies: Arc<CookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let config = self.config;
        reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let cookie_host = config.cookie_host();
        let headers = Arc::new(DefaultHeaders::with_headers(config.default_headers.clone()));
        let session = Arc::new(SessionStore::new(
            self.primary
                .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>),
            self.mirror
                .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>),
            self.cookies.unwrap_or_default(),
            headers.clone(),
            cookie_host.clone(),
        ));
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(NoopObserver) as Arc<dyn SessionObserver>);
        let classifier = Arc::new(ResponseClassifier::new(
            session.clone(),
            observer,
            config.login_path.clone(),
            config.superuser_prefix.clone(),
        ));

        Ok(ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            session,
            classifier,
            cookie_host,
            scope: SessionScope::Primary,
            timeout: None,
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            primary: None,
            mirror: None,
            cookies: None,
            observer: None,
        }
    }

    /// Client with in-memory session storage and no host observer.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Same client, authenticating with the given session scope's token.
    pub fn for_scope(&self, scope: SessionScope) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    /// Same client with a per-call timeout overriding the configured one.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self.clone()
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    /// Cache the bearer token as a default header for this client.
    pub fn set_auth_header(&self, token: &str) -> Result<(), ApiError> {
        self.headers
            .set_bearer(token)
            .map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))
    }

    pub fn clear_auth_header(&self) -> bool {
        self.headers.clear_authorization()
    }

    /// Join a path onto the base URL. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Self::json_body(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Self::json_body(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, path, Self::json_body(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, RequestBody::Empty).await
    }

    /// POST a multipart payload (images, documents).
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: MultipartPayload,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, RequestBody::Multipart(payload))
            .await
    }

    fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<RequestBody, ApiError> {
        RequestBody::json(body).map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))
    }

    // ===== Exchange =====

    /// Issue one request. Every failure is classified exactly once and
    /// returned; nothing is retried.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let mut ctx = RequestContext::new(method, self.url_for(path), body);
        ctx.headers = self.headers.snapshot();
        if self.scope != SessionScope::Primary {
            // The cached header belongs to the primary login.
            ctx.headers.remove(AUTHORIZATION);
        }
        let session = self.session.get_scoped(self.scope);
        let ctx = interceptor::decorate(ctx, session.as_ref());

        let url = ctx.url.clone();
        let request = self.build_request(ctx)?;

        let response = request
            .send()
            .await
            .map_err(|e| self.classifier.classify(Failure::from_reqwest(e), self.scope))?;

        let status = response.status();
        if let Some(ref host) = self.cookie_host {
            self.session.cookies().absorb(host, response.headers());
        }

        let text = response.text().await.map_err(|e| {
            self.classifier
                .classify(Failure::from_body_read(status, e), self.scope)
        })?;
        debug!(url = %url, status = status.as_u16(), bytes = text.len(), "Response received");

        let text = self.classifier.check(status, text, self.scope)?;
        Self::decode(&text)
    }

    fn build_request(&self, ctx: RequestContext) -> Result<RequestBuilder, ApiError> {
        let mut headers: HeaderMap = ctx.headers;
        if let Some(cookie) = self
            .cookie_host
            .as_deref()
            .and_then(|host| self.session.cookies().header_for(host))
        {
            headers.insert(COOKIE, cookie);
        }

        let mut builder = self.http.request(ctx.method, &ctx.url).headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match ctx.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(payload) => {
                let form = payload
                    .into_form()
                    .map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))?;
                builder.multipart(form)
            }
        };
        Ok(builder)
    }

    /// Empty bodies decode as JSON `null`, non-JSON text as a JSON string.
    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
        let value = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
        };
        serde_json::from_value(value).map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))
    }
}
