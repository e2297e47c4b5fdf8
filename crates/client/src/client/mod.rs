//! Campus API client
//!
//! [`CampusClient::send`] attaches the session's bearer token to every call
//! and recovers from an expired access token: on a 401 it joins (or starts)
//! the single in-flight refresh exchange and replays the request once with
//! the renewed token. Anything it cannot recover from is returned as is.

pub mod admin;
pub mod auth;
pub mod food;
pub mod hostel;
pub mod suggestion;

use crate::config::{ClientConfig, DEFAULT_REFRESH_TIMEOUT};
use crate::error::{ApiError, error_message};
use crate::refresh::{RefreshCoordinator, RefreshFailure, exchange_refresh_token};
use crate::request::{ApiRequest, RecoveryAction, RequestBody, recovery_action};
use crate::session::{MemorySessionStore, Session, SessionStore};
use futures::FutureExt;
use reqwest::{Client, ClientBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Campus API client; clones share the session and the refresh slot
#[derive(Clone)]
pub struct CampusClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    refresh: Arc<RefreshCoordinator>,
    refresh_timeout: Duration,
}

impl CampusClient {
    /// Create a new client with an empty in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> CampusClientBuilder {
        CampusClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The injected session store
    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.session()
    }

    /// Send a request, renewing the access token once if the server answers 401.
    ///
    /// Non-401 responses are returned untouched whatever their status. A 401
    /// is returned untouched when it comes from a replay or from the refresh
    /// endpoint itself. When no refresh token is held, or the refresh exchange
    /// fails, the session is cleared and [`ApiError::AuthExpired`] returned;
    /// a 401 to a request sent without any token is returned as is.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let sent_with = request.bearer(&self.session.session()).map(str::to_string);
        let response = self.dispatch(&request, sent_with.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        match recovery_action(&request, &self.session.session(), sent_with.as_deref()) {
            RecoveryAction::Propagate => Ok(response),
            RecoveryAction::Logout => {
                self.session.logout();
                // Nothing expired when no credential was presented, e.g. a failed login
                if sent_with.is_none() {
                    debug!(path = %request.path, "Unauthorized anonymous request");
                    return Ok(response);
                }
                let body = response.text().await.unwrap_or_default();
                warn!(path = %request.path, "Unauthorized without a refresh token, clearing session");
                Err(ApiError::AuthExpired(error_message(StatusCode::UNAUTHORIZED, &body)))
            }
            RecoveryAction::RetryWith(access_token) => {
                debug!(path = %request.path, "Access token already renewed, replaying");
                self.replay(&request, access_token).await
            }
            RecoveryAction::Refresh(refresh_token) => {
                let (exchange, started) = self.refresh.join_or_start(|| {
                    exchange_refresh_token(
                        self.http.clone(),
                        self.base_url.clone(),
                        refresh_token,
                        self.refresh_timeout,
                        Arc::clone(&self.session),
                    )
                    .boxed()
                });
                if !started {
                    debug!(path = %request.path, "Joining in-flight token refresh");
                }

                match exchange.await {
                    Ok(access_token) => self.replay(&request, access_token).await,
                    Err(RefreshFailure(reason)) => {
                        warn!(path = %request.path, %reason, "Session expired, clearing session");
                        self.session.logout();
                        Err(ApiError::AuthExpired(reason))
                    }
                }
            }
        }
    }

    /// Send a request and decode a JSON response body
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let body = Self::success_body(self.send(request).await?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose response body is irrelevant
    pub async fn request_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        Self::success_body(self.send(request).await?).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request_empty(ApiRequest::delete(path)).await
    }

    /// Resend once with a renewed token. A 401 here goes back to the caller:
    /// a replayed request never triggers another refresh.
    async fn replay(&self, request: &ApiRequest, access_token: String) -> Result<Response, ApiError> {
        let retry = request.retry(access_token);
        let session = self.session.session();
        self.dispatch(&retry, retry.bearer(&session)).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(ApiRequest::multipart_form(parts)?),
        };

        debug!(
            method = %request.method,
            path = %request.path,
            retry = request.is_retry(),
            "Sending request"
        );
        Ok(builder.send().await?)
    }

    async fn success_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

/// Builder for [`CampusClient`]
#[derive(Default)]
pub struct CampusClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<Arc<dyn SessionStore>>,
}

impl CampusClientBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::default()
            .base_url(config.base_url.clone())
            .refresh_timeout(config.refresh_timeout())
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        builder
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the timeout for ordinary requests
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the upper bound on a refresh exchange
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use this session store instead of a fresh in-memory one
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn build(self) -> Result<CampusClient, ApiError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::Configuration("base_url is required".into()))?;

        // Paths are appended verbatim, so drop any trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| ClientConfig::default().user_agent),
        );

        Ok(CampusClient {
            http: client_builder.build()?,
            base_url,
            session: self
                .session
                .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            refresh: Arc::new(RefreshCoordinator::new()),
            refresh_timeout: self.refresh_timeout.unwrap_or(DEFAULT_REFRESH_TIMEOUT),
        })
    }
}
