//! Outbound request description and the authorization-failure policy

use crate::error::ApiError;
use crate::session::Session;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

/// Path of the token renewal endpoint
pub const REFRESH_PATH: &str = "/api/auth/refresh-token";

/// Which attempt of a logical request this is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Original,
    /// Single replay after a 401, carrying the renewed access token
    Retry { access_token: String },
}

/// A file sent as one part of a multipart body
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FilePart>),
}

/// Method, path, query and body of a call against the API base URL.
///
/// Kept as plain data so the one permitted replay can rebuild the transport
/// request from scratch.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub attempt: Attempt,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            attempt: Attempt::Original,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn files(mut self, parts: Vec<FilePart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn is_retry(&self) -> bool {
        matches!(self.attempt, Attempt::Retry { .. })
    }

    pub fn targets_refresh(&self) -> bool {
        self.path.trim_end_matches('/').ends_with(REFRESH_PATH)
    }

    /// The replay of this request with a renewed token
    pub fn retry(&self, access_token: String) -> Self {
        Self {
            attempt: Attempt::Retry { access_token },
            ..self.clone()
        }
    }

    /// Token to present on this attempt, if any
    pub(crate) fn bearer<'a>(&'a self, session: &'a Session) -> Option<&'a str> {
        match &self.attempt {
            Attempt::Retry { access_token } => Some(access_token),
            Attempt::Original => session.access_token.as_deref(),
        }
    }

    pub(crate) fn multipart_form(parts: &[FilePart]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for file in parts {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

/// What to do after a request came back 401
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Hand the 401 to the caller unchanged
    Propagate,
    /// No way to renew: clear the session and fail
    Logout,
    /// Session already holds a newer token than the one sent
    RetryWith(String),
    /// Renew with this refresh token, then replay once
    Refresh(String),
}

/// Decide how to recover from a 401 on `request`, which was sent with
/// `sent_with` while the session now reads `session`.
pub fn recovery_action(
    request: &ApiRequest,
    session: &Session,
    sent_with: Option<&str>,
) -> RecoveryAction {
    if request.is_retry() || request.targets_refresh() {
        return RecoveryAction::Propagate;
    }

    let Some(refresh_token) = session.refresh_token.clone() else {
        return RecoveryAction::Logout;
    };

    match session.access_token.as_deref() {
        Some(current) if sent_with.is_some_and(|sent| sent != current) => {
            RecoveryAction::RetryWith(current.to_string())
        }
        _ => RecoveryAction::Refresh(refresh_token),
    }
}
