//! Authentication endpoints

use super::CampusClient;
use crate::error::ApiError;
use crate::request::{ApiRequest, REFRESH_PATH};
use crate::types::{AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, SignupRequest, User};
use tracing::{info, warn};

impl CampusClient {
    /// Sign in and install the returned user and tokens into the session
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.post("/api/auth/login", credentials).await?;
        self.session.set_auth(
            auth.user.clone(),
            auth.access_token.clone(),
            auth.refresh_token.clone(),
        );
        info!(user_id = auth.user.user_id, "Signed in");
        Ok(auth)
    }

    /// Register a new account; it stays pending until an admin approves it
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        self.request_empty(ApiRequest::post("/api/auth/register").json(request)?)
            .await
    }

    /// Sign out server-side, then clear the local session regardless
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .request_empty(ApiRequest::post("/api/auth/logout"))
            .await;
        if let Err(err) = &result {
            warn!(error = %err, "Server-side logout failed");
        }
        self.session.logout();
        info!("Signed out");
        result
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/api/auth/me").await
    }

    /// Call the refresh endpoint directly; a 401 here is never recovered
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        self.post(
            REFRESH_PATH,
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )
        .await
    }
}
