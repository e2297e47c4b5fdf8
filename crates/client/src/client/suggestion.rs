//! User suggestions

use super::CampusClient;
use crate::error::ApiError;
use crate::types::{CreateSuggestionRequest, Suggestion};

impl CampusClient {
    pub async fn create_suggestion(
        &self,
        request: &CreateSuggestionRequest,
    ) -> Result<Suggestion, ApiError> {
        self.post("/api/suggestion/suggestions", request).await
    }

    /// Suggestions submitted by the signed-in user
    pub async fn my_suggestions(&self) -> Result<Vec<Suggestion>, ApiError> {
        self.get("/api/suggestion/suggestions/my").await
    }
}
