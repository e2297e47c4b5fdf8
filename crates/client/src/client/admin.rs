//! Admin moderation endpoints
//!
//! Users, food places, hostels and both category kinds share the same
//! pending/approve/reject shape, so they are addressed through a
//! [`ModerationQueue`].

use super::CampusClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{
    DashboardStats, FoodCategory, FoodPlace, Hostel, HostelCategory, PageRequest, PageResponse,
    RejectRequest, Suggestion, SuggestionCategory, User,
};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::info;

/// A kind of submission awaiting admin review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationQueue {
    Users,
    Foods,
    FoodCategories,
    Hostels,
    HostelCategories,
}

impl ModerationQueue {
    pub const ALL: [Self; 5] = [
        Self::Users,
        Self::Foods,
        Self::FoodCategories,
        Self::Hostels,
        Self::HostelCategories,
    ];

    const fn base_path(self) -> &'static str {
        match self {
            Self::Users => "/api/admin/users",
            Self::Foods => "/api/admin/foods",
            Self::FoodCategories => "/api/admin/foods/categories",
            Self::Hostels => "/api/admin/hostels",
            Self::HostelCategories => "/api/admin/hostels/categories",
        }
    }
}

impl fmt::Display for ModerationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Users => "users",
            Self::Foods => "food places",
            Self::FoodCategories => "food categories",
            Self::Hostels => "hostels",
            Self::HostelCategories => "hostel categories",
        })
    }
}

impl CampusClient {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get("/api/admin/dashboard/stats").await
    }

    /// Items waiting in `queue`, decoded as `T`
    pub async fn pending<T: DeserializeOwned>(
        &self,
        queue: ModerationQueue,
    ) -> Result<Vec<T>, ApiError> {
        self.get(&format!("{}/pending", queue.base_path())).await
    }

    pub async fn approve(&self, queue: ModerationQueue, id: i64) -> Result<(), ApiError> {
        self.request_empty(ApiRequest::post(format!(
            "{}/{id}/approve",
            queue.base_path()
        )))
        .await?;
        info!(%queue, id, "Approved");
        Ok(())
    }

    pub async fn reject(
        &self,
        queue: ModerationQueue,
        id: i64,
        reason: &str,
    ) -> Result<(), ApiError> {
        let body = RejectRequest {
            reason: reason.to_string(),
        };
        self.request_empty(
            ApiRequest::post(format!("{}/{id}/reject", queue.base_path())).json(&body)?,
        )
        .await?;
        info!(%queue, id, "Rejected");
        Ok(())
    }

    pub async fn pending_users(&self) -> Result<Vec<User>, ApiError> {
        self.pending(ModerationQueue::Users).await
    }

    pub async fn pending_food(&self) -> Result<Vec<FoodPlace>, ApiError> {
        self.pending(ModerationQueue::Foods).await
    }

    pub async fn pending_food_categories(&self) -> Result<Vec<FoodCategory>, ApiError> {
        self.pending(ModerationQueue::FoodCategories).await
    }

    pub async fn pending_hostels(&self) -> Result<Vec<Hostel>, ApiError> {
        self.pending(ModerationQueue::Hostels).await
    }

    pub async fn pending_hostel_categories(&self) -> Result<Vec<HostelCategory>, ApiError> {
        self.pending(ModerationQueue::HostelCategories).await
    }

    /// All suggestions, paginated
    pub async fn suggestions(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<Suggestion>, ApiError> {
        self.request(ApiRequest::get("/api/admin/suggestions").query(page.query_pairs()))
            .await
    }

    pub async fn suggestions_by_category(
        &self,
        category: SuggestionCategory,
    ) -> Result<Vec<Suggestion>, ApiError> {
        self.get(&format!("/api/admin/suggestions/category/{category}"))
            .await
    }
}
