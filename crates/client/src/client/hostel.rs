//! Hostels and hostel categories

use super::CampusClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{
    CreateHostelCategoryRequest, CreateHostelRequest, Hostel, HostelCategory, HostelFilters,
    PageRequest, PageResponse,
};

impl CampusClient {
    pub async fn hostels(
        &self,
        filters: &HostelFilters,
        page: &PageRequest,
    ) -> Result<PageResponse<Hostel>, ApiError> {
        let request = ApiRequest::get("/api/hostel/hostels")
            .query(page.query_pairs())
            .query(filters.query_pairs());
        self.request(request).await
    }

    pub async fn hostel(&self, id: i64) -> Result<Hostel, ApiError> {
        self.get(&format!("/api/hostel/hostels/{id}")).await
    }

    pub async fn create_hostel(&self, request: &CreateHostelRequest) -> Result<Hostel, ApiError> {
        self.post("/api/hostel/hostels", request).await
    }

    pub async fn hostel_categories(&self) -> Result<Vec<HostelCategory>, ApiError> {
        self.get("/api/hostel/categories").await
    }

    pub async fn hostel_category(&self, id: i64) -> Result<HostelCategory, ApiError> {
        self.get(&format!("/api/hostel/categories/{id}")).await
    }

    pub async fn create_hostel_category(
        &self,
        request: &CreateHostelCategoryRequest,
    ) -> Result<HostelCategory, ApiError> {
        self.post("/api/hostel/categories", request).await
    }
}
