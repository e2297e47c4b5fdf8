//! Food places and food categories

use super::CampusClient;
use crate::error::ApiError;
use crate::request::{ApiRequest, FilePart};
use crate::types::{
    CreateFoodCategoryRequest, CreateFoodPlaceRequest, FoodCategory, FoodFilters, FoodPlace,
    PageRequest, PageResponse,
};

impl CampusClient {
    /// Approved food places matching `filters`
    pub async fn food_places(
        &self,
        filters: &FoodFilters,
        page: &PageRequest,
    ) -> Result<PageResponse<FoodPlace>, ApiError> {
        let request = ApiRequest::get("/api/food/places")
            .query(page.query_pairs())
            .query(filters.query_pairs());
        self.request(request).await
    }

    pub async fn food_place(&self, id: i64) -> Result<FoodPlace, ApiError> {
        self.get(&format!("/api/food/places/{id}")).await
    }

    /// Submit a food place for moderation
    pub async fn create_food_place(
        &self,
        request: &CreateFoodPlaceRequest,
    ) -> Result<FoodPlace, ApiError> {
        self.post("/api/food/places", request).await
    }

    /// Upload images for a food place, returning their hosted URLs
    pub async fn upload_food_images(&self, files: Vec<FilePart>) -> Result<Vec<String>, ApiError> {
        let parts = files
            .into_iter()
            .map(|file| FilePart {
                field: "images".to_string(),
                ..file
            })
            .collect();
        self.request(ApiRequest::post("/api/food/images/upload").files(parts))
            .await
    }

    pub async fn food_categories(&self) -> Result<Vec<FoodCategory>, ApiError> {
        self.get("/api/food/categories").await
    }

    pub async fn food_category(&self, id: i64) -> Result<FoodCategory, ApiError> {
        self.get(&format!("/api/food/categories/{id}")).await
    }

    /// Propose a new category; stays pending until approved
    pub async fn create_food_category(
        &self,
        request: &CreateFoodCategoryRequest,
    ) -> Result<FoodCategory, ApiError> {
        self.post("/api/food/categories", request).await
    }
}
