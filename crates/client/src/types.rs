//! Wire types shared with the campus directory backend

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceRange {
    Budget,
    Moderate,
    Expensive,
}

impl PriceRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "BUDGET",
            Self::Moderate => "MODERATE",
            Self::Expensive => "EXPENSIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionCategory {
    Food,
    Hostel,
    General,
}

impl SuggestionCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Hostel => "HOSTEL",
            Self::General => "GENERAL",
        }
    }
}

impl fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Users and authentication
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub account_status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================
// Food places
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCategory {
    pub category_id: i64,
    pub category_name: String,
    pub created_by_user_id: i64,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPlace {
    pub place_id: i64,
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    pub submitted_by_user_id: i64,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub categories: Vec<FoodCategory>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_for_category_id: Option<i64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodPlaceRequest {
    pub place_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_for_category_id: Option<i64>,
    /// New category proposed alongside the place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodCategoryRequest {
    pub category_name: String,
}

// ============================================
// Hostels
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostelCategory {
    pub category_id: i64,
    pub category_name: String,
    pub created_by_user_id: i64,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hostel {
    pub hostel_id: i64,
    pub hostel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_cdac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_wifi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_ac: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_mess: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_laundry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_phone: Option<String>,
    pub submitted_by_user_id: i64,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub categories: Vec<HostelCategory>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostelRequest {
    pub hostel_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_cdac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wifi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_ac: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_mess: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_laundry: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostelCategoryRequest {
    pub category_name: String,
}

// ============================================
// Suggestions and moderation
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggestion_id: i64,
    pub user_id: i64,
    pub category: SuggestionCategory,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSuggestionRequest {
    pub category: SuggestionCategory,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub pending_users: u64,
    pub pending_food: u64,
    pub pending_hostels: u64,
    pub total_suggestions: u64,
    pub pending_food_categories: u64,
    pub pending_hostel_categories: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

// ============================================
// Pagination and filters
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size".to_string(), size.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        pairs
    }
}

/// One page of a server-side paginated listing (zero-based `number`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
    pub first: bool,
    pub last: bool,
}

/// Entry in a page navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

const MAX_VISIBLE_PAGES: u32 = 5;

/// Navigation links for one-based `current` out of `total` pages.
///
/// Returns nothing for a single page. Up to five pages are listed in full;
/// beyond that the first and last page are kept with the neighbours of
/// `current`, and gaps collapse into an ellipsis.
pub fn page_window(current: u32, total: u32) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageLink::Page).collect();
    }

    let mut links = vec![PageLink::Page(1)];
    if current > 3 {
        links.push(PageLink::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    links.extend((start..=end).map(PageLink::Page));

    if current + 2 < total {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Page(total));
    links
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodFilters {
    pub search: Option<String>,
    pub price_range: Vec<PriceRange>,
    pub category_ids: Vec<i64>,
    pub city: Option<String>,
}

impl FoodFilters {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if !self.price_range.is_empty() {
            let joined = self
                .price_range
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("priceRange".to_string(), joined));
        }
        if !self.category_ids.is_empty() {
            let joined = self
                .category_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("categoryIds".to_string(), joined));
        }
        if let Some(city) = &self.city {
            pairs.push(("city".to_string(), city.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostelFilters {
    pub search: Option<String>,
    pub rent_min: Option<f64>,
    pub rent_max: Option<f64>,
    pub has_wifi: Option<bool>,
    pub has_ac: Option<bool>,
    pub has_mess: Option<bool>,
    pub has_laundry: Option<bool>,
    pub city: Option<String>,
}

impl HostelFilters {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        };
        push("search", self.search.clone());
        push("rentMin", self.rent_min.map(|v| v.to_string()));
        push("rentMax", self.rent_max.map(|v| v.to_string()));
        push("hasWifi", self.has_wifi.map(|v| v.to_string()));
        push("hasAc", self.has_ac.map(|v| v.to_string()));
        push("hasMess", self.has_mess.map(|v| v.to_string()));
        push("hasLaundry", self.has_laundry.map(|v| v.to_string()));
        push("city", self.city.clone());
        pairs
    }
}
