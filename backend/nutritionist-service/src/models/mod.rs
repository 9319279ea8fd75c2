/// Data models for nutritionist-service
///
/// Record types mirror the store tables; view types are the JSON shapes
/// returned by the API (PascalCase keys).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{AppError, Result};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Nutritionist {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub is_public: bool,
    pub city: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub about_me: Option<String>,
    pub course_intro: Option<String>,
    /// Comma-delimited tag list as stored
    pub expertise: Option<String>,
    /// Raw image reference, resolved to a URL at the boundary
    pub portrait_image: Option<String>,
}

impl Nutritionist {
    pub fn expertise_tags(&self) -> Vec<String> {
        split_expertise(self.expertise.as_deref().unwrap_or_default())
    }
}

/// A sellable course plan owned by one nutritionist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub id: i32,
    pub nutritionist_id: i32,
    pub rank: i32,
    pub course_name: String,
    pub course_week: i32,
    pub course_price: i32,
    pub tag: Option<String>,
    pub is_delete: bool,
}

/// Purchase of a plan by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub plan_id: i32,
}

/// Delivered instance of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: i32,
    pub order_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i32,
    pub course_id: i32,
    pub rate: i32,
    pub content: Option<String>,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub user_name: String,
    pub gender: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FavoriteList {
    pub id: i32,
    pub user_id: i32,
    pub nutritionist_id: i32,
}

// ============================================================================
// Read projections
// ============================================================================

/// Comment rates reachable from one plan through its orders and courses
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRates {
    pub plan_id: i32,
    pub nutritionist_id: i32,
    pub rates: Vec<i32>,
}

/// Comment joined with the user who placed the order
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub user_name: String,
    pub content: Option<String>,
    pub rate: i32,
    pub create_date: DateTime<Utc>,
}

// ============================================================================
// Request context
// ============================================================================

/// Who is asking. User id 0 on the wire means not logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(i32),
}

impl Viewer {
    pub fn from_user_id(user_id: i64) -> Result<Self> {
        match user_id {
            0 => Ok(Viewer::Anonymous),
            id if id < 0 => Err(AppError::ValidationError(format!(
                "userid must not be negative, got {}",
                id
            ))),
            id => i32::try_from(id)
                .map(Viewer::User)
                .map_err(|_| AppError::ValidationError(format!("userid {} is out of range", id))),
        }
    }
}

/// Binary gender mapping carried over from the user table: 0 is male,
/// every other code is female.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Localized display label
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ============================================================================
// API views
// ============================================================================

/// Entry of the top-rated listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NutritionistSummary {
    pub nutritionist_id: i32,
    pub title: String,
    pub portrait_image: Option<String>,
    pub expertise: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoursePreview {
    pub rank: i32,
    pub course_name: String,
    pub course_week: i32,
    pub course_price: i32,
    pub tag: Option<String>,
}

impl From<&Plan> for CoursePreview {
    fn from(plan: &Plan) -> Self {
        Self {
            rank: plan.rank,
            course_name: plan.course_name.clone(),
            course_week: plan.course_week,
            course_price: plan.course_price,
            tag: plan.tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirectoryEntry {
    pub nutritionist_id: i32,
    pub title: String,
    pub portrait_image: Option<String>,
    pub expertise: Vec<String>,
    pub favorite: bool,
    pub course: Vec<CoursePreview>,
}

/// One window of a listing plus the totals it was cut from
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub entries: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProfileComment {
    pub user_name: String,
    pub content: Option<String>,
    pub rate: i32,
    /// `yyyy/MM/dd`
    pub create_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProfileDetail {
    pub nutritionist_id: i32,
    pub title: String,
    pub portrait_image: Option<String>,
    pub expertise: Vec<String>,
    pub favorite: bool,
    pub gender: Gender,
    pub city: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub about_me: Option<String>,
    pub course_intro: Option<String>,
    pub course: Vec<CoursePreview>,
    pub comment: Vec<ProfileComment>,
    /// Flat average of every comment, one decimal; null without comments
    #[serde(rename = "RateAVG")]
    pub rate_avg: Option<f64>,
}

/// Split the stored comma-delimited expertise list into ordered tags.
pub fn split_expertise(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
