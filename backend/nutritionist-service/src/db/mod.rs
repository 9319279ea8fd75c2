/// Database access layer
///
/// Services never query the store directly. Each operation asks the
/// [`RecordStore`] for one [`StoreSnapshot`] and performs all of its reads
/// through it, so counts, pages and joined aggregates come from the same
/// data version.
///
/// - `postgres`: sqlx implementation, one read-only transaction per snapshot
/// - `memory`: in-process records, used by tests and local fixtures
use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::{CommentWithAuthor, Nutritionist, Plan, PlanRates, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryStore, Records};
pub use postgres::PgRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a consistent read handle for one logical operation.
    async fn snapshot(&self) -> Result<Box<dyn StoreSnapshot>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreSnapshot: Send {
    /// Public nutritionists owning at least one plan (soft-deleted plans
    /// count), ordered by id, at most `limit`.
    async fn ranking_candidates(&mut self, limit: i64) -> Result<Vec<Nutritionist>>;

    /// Non-deleted plans of the given nutritionists with the rates of every
    /// comment reachable through Order -> Course -> Comment. Plans without
    /// comments are returned with an empty rate list.
    async fn plan_rates(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<PlanRates>>;

    async fn count_public(&mut self) -> Result<i64>;

    /// Public nutritionists ordered by id ascending.
    async fn public_page(&mut self, offset: i64, limit: i64) -> Result<Vec<Nutritionist>>;

    /// Subset of `nutritionist_ids` the user has favorited.
    async fn favorited_among(
        &mut self,
        user_id: i32,
        nutritionist_ids: &[i32],
    ) -> Result<HashSet<i32>>;

    /// Non-deleted plans ordered by nutritionist then rank.
    async fn active_plans(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<Plan>>;

    async fn nutritionist_with_owner(
        &mut self,
        nutritionist_id: i32,
    ) -> Result<Option<(Nutritionist, User)>>;

    async fn is_favorite(&mut self, user_id: i32, nutritionist_id: i32) -> Result<bool>;

    /// Every comment on any plan of the nutritionist, deleted plans included,
    /// with the ordering user's name.
    async fn profile_comments(&mut self, nutritionist_id: i32) -> Result<Vec<CommentWithAuthor>>;
}
