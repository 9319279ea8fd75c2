/// Nutritionist Service Library
///
/// Read side of the NuCares platform: the home-page top-rated listing, the
/// paginated nutritionist directory and the public profile view.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the response envelope
/// - `models`: Store records and API view types
/// - `services`: Ranking, directory and profile assembly
/// - `db`: Record store trait plus PostgreSQL and in-memory implementations
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use config::RankingConfig;
use db::RecordStore;
use services::{DirectoryService, ImageUrlResolver, ProfileService, RankingService};

pub use config::Config;
pub use error::{AppError, Result};

/// Shared handler state
pub struct AppState {
    pub ranking: RankingService,
    pub directory: DirectoryService,
    pub profile: ProfileService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        images: Arc<dyn ImageUrlResolver>,
        ranking: &RankingConfig,
    ) -> Self {
        Self {
            ranking: RankingService::new(store.clone(), images.clone(), ranking),
            directory: DirectoryService::new(store.clone(), images.clone()),
            profile: ProfileService::new(store, images),
        }
    }
}
