use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::metrics::FAVORITE_LOOKUPS_SKIPPED_TOTAL;
use crate::models::{CoursePreview, DirectoryEntry, PageResult, Plan, Viewer};
use crate::services::image::ImageUrlResolver;

/// Fixed directory page size
pub const PAGE_SIZE: i64 = 10;

/// Active plans shown per nutritionist in the directory
pub const COURSE_PREVIEW_LIMIT: usize = 2;

/// Paginated listing of every public nutritionist, ordered by id.
pub struct DirectoryService {
    store: Arc<dyn RecordStore>,
    images: Arc<dyn ImageUrlResolver>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn RecordStore>, images: Arc<dyn ImageUrlResolver>) -> Self {
        Self { store, images }
    }

    /// Build page `page` (1-based). Pages past the end are empty, not errors.
    pub async fn list_page(&self, page: i64, viewer: Viewer) -> Result<PageResult<DirectoryEntry>> {
        if page < 1 {
            return Err(AppError::ValidationError(format!(
                "page must be 1 or greater, got {}",
                page
            )));
        }

        let mut snapshot = self.store.snapshot().await?;

        let total_records = snapshot.count_public().await?;
        let total_pages = total_pages(total_records, PAGE_SIZE);
        let offset = (page - 1).saturating_mul(PAGE_SIZE);

        debug!(
            page,
            offset,
            total_records,
            ?viewer,
            "Directory page request"
        );

        let nutritionists = snapshot.public_page(offset, PAGE_SIZE).await?;
        if nutritionists.is_empty() {
            return Ok(PageResult {
                page,
                page_size: PAGE_SIZE,
                total_records,
                total_pages,
                entries: Vec::new(),
            });
        }

        let ids: Vec<i32> = nutritionists.iter().map(|n| n.id).collect();

        let favorites: HashSet<i32> = match viewer {
            Viewer::Anonymous => {
                FAVORITE_LOOKUPS_SKIPPED_TOTAL.inc();
                HashSet::new()
            }
            Viewer::User(user_id) => snapshot.favorited_among(user_id, &ids).await?,
        };

        let mut previews = course_previews(snapshot.active_plans(&ids).await?);

        let entries = nutritionists
            .into_iter()
            .map(|n| DirectoryEntry {
                nutritionist_id: n.id,
                portrait_image: self.images.resolve(n.portrait_image.as_deref()),
                expertise: n.expertise_tags(),
                favorite: favorites.contains(&n.id),
                course: previews.remove(&n.id).unwrap_or_default(),
                title: n.title,
            })
            .collect();

        Ok(PageResult {
            page,
            page_size: PAGE_SIZE,
            total_records,
            total_pages,
            entries,
        })
    }
}

/// Ceiling division; zero records means zero pages.
pub fn total_pages(total_records: i64, page_size: i64) -> i64 {
    if total_records <= 0 {
        return 0;
    }
    (total_records + page_size - 1) / page_size
}

/// Lowest-rank active plans per nutritionist, at most `COURSE_PREVIEW_LIMIT`.
fn course_previews(mut plans: Vec<Plan>) -> HashMap<i32, Vec<CoursePreview>> {
    plans.retain(|p| !p.is_delete);
    plans.sort_by_key(|p| (p.nutritionist_id, p.rank, p.id));

    let mut previews: HashMap<i32, Vec<CoursePreview>> = HashMap::new();
    for plan in &plans {
        let entry = previews.entry(plan.nutritionist_id).or_default();
        if entry.len() < COURSE_PREVIEW_LIMIT {
            entry.push(CoursePreview::from(plan));
        }
    }
    previews
}
