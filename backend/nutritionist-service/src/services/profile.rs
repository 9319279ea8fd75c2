use std::sync::Arc;
use tracing::debug;

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{CoursePreview, Gender, ProfileComment, ProfileDetail, Viewer};
use crate::services::image::ImageUrlResolver;
use crate::services::rating::profile_average;

/// Date format of profile comments
pub const COMMENT_DATE_FORMAT: &str = "%Y/%m/%d";

/// Full public profile of a single nutritionist.
pub struct ProfileService {
    store: Arc<dyn RecordStore>,
    images: Arc<dyn ImageUrlResolver>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RecordStore>, images: Arc<dyn ImageUrlResolver>) -> Self {
        Self { store, images }
    }

    pub async fn get_profile(&self, nutritionist_id: i32, viewer: Viewer) -> Result<ProfileDetail> {
        let mut snapshot = self.store.snapshot().await?;

        let (nutritionist, owner) = snapshot
            .nutritionist_with_owner(nutritionist_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Nutritionist {} not found", nutritionist_id))
            })?;

        if !nutritionist.is_public && viewer == Viewer::Anonymous {
            debug!(nutritionist_id, "Private profile hidden from anonymous viewer");
            return Err(AppError::NotFound(format!(
                "Nutritionist {} not found",
                nutritionist_id
            )));
        }

        let favorite = match viewer {
            Viewer::Anonymous => false,
            Viewer::User(user_id) => snapshot.is_favorite(user_id, nutritionist_id).await?,
        };

        let mut plans = snapshot.active_plans(&[nutritionist_id]).await?;
        plans.retain(|p| !p.is_delete);
        plans.sort_by_key(|p| (p.rank, p.id));

        let mut comments = snapshot.profile_comments(nutritionist_id).await?;
        comments.sort_by(|a, b| b.create_date.cmp(&a.create_date));

        let rates: Vec<i32> = comments.iter().map(|c| c.rate).collect();
        let rate_avg = profile_average(&rates);

        debug!(
            nutritionist_id,
            plans = plans.len(),
            comments = comments.len(),
            ?rate_avg,
            "Profile assembled"
        );

        Ok(ProfileDetail {
            nutritionist_id: nutritionist.id,
            portrait_image: self.images.resolve(nutritionist.portrait_image.as_deref()),
            expertise: nutritionist.expertise_tags(),
            favorite,
            gender: Gender::from_code(owner.gender),
            title: nutritionist.title,
            city: nutritionist.city,
            education: nutritionist.education,
            experience: nutritionist.experience,
            about_me: nutritionist.about_me,
            course_intro: nutritionist.course_intro,
            course: plans.iter().map(CoursePreview::from).collect(),
            comment: comments
                .into_iter()
                .map(|c| ProfileComment {
                    user_name: c.user_name,
                    content: c.content,
                    rate: c.rate,
                    create_date: c.create_date.format(COMMENT_DATE_FORMAT).to_string(),
                })
                .collect(),
            rate_avg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, Records};
    use crate::test_support::*;

    fn service(records: Records) -> ProfileService {
        ProfileService::new(Arc::new(InMemoryStore::new(records)), images())
    }

    fn reviewed_profile() -> Records {
        let mut records = with_owners(Records {
            nutritionists: vec![nutritionist(1, true)],
            plans: vec![plan(10, 1, 2), plan(11, 1, 1)],
            users: vec![user(500, "小明", 0), user(501, "小華", 1)],
            ..Records::default()
        });
        review(&mut records, 1, 10, 500, 4, date(2024, 1, 1));
        review(&mut records, 2, 11, 501, 5, date(2024, 3, 1));
        review(&mut records, 3, 10, 501, 3, date(2024, 2, 1));
        records
    }

    #[tokio::test]
    async fn test_comments_newest_first_with_formatted_dates() {
        let detail = service(reviewed_profile())
            .get_profile(1, Viewer::Anonymous)
            .await
            .unwrap();

        let dates: Vec<&str> = detail.comment.iter().map(|c| c.create_date.as_str()).collect();
        assert_eq!(dates, vec!["2024/03/01", "2024/02/01", "2024/01/01"]);
        assert_eq!(detail.comment[0].user_name, "小華");
        assert_eq!(detail.comment[2].user_name, "小明");
    }

    #[tokio::test]
    async fn test_rate_average_is_flat_over_all_comments() {
        let detail = service(reviewed_profile())
            .get_profile(1, Viewer::Anonymous)
            .await
            .unwrap();
        assert_eq!(detail.rate_avg, Some(4.0));
    }

    #[tokio::test]
    async fn test_courses_by_rank() {
        let detail = service(reviewed_profile())
            .get_profile(1, Viewer::Anonymous)
            .await
            .unwrap();
        let ranks: Vec<i32> = detail.course.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_no_plans_means_null_average() {
        let records = with_owners(Records {
            nutritionists: vec![nutritionist(1, true)],
            ..Records::default()
        });

        let detail = service(records).get_profile(1, Viewer::Anonymous).await.unwrap();
        assert!(detail.course.is_empty());
        assert!(detail.comment.is_empty());
        assert_eq!(detail.rate_avg, None);
    }

    #[tokio::test]
    async fn test_deleted_plan_comments_still_count() {
        let mut records = reviewed_profile();
        records.plans.retain(|p| p.id != 11);
        let mut deleted = plan(11, 1, 1);
        deleted.is_delete = true;
        records.plans.push(deleted);

        let detail = service(records).get_profile(1, Viewer::Anonymous).await.unwrap();
        assert_eq!(detail.course.len(), 1);
        assert_eq!(detail.comment.len(), 3);
        assert_eq!(detail.rate_avg, Some(4.0));
    }

    #[tokio::test]
    async fn test_unknown_nutritionist_is_not_found() {
        let err = service(reviewed_profile())
            .get_profile(99, Viewer::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_favorite_and_gender() {
        let mut records = reviewed_profile();
        favorite(&mut records, 500, 1);
        // Owner gender code 0 maps to male.
        if let Some(owner) = records.users.iter_mut().find(|u| u.id == 1001) {
            owner.gender = 0;
        }
        let service = service(records);

        let detail = service.get_profile(1, Viewer::User(500)).await.unwrap();
        assert!(detail.favorite);
        assert_eq!(detail.gender, Gender::Male);

        let detail = service.get_profile(1, Viewer::User(501)).await.unwrap();
        assert!(!detail.favorite);

        let detail = service.get_profile(1, Viewer::Anonymous).await.unwrap();
        assert!(!detail.favorite);
    }

    #[tokio::test]
    async fn test_private_profile_hidden_from_anonymous() {
        let records = with_owners(Records {
            nutritionists: vec![nutritionist(3, false)],
            ..Records::default()
        });
        let service = service(records);

        let err = service.get_profile(3, Viewer::Anonymous).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let detail = service.get_profile(3, Viewer::User(500)).await.unwrap();
        assert_eq!(detail.nutritionist_id, 3);
        assert_eq!(detail.gender, Gender::Female);
    }
}
