//! Fixtures for HTTP integration tests.

use actix_web::web;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

use nutritionist_service::config::RankingConfig;
use nutritionist_service::db::{InMemoryStore, Records};
use nutritionist_service::models::{Comment, Course, FavoriteList, Nutritionist, Order, Plan, User};
use nutritionist_service::services::CdnImageResolver;
use nutritionist_service::AppState;

pub const IMAGE_BASE: &str = "https://cdn.test/images";

/// Three public nutritionists (1..=3), one private (4).
///
/// Nutritionist 2 holds the best reviews; user 42 has favorited it.
pub fn seeded_records() -> Records {
    let mut records = Records::default();

    for id in 1..=4 {
        records.nutritionists.push(Nutritionist {
            id,
            user_id: 100 + id,
            title: format!("營養師 {}", id),
            is_public: id != 4,
            city: Some("台中市".to_string()),
            education: Some("營養學系".to_string()),
            experience: None,
            about_me: Some("Hello".to_string()),
            course_intro: None,
            expertise: Some("體重控制, 孕期營養".to_string()),
            portrait_image: Some(format!("/portrait/{}.png", id)),
        });
        records.users.push(User {
            id: 100 + id,
            user_name: format!("owner{}", id),
            gender: id % 2,
        });
        records.plans.push(Plan {
            id: id * 10,
            nutritionist_id: id,
            rank: 1,
            course_name: format!("課程 {}", id),
            course_week: 4,
            course_price: 1500,
            tag: None,
            is_delete: false,
        });
    }

    records.users.push(User {
        id: 42,
        user_name: "小美".to_string(),
        gender: 1,
    });

    for (comment_id, plan_id, rate, day) in [(1, 20, 5, 1), (2, 20, 4, 2), (3, 10, 2, 3)] {
        records.orders.push(Order {
            id: comment_id,
            user_id: 42,
            plan_id,
        });
        records.courses.push(Course {
            id: comment_id,
            order_id: comment_id,
        });
        records.comments.push(Comment {
            id: comment_id,
            course_id: comment_id,
            rate,
            content: Some("很有幫助".to_string()),
            create_date: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
        });
    }

    records.favorites.push(FavoriteList {
        id: 1,
        user_id: 42,
        nutritionist_id: 2,
    });

    records
}

pub fn app_state(store: InMemoryStore) -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Arc::new(store),
        Arc::new(CdnImageResolver::new(IMAGE_BASE)),
        &RankingConfig::default(),
    ))
}
