//! Record builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::db::Records;
use crate::models::{Comment, Course, FavoriteList, Nutritionist, Order, Plan, User};
use crate::services::CdnImageResolver;

pub const IMAGE_BASE: &str = "https://cdn.test/images";

pub fn images() -> Arc<CdnImageResolver> {
    Arc::new(CdnImageResolver::new(IMAGE_BASE))
}

pub fn nutritionist(id: i32, is_public: bool) -> Nutritionist {
    Nutritionist {
        id,
        user_id: 1000 + id,
        title: format!("營養師 {}", id),
        is_public,
        city: Some("台北市".to_string()),
        education: None,
        experience: None,
        about_me: None,
        course_intro: None,
        expertise: Some("體重控制,運動營養".to_string()),
        portrait_image: Some(format!("portrait/{}.png", id)),
    }
}

pub fn plan(id: i32, nutritionist_id: i32, rank: i32) -> Plan {
    Plan {
        id,
        nutritionist_id,
        rank,
        course_name: format!("課程 {}", id),
        course_week: 4,
        course_price: 1200,
        tag: Some("減重".to_string()),
        is_delete: false,
    }
}

pub fn user(id: i32, name: &str, gender: i32) -> User {
    User {
        id,
        user_name: name.to_string(),
        gender,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

/// Add the owning user row for every nutritionist that lacks one.
pub fn with_owners(mut records: Records) -> Records {
    for n in &records.nutritionists {
        if !records.users.iter().any(|u| u.id == n.user_id) {
            records.users.push(user(n.user_id, &n.title, 1));
        }
    }
    records
}

/// Record a review: order -> course -> comment, all keyed by `comment_id`.
pub fn review(
    records: &mut Records,
    comment_id: i32,
    plan_id: i32,
    user_id: i32,
    rate: i32,
    create_date: DateTime<Utc>,
) {
    records.orders.push(Order {
        id: comment_id,
        user_id,
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
        content: Some(format!("評論 {}", comment_id)),
        create_date,
    });
}

pub fn favorite(records: &mut Records, user_id: i32, nutritionist_id: i32) {
    let id = records.favorites.len() as i32 + 1;
    records.favorites.push(FavoriteList {
        id,
        user_id,
        nutritionist_id,
    });
}
