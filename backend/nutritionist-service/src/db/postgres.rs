use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;

use super::{RecordStore, StoreSnapshot};
use crate::error::Result;
use crate::models::{CommentWithAuthor, Nutritionist, Plan, PlanRates, User};

const NUTRITIONIST_COLUMNS: &str = "n.id, n.user_id, n.title, n.is_public, n.city, n.education, \
     n.experience, n.about_me, n.course_intro, n.expertise, n.portrait_image";

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn snapshot(&self) -> Result<Box<dyn StoreSnapshot>> {
        let tx = db_pool::begin_read_snapshot(&self.pool).await?;
        Ok(Box::new(PgSnapshot { tx }))
    }
}

/// Read-only `REPEATABLE READ` transaction; rolled back on drop.
pub struct PgSnapshot {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct PlanRateRow {
    plan_id: i32,
    nutritionist_id: i32,
    rate: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct NutritionistOwnerRow {
    id: i32,
    user_id: i32,
    title: String,
    is_public: bool,
    city: Option<String>,
    education: Option<String>,
    experience: Option<String>,
    about_me: Option<String>,
    course_intro: Option<String>,
    expertise: Option<String>,
    portrait_image: Option<String>,
    user_name: String,
    gender: i32,
}

impl From<NutritionistOwnerRow> for (Nutritionist, User) {
    fn from(row: NutritionistOwnerRow) -> Self {
        let owner = User {
            id: row.user_id,
            user_name: row.user_name,
            gender: row.gender,
        };
        let nutritionist = Nutritionist {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            is_public: row.is_public,
            city: row.city,
            education: row.education,
            experience: row.experience,
            about_me: row.about_me,
            course_intro: row.course_intro,
            expertise: row.expertise,
            portrait_image: row.portrait_image,
        };
        (nutritionist, owner)
    }
}

/// Fold `(plan, rate)` rows ordered by plan into one entry per plan.
fn group_plan_rates(rows: Vec<PlanRateRow>) -> Vec<PlanRates> {
    let mut grouped: Vec<PlanRates> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some(last) if last.plan_id == row.plan_id => last.rates.extend(row.rate),
            _ => grouped.push(PlanRates {
                plan_id: row.plan_id,
                nutritionist_id: row.nutritionist_id,
                rates: row.rate.into_iter().collect(),
            }),
        }
    }
    grouped
}

#[async_trait]
impl StoreSnapshot for PgSnapshot {
    async fn ranking_candidates(&mut self, limit: i64) -> Result<Vec<Nutritionist>> {
        let query = format!(
            r#"
            SELECT {}
            FROM nutritionists n
            WHERE n.is_public = TRUE
              AND EXISTS (SELECT 1 FROM plans p WHERE p.nutritionist_id = n.id)
            ORDER BY n.id
            LIMIT $1
            "#,
            NUTRITIONIST_COLUMNS
        );

        let rows = sqlx::query_as::<_, Nutritionist>(&query)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows)
    }

    async fn plan_rates(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<PlanRates>> {
        let rows = sqlx::query_as::<_, PlanRateRow>(
            r#"
            SELECT p.id AS plan_id, p.nutritionist_id, cm.rate
            FROM plans p
            LEFT JOIN orders o ON o.plan_id = p.id
            LEFT JOIN courses c ON c.order_id = o.id
            LEFT JOIN comments cm ON cm.course_id = c.id
            WHERE p.nutritionist_id = ANY($1) AND p.is_delete = FALSE
            ORDER BY p.nutritionist_id, p.id
            "#,
        )
        .bind(nutritionist_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(group_plan_rates(rows))
    }

    async fn count_public(&mut self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM nutritionists WHERE is_public = TRUE")
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(count)
    }

    async fn public_page(&mut self, offset: i64, limit: i64) -> Result<Vec<Nutritionist>> {
        let query = format!(
            r#"
            SELECT {}
            FROM nutritionists n
            WHERE n.is_public = TRUE
            ORDER BY n.id
            LIMIT $1 OFFSET $2
            "#,
            NUTRITIONIST_COLUMNS
        );

        let rows = sqlx::query_as::<_, Nutritionist>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows)
    }

    async fn favorited_among(
        &mut self,
        user_id: i32,
        nutritionist_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT nutritionist_id
            FROM favorite_lists
            WHERE user_id = $1 AND nutritionist_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(nutritionist_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn active_plans(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, nutritionist_id, rank, course_name, course_week, course_price, tag, is_delete
            FROM plans
            WHERE nutritionist_id = ANY($1) AND is_delete = FALSE
            ORDER BY nutritionist_id, rank, id
            "#,
        )
        .bind(nutritionist_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(plans)
    }

    async fn nutritionist_with_owner(
        &mut self,
        nutritionist_id: i32,
    ) -> Result<Option<(Nutritionist, User)>> {
        let query = format!(
            r#"
            SELECT {}, u.user_name, u.gender
            FROM nutritionists n
            JOIN users u ON u.id = n.user_id
            WHERE n.id = $1
            "#,
            NUTRITIONIST_COLUMNS
        );

        let row = sqlx::query_as::<_, NutritionistOwnerRow>(&query)
            .bind(nutritionist_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn is_favorite(&mut self, user_id: i32, nutritionist_id: i32) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM favorite_lists
                WHERE user_id = $1 AND nutritionist_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(nutritionist_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn profile_comments(&mut self, nutritionist_id: i32) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT u.user_name, cm.content, cm.rate, cm.create_date
            FROM plans p
            JOIN orders o ON o.plan_id = p.id
            JOIN courses c ON c.order_id = o.id
            JOIN comments cm ON cm.course_id = c.id
            JOIN users u ON u.id = o.user_id
            WHERE p.nutritionist_id = $1
            ORDER BY cm.create_date DESC, cm.id DESC
            "#,
        )
        .bind(nutritionist_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(comments)
    }
}
