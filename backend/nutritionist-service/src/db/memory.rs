//! In-process record store.
//!
//! Snapshots share an immutable copy of the records, so writes made through
//! [`InMemoryStore::replace`] never leak into a snapshot that is already open.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::{RecordStore, StoreSnapshot};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentWithAuthor, Course, FavoriteList, Nutritionist, Order, Plan, PlanRates, User,
};

#[derive(Debug, Clone, Default)]
pub struct Records {
    pub nutritionists: Vec<Nutritionist>,
    pub plans: Vec<Plan>,
    pub orders: Vec<Order>,
    pub courses: Vec<Course>,
    pub comments: Vec<Comment>,
    pub users: Vec<User>,
    pub favorites: Vec<FavoriteList>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Arc<Records>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new(records: Records) -> Self {
        Self {
            records: Arc::new(RwLock::new(Arc::new(records))),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Swap in a new record set; open snapshots keep the old one.
    pub fn replace(&self, records: Records) -> Result<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| AppError::Internal("record lock poisoned".to_string()))?;
        *guard = Arc::new(records);
        Ok(())
    }

    /// Simulate an unreachable store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn snapshot(&self) -> Result<Box<dyn StoreSnapshot>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }

        let records = self
            .records
            .read()
            .map_err(|_| AppError::Internal("record lock poisoned".to_string()))?
            .clone();

        Ok(Box::new(MemorySnapshot { records }))
    }
}

pub struct MemorySnapshot {
    records: Arc<Records>,
}

impl MemorySnapshot {
    fn public_sorted(&self) -> Vec<&Nutritionist> {
        let mut public: Vec<&Nutritionist> = self
            .records
            .nutritionists
            .iter()
            .filter(|n| n.is_public)
            .collect();
        public.sort_by_key(|n| n.id);
        public
    }

    /// (plan id, user id, comment) for every comment reachable from a plan
    fn comments_by_plan(&self) -> Vec<(i32, i32, &Comment)> {
        let orders: HashMap<i32, &Order> = self.records.orders.iter().map(|o| (o.id, o)).collect();
        let courses: HashMap<i32, &Course> =
            self.records.courses.iter().map(|c| (c.id, c)).collect();

        self.records
            .comments
            .iter()
            .filter_map(|comment| {
                let course = courses.get(&comment.course_id)?;
                let order = orders.get(&course.order_id)?;
                Some((order.plan_id, order.user_id, comment))
            })
            .collect()
    }
}

#[async_trait]
impl StoreSnapshot for MemorySnapshot {
    async fn ranking_candidates(&mut self, limit: i64) -> Result<Vec<Nutritionist>> {
        let owners: HashSet<i32> = self
            .records
            .plans
            .iter()
            .map(|p| p.nutritionist_id)
            .collect();

        Ok(self
            .public_sorted()
            .into_iter()
            .filter(|n| owners.contains(&n.id))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn plan_rates(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<PlanRates>> {
        let mut rates_by_plan: HashMap<i32, Vec<i32>> = HashMap::new();
        for (plan_id, _, comment) in self.comments_by_plan() {
            rates_by_plan.entry(plan_id).or_default().push(comment.rate);
        }

        let mut plans: Vec<&Plan> = self
            .records
            .plans
            .iter()
            .filter(|p| !p.is_delete && nutritionist_ids.contains(&p.nutritionist_id))
            .collect();
        plans.sort_by_key(|p| (p.nutritionist_id, p.id));

        Ok(plans
            .into_iter()
            .map(|p| PlanRates {
                plan_id: p.id,
                nutritionist_id: p.nutritionist_id,
                rates: rates_by_plan.remove(&p.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn count_public(&mut self) -> Result<i64> {
        Ok(self.public_sorted().len() as i64)
    }

    async fn public_page(&mut self, offset: i64, limit: i64) -> Result<Vec<Nutritionist>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(self
            .public_sorted()
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn favorited_among(
        &mut self,
        user_id: i32,
        nutritionist_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        Ok(self
            .records
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id && nutritionist_ids.contains(&f.nutritionist_id))
            .map(|f| f.nutritionist_id)
            .collect())
    }

    async fn active_plans(&mut self, nutritionist_ids: &[i32]) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .records
            .plans
            .iter()
            .filter(|p| !p.is_delete && nutritionist_ids.contains(&p.nutritionist_id))
            .cloned()
            .collect();
        plans.sort_by_key(|p| (p.nutritionist_id, p.rank, p.id));
        Ok(plans)
    }

    async fn nutritionist_with_owner(
        &mut self,
        nutritionist_id: i32,
    ) -> Result<Option<(Nutritionist, User)>> {
        let Some(nutritionist) = self
            .records
            .nutritionists
            .iter()
            .find(|n| n.id == nutritionist_id)
        else {
            return Ok(None);
        };

        Ok(self
            .records
            .users
            .iter()
            .find(|u| u.id == nutritionist.user_id)
            .map(|owner| (nutritionist.clone(), owner.clone())))
    }

    async fn is_favorite(&mut self, user_id: i32, nutritionist_id: i32) -> Result<bool> {
        Ok(self
            .records
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.nutritionist_id == nutritionist_id))
    }

    async fn profile_comments(&mut self, nutritionist_id: i32) -> Result<Vec<CommentWithAuthor>> {
        let owned_plans: HashSet<i32> = self
            .records
            .plans
            .iter()
            .filter(|p| p.nutritionist_id == nutritionist_id)
            .map(|p| p.id)
            .collect();
        let users: HashMap<i32, &User> = self.records.users.iter().map(|u| (u.id, u)).collect();

        let mut comments: Vec<(i32, CommentWithAuthor)> = self
            .comments_by_plan()
            .into_iter()
            .filter(|(plan_id, _, _)| owned_plans.contains(plan_id))
            .filter_map(|(_, user_id, comment)| {
                let author = users.get(&user_id)?;
                Some((
                    comment.id,
                    CommentWithAuthor {
                        user_name: author.user_name.clone(),
                        content: comment.content.clone(),
                        rate: comment.rate,
                        create_date: comment.create_date,
                    },
                ))
            })
            .collect();
        comments.sort_by(|a, b| {
            b.1.create_date
                .cmp(&a.1.create_date)
                .then_with(|| b.0.cmp(&a.0))
        });

        Ok(comments.into_iter().map(|(_, c)| c).collect())
    }
}
