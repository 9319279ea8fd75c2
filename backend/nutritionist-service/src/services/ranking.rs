use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::RankingConfig;
use crate::db::RecordStore;
use crate::error::Result;
use crate::metrics::TOP_RATED_CANDIDATE_COUNT;
use crate::models::{Nutritionist, NutritionistSummary, PlanRates};
use crate::services::image::ImageUrlResolver;
use crate::services::rating::ranking_score;

/// Top-rated listing for the home page.
///
/// The candidate pool is cut to `candidate_pool_cap` (ordered by id) before
/// any score is computed. The cap bounds per-request cost; it is not a
/// ranking rule, so a highly rated nutritionist beyond the cap is not seen.
pub struct RankingService {
    store: Arc<dyn RecordStore>,
    images: Arc<dyn ImageUrlResolver>,
    candidate_pool_cap: usize,
}

struct RankedCandidate {
    score: f64,
    tie_break: u64,
    nutritionist: Nutritionist,
}

impl RankingService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        images: Arc<dyn ImageUrlResolver>,
        config: &RankingConfig,
    ) -> Self {
        Self {
            store,
            images,
            candidate_pool_cap: config.candidate_pool_cap.max(1),
        }
    }

    /// Rank with a generator seeded from OS entropy for this call only.
    pub async fn top_rated(&self) -> Result<Vec<NutritionistSummary>> {
        let mut rng = StdRng::from_entropy();
        self.top_rated_with(&mut rng).await
    }

    /// Rank using `rng` for tie-breaks. Equal scores are ordered by a random
    /// key drawn per candidate, so repeated calls shuffle ties.
    pub async fn top_rated_with<R: Rng + Send>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<NutritionistSummary>> {
        let mut snapshot = self.store.snapshot().await?;

        let pool_cap = i64::try_from(self.candidate_pool_cap).unwrap_or(i64::MAX);
        let candidates = snapshot.ranking_candidates(pool_cap).await?;
        TOP_RATED_CANDIDATE_COUNT.observe(candidates.len() as f64);

        if candidates.is_empty() {
            debug!("Top-rated: no eligible candidates");
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = candidates.iter().map(|n| n.id).collect();
        let mut plans_by_owner: HashMap<i32, Vec<PlanRates>> = HashMap::new();
        for plan in snapshot.plan_rates(&ids).await? {
            plans_by_owner
                .entry(plan.nutritionist_id)
                .or_default()
                .push(plan);
        }

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|nutritionist| {
                let plans = plans_by_owner
                    .get(&nutritionist.id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                RankedCandidate {
                    score: ranking_score(plans),
                    tie_break: rng.gen(),
                    nutritionist,
                }
            })
            .collect();

        sort_ranked(&mut ranked);

        debug!(
            candidates = ranked.len(),
            top_score = ranked.first().map(|c| c.score),
            "Top-rated ranking computed"
        );

        Ok(ranked
            .into_iter()
            .map(|candidate| self.summarize(candidate.nutritionist))
            .collect())
    }

    fn summarize(&self, nutritionist: Nutritionist) -> NutritionistSummary {
        NutritionistSummary {
            nutritionist_id: nutritionist.id,
            expertise: nutritionist.expertise_tags(),
            portrait_image: self.images.resolve(nutritionist.portrait_image.as_deref()),
            title: nutritionist.title,
        }
    }
}

/// Score descending, then random key ascending.
fn sort_ranked(ranked: &mut [RankedCandidate]) {
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.tie_break.cmp(&b.tie_break))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, Records};
    use crate::error::AppError;
    use crate::test_support::*;
    use std::collections::HashSet;

    fn service(records: Records, cap: usize) -> RankingService {
        RankingService::new(
            Arc::new(InMemoryStore::new(records)),
            images(),
            &RankingConfig {
                candidate_pool_cap: cap,
            },
        )
    }

    fn ids(summaries: &[NutritionistSummary]) -> Vec<i32> {
        summaries.iter().map(|s| s.nutritionist_id).collect()
    }

    #[tokio::test]
    async fn test_orders_by_score_descending() {
        let mut records = Records {
            nutritionists: vec![nutritionist(1, true), nutritionist(2, true), nutritionist(3, true)],
            plans: vec![plan(10, 1, 1), plan(20, 2, 1), plan(30, 3, 1)],
            users: vec![user(500, "buyer", 1)],
            ..Records::default()
        };
        review(&mut records, 1, 10, 500, 3, date(2024, 1, 1));
        review(&mut records, 2, 20, 500, 5, date(2024, 1, 1));
        review(&mut records, 3, 30, 500, 4, date(2024, 1, 1));

        let mut rng = StdRng::seed_from_u64(7);
        let top = service(records, 20).top_rated_with(&mut rng).await.unwrap();

        assert_eq!(ids(&top), vec![2, 3, 1]);
        assert_eq!(top[0].expertise, vec!["體重控制", "運動營養"]);
        assert_eq!(
            top[0].portrait_image.as_deref(),
            Some("https://cdn.test/images/portrait/2.png")
        );
    }

    #[tokio::test]
    async fn test_excludes_private_and_planless() {
        let records = Records {
            nutritionists: vec![nutritionist(1, true), nutritionist(2, false), nutritionist(3, true)],
            plans: vec![plan(10, 1, 1), plan(20, 2, 1)],
            ..Records::default()
        };

        let top = service(records, 20).top_rated().await.unwrap();
        assert_eq!(ids(&top), vec![1]);
    }

    #[tokio::test]
    async fn test_deleted_plan_keeps_eligibility_but_scores_zero() {
        let mut records = Records {
            nutritionists: vec![nutritionist(1, true), nutritionist(2, true)],
            plans: vec![plan(10, 1, 1), plan(20, 2, 1)],
            users: vec![user(500, "buyer", 0)],
            ..Records::default()
        };
        records.plans[0].is_delete = true;
        review(&mut records, 1, 10, 500, 5, date(2024, 1, 1));
        review(&mut records, 2, 20, 500, 1, date(2024, 1, 1));

        let mut rng = StdRng::seed_from_u64(1);
        let top = service(records, 20).top_rated_with(&mut rng).await.unwrap();
        assert_eq!(ids(&top), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_pool_cap_applies_before_ranking() {
        let mut records = Records::default();
        for id in 1..=25 {
            records.nutritionists.push(nutritionist(id, true));
            records.plans.push(plan(id * 10, id, 1));
        }
        records.users.push(user(500, "buyer", 0));
        // Best-rated nutritionist sits beyond the cap.
        review(&mut records, 1, 250, 500, 5, date(2024, 1, 1));

        let top = service(records.clone(), 20).top_rated().await.unwrap();
        assert_eq!(top.len(), 20);
        assert!(!ids(&top).contains(&25));

        let top = service(records, 30).top_rated().await.unwrap();
        assert_eq!(top.len(), 25);
        assert_eq!(top[0].nutritionist_id, 25);
    }

    #[tokio::test]
    async fn test_empty_pool_is_empty_result() {
        let top = service(Records::default(), 20).top_rated().await.unwrap();
        assert!(top.is_empty());
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let store = InMemoryStore::default();
        store.set_unavailable(true);
        let service = RankingService::new(
            Arc::new(store),
            images(),
            &RankingConfig {
                candidate_pool_cap: 20,
            },
        );

        let err = service.top_rated().await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_ties_are_shuffled_across_calls() {
        let records = Records {
            nutritionists: (1..=4).map(|id| nutritionist(id, true)).collect(),
            plans: (1..=4).map(|id| plan(id * 10, id, 1)).collect(),
            ..Records::default()
        };
        let service = service(records, 20);

        let mut orderings = HashSet::new();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let top = service.top_rated_with(&mut rng).await.unwrap();
            assert_eq!(top.len(), 4);
            orderings.insert(ids(&top));
        }
        assert!(orderings.len() > 1, "tied candidates never reordered");
    }

    #[tokio::test]
    async fn test_entropy_tie_break_differs_between_calls() {
        let records = Records {
            nutritionists: (1..=3).map(|id| nutritionist(id, true)).collect(),
            plans: (1..=3).map(|id| plan(id * 10, id, 1)).collect(),
            ..Records::default()
        };
        let service = service(records, 20);

        let first = ids(&service.top_rated().await.unwrap());
        let mut saw_other = false;
        for _ in 0..200 {
            if ids(&service.top_rated().await.unwrap()) != first {
                saw_other = true;
                break;
            }
        }
        assert!(saw_other, "entropy-seeded ranking returned a fixed order");
    }

    #[test]
    fn test_sort_ranked_uses_tie_break_only_on_equal_scores() {
        let mut ranked = vec![
            RankedCandidate {
                score: 3.0,
                tie_break: 1,
                nutritionist: nutritionist(1, true),
            },
            RankedCandidate {
                score: 4.0,
                tie_break: 99,
                nutritionist: nutritionist(2, true),
            },
            RankedCandidate {
                score: 3.0,
                tie_break: 0,
                nutritionist: nutritionist(3, true),
            },
        ];
        sort_ranked(&mut ranked);
        let order: Vec<i32> = ranked.iter().map(|c| c.nutritionist.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
