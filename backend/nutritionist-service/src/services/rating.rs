//! Rating aggregation over comment rates.
//!
//! Two deliberately separate computations share the same traversal:
//!
//! - ranking: average of plan averages, where a plan without comments
//!   contributes 0
//! - profile: one flat average over every comment, rounded to one decimal,
//!   absent when there are no comments

use crate::models::PlanRates;

/// Mean rate of one plan's comments; `None` when the plan has none.
pub fn plan_average(rates: &[i32]) -> Option<f64> {
    if rates.is_empty() {
        return None;
    }

    let sum: f64 = rates.iter().copied().map(f64::from).sum();
    Some(sum / rates.len() as f64)
}

/// Score used to order nutritionists in the top-rated listing.
///
/// Every plan counts; a plan with no comments contributes 0 rather than being
/// skipped. A nutritionist with no plans scores 0.
pub fn ranking_score(plans: &[PlanRates]) -> f64 {
    if plans.is_empty() {
        return 0.0;
    }

    let total: f64 = plans
        .iter()
        .map(|plan| plan_average(&plan.rates).unwrap_or(0.0))
        .sum();
    total / plans.len() as f64
}

/// Average shown on a profile: flat over all comments, one decimal place.
pub fn profile_average(rates: &[i32]) -> Option<f64> {
    if rates.is_empty() {
        return None;
    }

    let sum: f64 = rates.iter().copied().map(f64::from).sum();
    Some(round_one_decimal(sum / rates.len() as f64))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
