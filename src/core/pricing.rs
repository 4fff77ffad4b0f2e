//! Discount rule engine - computes a price quote from a plan selection,
//! the active discount rules, and the plan's base prices.
//!
//! Purely computational: no database access, no side effects, deterministic
//! for identical inputs.
//!
//! Rule semantics:
//! - A rule fires when the selection field it targets is at least its
//!   `condition_value` (threshold semantics).
//! - Rules are evaluated in a fixed order (kind, then id) so the applied list
//!   is reproducible.
//! - All fired stackable rules sum into one fraction. The largest fired
//!   non-stackable rule competes with that sum and the larger of the two
//!   applies, capped at 100%. Ties go to the stacked rules.

use crate::{
    entities::{DiscountRuleKind, discount_rule},
    errors::{Error, Result},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A subscriber's plan selection, as entered at quote or checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Delivery days per week (1-7)
    pub days_per_week: u32,
    /// Subscription duration in weeks
    pub duration_weeks: u32,
    /// Meal types requested per delivery day
    pub meal_types_per_day: Vec<String>,
}

/// One discount rule that contributed to a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDiscount {
    /// Id of the rule
    pub rule_id: i64,
    /// Selection field the rule fired on
    pub kind: DiscountRuleKind,
    /// Fraction contributed
    pub percentage: f64,
    /// Whether the rule stacked with others
    pub stackable: bool,
}

/// Computed price breakdown for a selection. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    /// Weekly subtotal per meal type (days per week × base price)
    pub weekly_subtotals: BTreeMap<String, f64>,
    /// Rules that contributed to the applied discount
    pub applied: Vec<AppliedDiscount>,
    /// Total discount fraction applied to the weekly subtotal
    pub discount_fraction: f64,
    /// Weekly total after discount, rounded to 2 decimals
    pub weekly_total: f64,
    /// Weekly total × duration in weeks
    pub total_for_duration: f64,
    /// Weekly total ÷ delivery days per week
    pub price_per_day: f64,
}

/// Rounds to 2 decimal places, half away from zero (half-up for prices).
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes a price quote for a selection.
///
/// # Errors
/// - `Error::InvalidSelection` for an out-of-range selection.
/// - `Error::MealTypePriceNotFound` when a requested meal type has no base
///   price in the plan.
/// - `Error::MalformedDiscountRule` when an active rule carries a percentage
///   outside `[0, 1]` - a configuration defect, never silently ignored.
pub fn price(
    plan_name: &str,
    selection: &Selection,
    rules: &[discount_rule::Model],
    base_prices: &BTreeMap<String, f64>,
) -> Result<PriceQuote> {
    validate_selection(selection)?;

    // Weekly subtotal per meal type; a meal type listed twice counts twice
    let mut weekly_subtotals: BTreeMap<String, f64> = BTreeMap::new();
    for meal_type in &selection.meal_types_per_day {
        let base = base_prices
            .get(meal_type)
            .ok_or_else(|| Error::MealTypePriceNotFound {
                plan: plan_name.to_string(),
                meal_type: meal_type.clone(),
            })?;
        *weekly_subtotals.entry(meal_type.clone()).or_insert(0.0) +=
            f64::from(selection.days_per_week) * base;
    }
    let subtotal: f64 = weekly_subtotals.values().sum();

    // Deterministic evaluation order regardless of how the rules arrived
    let mut ordered: Vec<&discount_rule::Model> = rules.iter().filter(|r| r.active).collect();
    ordered.sort_by_key(|r| (r.kind, r.id));

    let mut stacked_fraction = 0.0;
    let mut stacked_rules = Vec::new();
    let mut best_exclusive: Option<&discount_rule::Model> = None;

    for rule in ordered {
        if !(0.0..=1.0).contains(&rule.discount_percentage) {
            return Err(Error::MalformedDiscountRule {
                rule_id: rule.id,
                message: format!("discount percentage {} out of [0, 1]", rule.discount_percentage),
            });
        }

        let field = match rule.kind {
            DiscountRuleKind::DaysPerWeekThreshold => selection.days_per_week,
            DiscountRuleKind::DurationWeeksThreshold => selection.duration_weeks,
        };
        if i64::from(field) < i64::from(rule.condition_value) {
            continue;
        }

        if rule.stackable {
            stacked_fraction += rule.discount_percentage;
            stacked_rules.push(rule);
        } else if best_exclusive.is_none_or(|b| rule.discount_percentage > b.discount_percentage) {
            best_exclusive = Some(rule);
        }
    }

    // Customer-favorable precedence: the stacked sum competes with the single
    // best non-stackable rule, ties going to the stacked sum
    let (discount_fraction, applied): (f64, Vec<AppliedDiscount>) = match best_exclusive {
        Some(exclusive) if exclusive.discount_percentage > stacked_fraction => (
            exclusive.discount_percentage,
            vec![to_applied(exclusive)],
        ),
        _ => (
            stacked_fraction,
            stacked_rules.iter().map(|r| to_applied(r)).collect(),
        ),
    };
    let discount_fraction = discount_fraction.min(1.0);

    let weekly_total = round2(subtotal * (1.0 - discount_fraction));
    let total_for_duration = round2(weekly_total * f64::from(selection.duration_weeks));
    let price_per_day = round2(weekly_total / f64::from(selection.days_per_week));

    Ok(PriceQuote {
        weekly_subtotals,
        applied,
        discount_fraction,
        weekly_total,
        total_for_duration,
        price_per_day,
    })
}

fn to_applied(rule: &discount_rule::Model) -> AppliedDiscount {
    AppliedDiscount {
        rule_id: rule.id,
        kind: rule.kind,
        percentage: rule.discount_percentage,
        stackable: rule.stackable,
    }
}

fn validate_selection(selection: &Selection) -> Result<()> {
    if !(1..=7).contains(&selection.days_per_week) {
        return Err(Error::InvalidSelection {
            message: format!("days_per_week must be 1-7, got {}", selection.days_per_week),
        });
    }
    if selection.duration_weeks < 1 {
        return Err(Error::InvalidSelection {
            message: "duration_weeks must be at least 1".to_string(),
        });
    }
    if selection.meal_types_per_day.is_empty() {
        return Err(Error::InvalidSelection {
            message: "at least one meal type is required".to_string(),
        });
    }
    Ok(())
}
