//! Pricing seed configuration loading from config.toml
//!
//! Plans (with per-meal base prices) and discount rules are process-wide
//! configuration, defined in a TOML file and seeded into the database at
//! startup. Seeding inserts by natural key - (plan, meal type) for prices,
//! (kind, condition) for rules - so running it again is a no-op.

use crate::{
    entities::{
        DiscountRule, DiscountRuleKind, MealTypePrice, discount_rule, meal_type_price,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct PricingConfig {
    /// Plan variants with their per-meal base prices
    pub plans: Vec<PlanConfig>,
    /// Discount rules to seed
    #[serde(default)]
    pub discount_rules: Vec<DiscountRuleConfig>,
}

/// Base prices for one plan variant
#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    /// Plan name (keys the price rows)
    pub name: String,
    /// Base price per meal type
    pub meal_prices: BTreeMap<String, f64>,
}

/// One discount rule definition
#[derive(Debug, Deserialize, Clone)]
pub struct DiscountRuleConfig {
    /// Which selection field the condition applies to
    pub kind: DiscountRuleKind,
    /// Threshold ("at least N")
    pub condition_value: i32,
    /// Fraction in [0, 1]
    pub discount_percentage: f64,
    /// Whether the rule stacks with other stackable rules
    pub stackable: bool,
    /// Defaults to active
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Summary of what a seeding pass inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Price rows inserted (existing natural keys skipped)
    pub prices_inserted: usize,
    /// Rule rows inserted (existing natural keys skipped)
    pub rules_inserted: usize,
}

/// Loads pricing configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or a
/// rule carries a percentage outside [0, 1].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PricingConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: PricingConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Loads pricing configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<PricingConfig> {
    load_config("config.toml")
}

fn validate(config: &PricingConfig) -> Result<()> {
    for rule in &config.discount_rules {
        if !(0.0..=1.0).contains(&rule.discount_percentage) {
            return Err(Error::Config {
                message: format!(
                    "discount rule ({:?}, {}) has percentage {} outside [0, 1]",
                    rule.kind, rule.condition_value, rule.discount_percentage
                ),
            });
        }
    }
    for plan in &config.plans {
        if plan.meal_prices.is_empty() {
            return Err(Error::Config {
                message: format!("plan '{}' has no meal prices", plan.name),
            });
        }
    }
    Ok(())
}

/// Seeds base prices and discount rules, skipping rows whose natural key
/// already exists.
pub async fn seed_pricing(
    db: &DatabaseConnection,
    config: &PricingConfig,
) -> Result<SeedSummary> {
    let mut prices_inserted = 0;
    for plan in &config.plans {
        for (meal_type, base_price) in &plan.meal_prices {
            let existing = MealTypePrice::find()
                .filter(meal_type_price::Column::PlanName.eq(&plan.name))
                .filter(meal_type_price::Column::MealType.eq(meal_type))
                .one(db)
                .await?;
            if existing.is_some() {
                continue;
            }

            meal_type_price::ActiveModel {
                plan_name: Set(plan.name.clone()),
                meal_type: Set(meal_type.clone()),
                base_price: Set(*base_price),
                active: Set(true),
                ..Default::default()
            }
            .insert(db)
            .await?;
            prices_inserted += 1;
        }
    }

    let mut rules_inserted = 0;
    for rule in &config.discount_rules {
        let existing = DiscountRule::find()
            .filter(discount_rule::Column::Kind.eq(rule.kind))
            .filter(discount_rule::Column::ConditionValue.eq(rule.condition_value))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        discount_rule::ActiveModel {
            kind: Set(rule.kind),
            condition_value: Set(rule.condition_value),
            discount_percentage: Set(rule.discount_percentage),
            stackable: Set(rule.stackable),
            active: Set(rule.active),
            ..Default::default()
        }
        .insert(db)
        .await?;
        rules_inserted += 1;
    }

    info!(prices_inserted, rules_inserted, "pricing configuration seeded");

    Ok(SeedSummary {
        prices_inserted,
        rules_inserted,
    })
}
