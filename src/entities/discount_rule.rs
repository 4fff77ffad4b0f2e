//! Discount rule entity - a configured condition contributing a percentage
//! reduction to a subscription's weekly price.
//!
//! Rules are process-wide configuration, seeded from `config.toml` and
//! read-only from the pricing engine's perspective. Inactive rules never
//! participate in evaluation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which selection field a rule's condition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum DiscountRuleKind {
    /// Fires when the selection's delivery days per week reach the threshold
    #[sea_orm(string_value = "days_per_week_threshold")]
    DaysPerWeekThreshold,
    /// Fires when the selection's duration in weeks reaches the threshold
    #[sea_orm(string_value = "duration_weeks_threshold")]
    DurationWeeksThreshold,
}

/// Discount rule database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discount_rules")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Selection field the condition applies to
    pub kind: DiscountRuleKind,
    /// Threshold the selection field is compared against ("at least N")
    pub condition_value: i32,
    /// Discount as a fraction in [0, 1]
    pub discount_percentage: f64,
    /// Whether this rule's percentage sums with other stackable rules
    pub stackable: bool,
    /// Inactive rules are ignored by the pricing engine
    pub active: bool,
}

/// `DiscountRule` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
