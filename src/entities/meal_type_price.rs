//! Meal type price entity - per-plan base price for a single meal type.
//!
//! Logically unique on (`plan_name`, `meal_type`); the seeder inserts by that
//! natural key and the store builds a map keyed on meal type, so a stray
//! duplicate row can never double-charge a quote.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meal type price database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_type_prices")]
pub struct Model {
    /// Unique identifier for the price row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plan variant this price belongs to
    pub plan_name: String,
    /// Meal type (e.g., "breakfast", "lunch", "dinner")
    pub meal_type: String,
    /// Base price per meal per delivery day
    pub base_price: f64,
    /// Inactive prices are excluded from quoting
    pub active: bool,
}

/// `MealTypePrice` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
