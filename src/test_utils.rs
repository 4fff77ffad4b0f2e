//! Shared test fixtures.
//!
//! Every test runs against a fresh in-memory `SQLite` database and a fixed
//! clock (`test_now()` = 2030-01-01 00:00 UTC) so date arithmetic is
//! deterministic. The standard fixture subscription starts the following
//! Monday (2030-01-07) and delivers Mon/Wed/Fri for 4 weeks, giving 12
//! deliveries from 2030-01-07 through 2030-02-01.

#![allow(clippy::unwrap_used)]

use crate::{
    config::database::create_tables,
    core::subscription::{NewSubscription, create_subscription},
    entities::{DiscountRuleKind, discount_rule, meal_type_price, subscription},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

/// Connects to a fresh in-memory database with all tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// The fixed test clock: 2030-01-01 00:00:00 UTC.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

/// Inserts one meal-type price row.
pub async fn insert_meal_price(
    db: &DatabaseConnection,
    plan_name: &str,
    meal_type: &str,
    base_price: f64,
    active: bool,
) -> Result<meal_type_price::Model> {
    let model = meal_type_price::ActiveModel {
        plan_name: Set(plan_name.to_string()),
        meal_type: Set(meal_type.to_string()),
        base_price: Set(base_price),
        active: Set(active),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

/// Inserts one discount rule row.
pub async fn insert_discount_rule(
    db: &DatabaseConnection,
    kind: DiscountRuleKind,
    condition_value: i32,
    discount_percentage: f64,
    stackable: bool,
    active: bool,
) -> Result<discount_rule::Model> {
    let model = discount_rule::ActiveModel {
        kind: Set(kind),
        condition_value: Set(condition_value),
        discount_percentage: Set(discount_percentage),
        stackable: Set(stackable),
        active: Set(active),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

/// Seeds the "standard" plan (breakfast 45, lunch 60, dinner 70) and the two
/// stackable rules from the worked pricing example: ≥5 days/week → 3%,
/// ≥4 weeks → 5%.
pub async fn seed_standard_pricing(db: &DatabaseConnection) -> Result<()> {
    insert_meal_price(db, "standard", "breakfast", 45.0, true).await?;
    insert_meal_price(db, "standard", "lunch", 60.0, true).await?;
    insert_meal_price(db, "standard", "dinner", 70.0, true).await?;

    insert_discount_rule(db, DiscountRuleKind::DaysPerWeekThreshold, 5, 0.03, true, true).await?;
    insert_discount_rule(db, DiscountRuleKind::DurationWeeksThreshold, 4, 0.05, true, true).await?;

    Ok(())
}

/// The standard fixture request: breakfast + lunch, Mon/Wed/Fri, 4 weeks,
/// starting Monday 2030-01-07.
pub fn test_subscription_request() -> NewSubscription {
    NewSubscription {
        user_id: "test_user".to_string(),
        plan_name: "standard".to_string(),
        meal_types: vec!["breakfast".to_string(), "lunch".to_string()],
        delivery_weekdays: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
        duration_weeks: 4,
        starts_at: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
    }
}

/// Fresh database seeded with standard pricing plus one created fixture
/// subscription (12 scheduled deliveries).
pub async fn setup_with_subscription() -> Result<(DatabaseConnection, subscription::Model)> {
    let db = setup_test_db().await?;
    seed_standard_pricing(&db).await?;
    let created = create_subscription(&db, test_subscription_request()).await?;
    Ok((db, created.subscription))
}
