//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{Delivery, DiscountRule, MealTypePrice, Subscription};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/mealsub.sqlite".to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(&get_database_url()).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions. Safe to call repeatedly:
/// each statement carries IF NOT EXISTS.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut subscription_table = schema.create_table_from_entity(Subscription);
    let mut delivery_table = schema.create_table_from_entity(Delivery);
    let mut discount_rule_table = schema.create_table_from_entity(DiscountRule);
    let mut meal_type_price_table = schema.create_table_from_entity(MealTypePrice);

    db.execute(builder.build(subscription_table.if_not_exists()))
        .await?;
    db.execute(builder.build(delivery_table.if_not_exists())).await?;
    db.execute(builder.build(discount_rule_table.if_not_exists()))
        .await?;
    db.execute(builder.build(meal_type_price_table.if_not_exists()))
        .await?;

    Ok(())
}
