//! Persistence collaborator - the narrow query/update surface the core
//! components use.
//!
//! Every function is generic over [`ConnectionTrait`] so the pause/resume
//! controller can run them inside a database transaction. Mutations that
//! guard a state machine (subscription status, delivery statuses) are single
//! conditional `UPDATE` statements, so a losing concurrent writer shows up as
//! zero affected rows instead of a silently lost update.

use crate::{
    entities::{
        Delivery, DeliveryStatus, DiscountRule, MealTypePrice, PauseWindow, Subscription,
        SubscriptionStatus, delivery, discount_rule, meal_type_price, subscription,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use std::collections::{BTreeMap, BTreeSet};

/// Fetches a subscription by id, reporting a named not-found failure.
pub async fn get_subscription<C>(db: &C, id: i64) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    Subscription::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::SubscriptionNotFound { id })
}

/// All deliveries of a subscription, ordered by date ascending.
pub async fn list_deliveries<C>(db: &C, subscription_id: i64) -> Result<Vec<delivery::Model>>
where
    C: ConnectionTrait,
{
    Delivery::find()
        .filter(delivery::Column::SubscriptionId.eq(subscription_id))
        .order_by_asc(delivery::Column::DeliveryDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The earliest `scheduled` delivery on or after `from`, if any.
pub async fn next_scheduled_delivery<C>(
    db: &C,
    subscription_id: i64,
    from: NaiveDate,
) -> Result<Option<delivery::Model>>
where
    C: ConnectionTrait,
{
    Delivery::find()
        .filter(delivery::Column::SubscriptionId.eq(subscription_id))
        .filter(delivery::Column::Status.eq(DeliveryStatus::Scheduled))
        .filter(delivery::Column::DeliveryDate.gte(from))
        .order_by_asc(delivery::Column::DeliveryDate)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts delivery rows for the given dates, skipping dates the subscription
/// already has. Returns the number of rows actually inserted, making repeated
/// expansion of the same recurrence a no-op.
pub async fn bulk_insert_deliveries<C>(
    db: &C,
    subscription_id: i64,
    dates: &[NaiveDate],
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let existing: BTreeSet<NaiveDate> = list_deliveries(db, subscription_id)
        .await?
        .into_iter()
        .map(|d| d.delivery_date)
        .collect();

    let missing: Vec<delivery::ActiveModel> = dates
        .iter()
        .filter(|date| !existing.contains(date))
        .map(|date| delivery::ActiveModel {
            subscription_id: Set(subscription_id),
            delivery_date: Set(*date),
            status: Set(DeliveryStatus::Scheduled),
            ..Default::default()
        })
        .collect();

    if missing.is_empty() {
        return Ok(0);
    }

    let inserted = missing.len() as u64;
    Delivery::insert_many(missing).exec(db).await?;
    Ok(inserted)
}

/// Moves deliveries of one subscription from one status to another within a
/// date range (`to_date` of `None` means open-ended). A single conditional
/// `UPDATE`, so terminal rows (delivered/skipped) are never touched.
/// Returns the number of rows transitioned.
pub async fn update_delivery_statuses<C>(
    db: &C,
    subscription_id: i64,
    from_date: NaiveDate,
    to_date: Option<NaiveDate>,
    from_status: DeliveryStatus,
    to_status: DeliveryStatus,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut update = Delivery::update_many()
        .col_expr(delivery::Column::Status, Expr::value(to_status))
        .filter(delivery::Column::SubscriptionId.eq(subscription_id))
        .filter(delivery::Column::Status.eq(from_status))
        .filter(delivery::Column::DeliveryDate.gte(from_date));

    if let Some(to_date) = to_date {
        update = update.filter(delivery::Column::DeliveryDate.lte(to_date));
    }

    let result = update.exec(db).await?;
    Ok(result.rows_affected)
}

/// Transitions a subscription's status with an optimistic guard on the status
/// it is expected to currently have.
///
/// With a window this is the pause write: the window columns are set, the
/// lifetime `pause_used` marker is consumed, and the update additionally
/// requires the marker to still be unset. Without a window the columns are
/// cleared (the marker is left alone - it is monotonic).
///
/// Returns the number of affected rows; `0` means a concurrent writer got
/// there first and the caller must report a conflict, not retry.
pub async fn update_subscription_status<C>(
    db: &C,
    id: i64,
    expected_status: SubscriptionStatus,
    new_status: SubscriptionStatus,
    window: Option<&PauseWindow>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut update = Subscription::update_many()
        .col_expr(subscription::Column::Status, Expr::value(new_status))
        .filter(subscription::Column::Id.eq(id))
        .filter(subscription::Column::Status.eq(expected_status));

    match window {
        Some(window) => {
            update = update
                .col_expr(
                    subscription::Column::PauseStart,
                    Expr::value(Some(window.start)),
                )
                .col_expr(subscription::Column::PauseEnd, Expr::value(Some(window.end)))
                .col_expr(
                    subscription::Column::PauseReason,
                    Expr::value(window.reason.clone()),
                )
                .col_expr(subscription::Column::PauseUsed, Expr::value(true))
                .filter(subscription::Column::PauseUsed.eq(false));
        }
        None => {
            update = update
                .col_expr(
                    subscription::Column::PauseStart,
                    Expr::value(None::<DateTime<Utc>>),
                )
                .col_expr(
                    subscription::Column::PauseEnd,
                    Expr::value(None::<DateTime<Utc>>),
                )
                .col_expr(
                    subscription::Column::PauseReason,
                    Expr::value(None::<String>),
                );
        }
    }

    let result = update.exec(db).await?;
    Ok(result.rows_affected)
}

/// Active discount rules in their deterministic evaluation order
/// (kind, then id).
pub async fn list_active_discount_rules<C>(db: &C) -> Result<Vec<discount_rule::Model>>
where
    C: ConnectionTrait,
{
    DiscountRule::find()
        .filter(discount_rule::Column::Active.eq(true))
        .order_by_asc(discount_rule::Column::Kind)
        .order_by_asc(discount_rule::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active base prices for one plan, keyed by meal type.
pub async fn get_meal_type_base_prices<C>(
    db: &C,
    plan_name: &str,
) -> Result<BTreeMap<String, f64>>
where
    C: ConnectionTrait,
{
    let rows = MealTypePrice::find()
        .filter(meal_type_price::Column::PlanName.eq(plan_name))
        .filter(meal_type_price::Column::Active.eq(true))
        .order_by_asc(meal_type_price::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.meal_type, row.base_price))
        .collect())
}
