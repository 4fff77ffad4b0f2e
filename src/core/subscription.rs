//! Subscription orchestration - sequences the recurrence expander, the
//! pause/resume controller, and the pricing engine behind one surface.
//!
//! No business rules of its own: creation validates the plan variant once,
//! prices it, expands the schedule, and persists everything in a single
//! transaction; pause/resume/quote calls delegate and surface the component
//! results unchanged.

use crate::{
    core::{pause, pricing, recurrence},
    entities::{
        DeliveryStatus, DeliveryWeekdays, MealTypes, SubscriptionState, SubscriptionStatus,
        delivery, subscription,
    },
    errors::{Error, Result},
    store,
};
use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::info;

/// Parameters for creating a subscription. Validated once, here - the stored
/// row carries typed columns, never free-form notes to re-parse.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Owning user reference
    pub user_id: String,
    /// Plan variant keying the base prices
    pub plan_name: String,
    /// Meal types per delivery day
    pub meal_types: Vec<String>,
    /// Weekly delivery pattern
    pub delivery_weekdays: Vec<Weekday>,
    /// Duration in weeks
    pub duration_weeks: u32,
    /// First delivery-eligible date
    pub starts_at: NaiveDate,
}

/// A created subscription with its initial schedule and pricing.
#[derive(Debug, Clone)]
pub struct CreatedSubscription {
    /// The persisted subscription row
    pub subscription: subscription::Model,
    /// Number of delivery rows created
    pub scheduled_deliveries: u64,
    /// The quote its weekly price was fixed from
    pub quote: pricing::PriceQuote,
}

/// A subscription's delivery calendar plus the counters and pause
/// affordances the account page renders.
#[derive(Debug, Clone)]
pub struct ScheduleView {
    /// All deliveries, ordered by date
    pub deliveries: Vec<delivery::Model>,
    /// Total rows, any status
    pub total_deliveries: usize,
    /// Delivered rows
    pub completed_deliveries: usize,
    /// Scheduled rows (paused rows are neither pending nor completed)
    pub pending_deliveries: usize,
    /// Next scheduled delivery on or after today
    pub next_delivery_date: Option<NaiveDate>,
    /// Whether a pause request would currently be accepted
    pub can_pause: bool,
    /// Earliest date a pause window could start
    pub pause_eligible_date: NaiveDate,
}

/// Result of a renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalOutcome {
    /// Delivery rows appended by this renewal
    pub new_deliveries: u64,
    /// The advanced renewal date
    pub renews_at: NaiveDate,
}

/// Creates a subscription: prices the selection, expands the recurrence, and
/// persists the subscription row plus its delivery calendar atomically.
pub async fn create_subscription(
    db: &DatabaseConnection,
    request: NewSubscription,
) -> Result<CreatedSubscription> {
    let weekday_pattern = DeliveryWeekdays::from_weekdays(&request.delivery_weekdays);
    let weekdays = weekday_pattern.to_weekdays()?;
    let days_per_week = weekdays.len() as u32;

    let selection = pricing::Selection {
        days_per_week,
        duration_weeks: request.duration_weeks,
        meal_types_per_day: request.meal_types.clone(),
    };
    let quote = quote_price(db, &request.plan_name, &selection).await?;

    let dates = recurrence::expand(request.starts_at, &weekdays, request.duration_weeks)?;

    let txn = db.begin().await?;

    let renews_at = request.starts_at + Duration::weeks(i64::from(request.duration_weeks));
    let model = subscription::ActiveModel {
        user_id: Set(request.user_id),
        plan_name: Set(request.plan_name),
        days_per_week: Set(days_per_week as i32),
        meals_per_day: Set(request.meal_types.len() as i32),
        duration_weeks: Set(request.duration_weeks as i32),
        weekly_price: Set(quote.weekly_total),
        meal_types: Set(MealTypes(request.meal_types)),
        delivery_weekdays: Set(weekday_pattern),
        status: Set(SubscriptionStatus::Active),
        starts_at: Set(request.starts_at),
        renews_at: Set(Some(renews_at)),
        pause_start: Set(None),
        pause_end: Set(None),
        pause_reason: Set(None),
        pause_used: Set(false),
        ..Default::default()
    };
    let created = model.insert(&txn).await?;

    let scheduled_deliveries = store::bulk_insert_deliveries(&txn, created.id, &dates).await?;

    txn.commit().await?;

    info!(
        subscription_id = created.id,
        scheduled_deliveries,
        weekly_price = quote.weekly_total,
        "subscription created"
    );

    Ok(CreatedSubscription {
        subscription: created,
        scheduled_deliveries,
        quote,
    })
}

/// Pauses a subscription; delegates entirely to the controller.
pub async fn pause_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    pause_start: DateTime<Utc>,
    pause_end: DateTime<Utc>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<pause::PauseOutcome> {
    pause::pause(db, subscription_id, pause_start, pause_end, reason, now).await
}

/// Resumes a subscription; delegates entirely to the controller.
pub async fn resume_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<pause::ResumeOutcome> {
    pause::resume(db, subscription_id, now).await
}

/// Builds the delivery calendar view for a subscription.
pub async fn delivery_schedule(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<ScheduleView> {
    // Validates existence up front so a bad id is a not-found, not an empty view
    let _subscription = store::get_subscription(db, subscription_id).await?;

    let deliveries = store::list_deliveries(db, subscription_id).await?;
    let today = now.date_naive();

    let completed_deliveries = deliveries
        .iter()
        .filter(|d| d.status == DeliveryStatus::Delivered)
        .count();
    let pending_deliveries = deliveries
        .iter()
        .filter(|d| d.status == DeliveryStatus::Scheduled)
        .count();
    let next_delivery_date = deliveries
        .iter()
        .find(|d| d.status == DeliveryStatus::Scheduled && d.delivery_date >= today)
        .map(|d| d.delivery_date);

    let can_pause = pause::can_pause(db, subscription_id, now).await?;
    let pause_eligible_date = (now + Duration::hours(pause::MIN_PAUSE_NOTICE_HOURS)).date_naive();

    Ok(ScheduleView {
        total_deliveries: deliveries.len(),
        completed_deliveries,
        pending_deliveries,
        next_delivery_date,
        can_pause,
        pause_eligible_date,
        deliveries,
    })
}

/// Prices a selection against a plan's base prices and the active rules.
pub async fn quote_price(
    db: &DatabaseConnection,
    plan_name: &str,
    selection: &pricing::Selection,
) -> Result<pricing::PriceQuote> {
    let base_prices = store::get_meal_type_base_prices(db, plan_name).await?;
    if base_prices.is_empty() {
        return Err(Error::PlanNotFound {
            plan: plan_name.to_string(),
        });
    }
    let rules = store::list_active_discount_rules(db).await?;

    pricing::price(plan_name, selection, &rules, &base_prices)
}

/// Extends an active subscription by one configured duration, appending
/// deliveries after the current schedule and advancing `renews_at`. Re-running
/// a renewal for dates that already exist inserts nothing (idempotent).
pub async fn renew_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<RenewalOutcome> {
    let txn = db.begin().await?;

    let subscription = store::get_subscription(&txn, subscription_id).await?;
    if subscription.state()? != SubscriptionState::Active {
        return Err(Error::NotActive { id: subscription_id });
    }

    let weekdays = subscription.delivery_weekdays.to_weekdays()?;
    let weeks = u32::try_from(subscription.duration_weeks).map_err(|_| Error::CorruptState {
        message: format!(
            "subscription {subscription_id} has negative duration_weeks {}",
            subscription.duration_weeks
        ),
    })?;

    let existing = store::list_deliveries(&txn, subscription_id).await?;
    let start = existing
        .last()
        .map_or_else(|| now.date_naive(), |d| d.delivery_date + Duration::days(1));

    let dates = recurrence::expand(start, &weekdays, weeks)?;
    let new_deliveries = store::bulk_insert_deliveries(&txn, subscription_id, &dates).await?;

    let renews_at = start + Duration::weeks(i64::from(weeks));
    let mut model: subscription::ActiveModel = subscription.into();
    model.renews_at = Set(Some(renews_at));
    model.update(&txn).await?;

    txn.commit().await?;

    info!(subscription_id, new_deliveries, %renews_at, "subscription renewed");

    Ok(RenewalOutcome {
        new_deliveries,
        renews_at,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{
        seed_standard_pricing, setup_test_db, setup_with_subscription, test_now,
        test_subscription_request,
    };
    use sea_orm::ActiveModelTrait;

    #[tokio::test]
    async fn test_create_subscription_persists_typed_variant() -> Result<()> {
        let db = setup_test_db().await?;
        seed_standard_pricing(&db).await?;

        let created = create_subscription(&db, test_subscription_request()).await?;
        let sub = &created.subscription;

        assert_eq!(sub.days_per_week, 3);
        assert_eq!(sub.meals_per_day, 2);
        assert_eq!(sub.duration_weeks, 4);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.pause_used);
        // 3 days × (45 + 60) = 315/week; duration rule (≥4 weeks, 5%) fires
        assert_eq!(created.quote.discount_fraction, 0.05);
        assert_eq!(sub.weekly_price, 299.25);

        // Renewal date is one full duration past the start
        assert_eq!(
            sub.renews_at,
            Some(sub.starts_at + Duration::weeks(4))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_subscription_expands_full_calendar() -> Result<()> {
        let db = setup_test_db().await?;
        seed_standard_pricing(&db).await?;

        let created = create_subscription(&db, test_subscription_request()).await?;
        assert_eq!(created.scheduled_deliveries, 12); // 4 weeks × Mon/Wed/Fri

        let deliveries = store::list_deliveries(&db, created.subscription.id).await?;
        assert_eq!(deliveries.len(), 12);
        assert!(
            deliveries
                .iter()
                .all(|d| d.status == DeliveryStatus::Scheduled)
        );
        for pair in deliveries.windows(2) {
            assert!(pair[0].delivery_date < pair[1].delivery_date);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_create_subscription_unknown_plan() -> Result<()> {
        let db = setup_test_db().await?;

        let mut request = test_subscription_request();
        request.plan_name = "no_such_plan".to_string();

        let result = create_subscription(&db, request).await;
        assert!(matches!(result.unwrap_err(), Error::PlanNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_schedule_counts_and_next_date() -> Result<()> {
        let (db, sub) = setup_with_subscription().await?;

        // Mark the first delivery as fulfilled, the way the external
        // fulfillment process would
        let deliveries = store::list_deliveries(&db, sub.id).await?;
        let mut first: delivery::ActiveModel = deliveries[0].clone().into();
        first.status = Set(DeliveryStatus::Delivered);
        first.update(&db).await?;

        let view = delivery_schedule(&db, sub.id, test_now()).await?;
        assert_eq!(view.total_deliveries, 12);
        assert_eq!(view.completed_deliveries, 1);
        assert_eq!(view.pending_deliveries, 11);
        assert_eq!(view.next_delivery_date, Some(deliveries[1].delivery_date));
        assert!(view.can_pause);
        assert_eq!(
            view.pause_eligible_date,
            (test_now() + Duration::hours(72)).date_naive()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_schedule_unknown_subscription() -> Result<()> {
        let db = setup_test_db().await?;

        let result = delivery_schedule(&db, 42, test_now()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SubscriptionNotFound { id: 42 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_quote_price_wires_rules_and_prices() -> Result<()> {
        let db = setup_test_db().await?;
        seed_standard_pricing(&db).await?;

        let selection = pricing::Selection {
            days_per_week: 5,
            duration_weeks: 4,
            meal_types_per_day: vec!["breakfast".to_string(), "lunch".to_string()],
        };
        let quote = quote_price(&db, "standard", &selection).await?;

        // Spec example: 525/week, 3% + 5% stacked
        assert_eq!(quote.discount_fraction, 0.08);
        assert_eq!(quote.weekly_total, 483.0);
        assert_eq!(quote.total_for_duration, 1932.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_renew_appends_without_duplicates() -> Result<()> {
        let (db, sub) = setup_with_subscription().await?;

        let outcome = renew_subscription(&db, sub.id, test_now()).await?;
        assert_eq!(outcome.new_deliveries, 12);

        let deliveries = store::list_deliveries(&db, sub.id).await?;
        assert_eq!(deliveries.len(), 24);

        // Renewal picks up the day after the last delivery; no overlap
        let mut dates: Vec<_> = deliveries.iter().map(|d| d.delivery_date).collect();
        dates.dedup();
        assert_eq!(dates.len(), 24);

        let updated = store::get_subscription(&db, sub.id).await?;
        assert_eq!(updated.renews_at, Some(outcome.renews_at));

        Ok(())
    }

    #[tokio::test]
    async fn test_renew_requires_active_subscription() -> Result<()> {
        let (db, sub) = setup_with_subscription().await?;
        let now = test_now();

        let start = now + Duration::hours(72);
        pause_subscription(&db, sub.id, start, start + Duration::days(7), None, now).await?;

        let result = renew_subscription(&db, sub.id, now).await;
        assert!(matches!(result.unwrap_err(), Error::NotActive { .. }));

        Ok(())
    }
}
