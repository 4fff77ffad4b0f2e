//! Pause/resume controller - the subscription lifecycle state machine.
//!
//! A subscription gets exactly one pause per lifetime, requested with at
//! least 72 hours notice and lasting at most 21 days. All preconditions are
//! checked before any write, and the mutation itself (subscription status +
//! window + delivery statuses) happens inside one database transaction whose
//! status update is guarded by the expected current state - a concurrent
//! pause or resume on the same subscription therefore loses with a conflict
//! instead of silently double-applying.

use crate::{
    entities::{DeliveryStatus, PauseWindow, SubscriptionState, SubscriptionStatus},
    errors::{Error, Result},
    store,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

/// Minimum notice between the request and the start of the pause window.
pub const MIN_PAUSE_NOTICE_HOURS: i64 = 72;

/// Maximum pause window length.
pub const MAX_PAUSE_DAYS: i64 = 21;

/// Result of a successful pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseOutcome {
    /// Scheduled deliveries inside the window that were suspended
    pub paused_deliveries: u64,
}

/// Result of a successful resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    /// Paused future deliveries that were put back on the schedule
    pub resumed_deliveries: u64,
}

/// Pauses an active subscription for the given window.
///
/// Preconditions, each failing with its own reason and leaving all rows
/// unchanged: the subscription exists and is active, its lifetime pause
/// allowance is unused, the window starts at least 72h from `now` (boundary
/// inclusive), ends after it starts, and spans at most 21 days (boundary
/// inclusive).
///
/// On success the subscription is `Paused` with the window recorded, the
/// allowance is consumed for good, and every `scheduled` delivery dated
/// inside the window becomes `paused`.
pub async fn pause(
    db: &DatabaseConnection,
    subscription_id: i64,
    pause_start: DateTime<Utc>,
    pause_end: DateTime<Utc>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<PauseOutcome> {
    // All checks and writes share one transaction; dropping it on an early
    // return rolls everything back
    let txn = db.begin().await?;

    let subscription = store::get_subscription(&txn, subscription_id).await?;
    match subscription.state()? {
        SubscriptionState::Active => {}
        SubscriptionState::Paused(_) => return Err(Error::AlreadyPaused { id: subscription_id }),
        SubscriptionState::Canceled | SubscriptionState::Expired => {
            return Err(Error::NotActive { id: subscription_id });
        }
    }
    if subscription.pause_used {
        return Err(Error::AlreadyPaused { id: subscription_id });
    }

    let notice = pause_start - now;
    if notice < Duration::hours(MIN_PAUSE_NOTICE_HOURS) {
        return Err(Error::InsufficientNotice {
            required_hours: MIN_PAUSE_NOTICE_HOURS,
            actual_hours: notice.num_hours(),
        });
    }
    if pause_end <= pause_start {
        return Err(Error::InvalidPauseWindow);
    }
    if pause_end - pause_start > Duration::days(MAX_PAUSE_DAYS) {
        return Err(Error::PauseTooLong { max_days: MAX_PAUSE_DAYS });
    }

    let window = PauseWindow {
        start: pause_start,
        end: pause_end,
        reason,
    };
    let affected = store::update_subscription_status(
        &txn,
        subscription_id,
        SubscriptionStatus::Active,
        SubscriptionStatus::Paused,
        Some(&window),
    )
    .await?;
    if affected != 1 {
        // The row passed the checks above but the guarded update missed:
        // a concurrent pause or resume won the race
        return Err(Error::Conflict { id: subscription_id });
    }

    let paused_deliveries = store::update_delivery_statuses(
        &txn,
        subscription_id,
        pause_start.date_naive(),
        Some(pause_end.date_naive()),
        DeliveryStatus::Scheduled,
        DeliveryStatus::Paused,
    )
    .await?;

    txn.commit().await?;

    info!(
        subscription_id,
        paused_deliveries,
        pause_start = %pause_start,
        pause_end = %pause_end,
        "subscription paused"
    );

    Ok(PauseOutcome { paused_deliveries })
}

/// Resumes a paused subscription.
///
/// The pause window is cleared (the consumed allowance marker stays set) and
/// every `paused` delivery dated today or later goes back to `scheduled`.
/// Past paused deliveries stay as they are.
pub async fn resume(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<ResumeOutcome> {
    let txn = db.begin().await?;

    let subscription = store::get_subscription(&txn, subscription_id).await?;
    match subscription.state()? {
        SubscriptionState::Paused(_) => {}
        SubscriptionState::Active | SubscriptionState::Canceled | SubscriptionState::Expired => {
            return Err(Error::NotPaused { id: subscription_id });
        }
    }

    let affected = store::update_subscription_status(
        &txn,
        subscription_id,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Active,
        None,
    )
    .await?;
    if affected != 1 {
        return Err(Error::Conflict { id: subscription_id });
    }

    let resumed_deliveries = store::update_delivery_statuses(
        &txn,
        subscription_id,
        now.date_naive(),
        None,
        DeliveryStatus::Paused,
        DeliveryStatus::Scheduled,
    )
    .await?;

    txn.commit().await?;

    info!(subscription_id, resumed_deliveries, "subscription resumed");

    Ok(ResumeOutcome { resumed_deliveries })
}

/// Read-only eligibility check used to gate UI affordances.
///
/// True iff the subscription is active, its pause allowance is unused, and
/// its next scheduled delivery is at least 72 hours away (measured against
/// midnight UTC of the delivery date). May be slightly stale under
/// concurrency; `pause` re-validates atomically.
pub async fn can_pause(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    let subscription = store::get_subscription(db, subscription_id).await?;
    if subscription.pause_used || subscription.status != SubscriptionStatus::Active {
        return Ok(false);
    }

    let next = store::next_scheduled_delivery(db, subscription_id, now.date_naive()).await?;
    Ok(next.is_some_and(|delivery| {
        let delivery_start = delivery
            .delivery_date
            .and_time(NaiveTime::MIN)
            .and_utc();
        delivery_start >= now + Duration::hours(MIN_PAUSE_NOTICE_HOURS)
    }))
}
