//! Web-boundary shapes - method-agnostic request/response types and the
//! translation of core failures into stable reason codes.
//!
//! No business logic lives here: each function delegates to the orchestrator
//! and maps the outcome. Validation failures surface their specific reason
//! code; internal defects all collapse to `"internal"` so database errors and
//! rule contents never reach a caller.

use crate::{
    core::{pricing, subscription as orchestrator},
    entities::DeliveryStatus,
    errors::Error,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Pause request body.
#[derive(Debug, Clone, Deserialize)]
pub struct PauseRequest {
    /// Subscription to pause
    pub subscription_id: i64,
    /// Start of the pause window
    pub pause_start: DateTime<Utc>,
    /// End of the pause window
    pub pause_end: DateTime<Utc>,
    /// Optional reason shown back to the subscriber
    pub reason: Option<String>,
}

/// Result of a pause or resume request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    /// Whether the request was applied
    pub ok: bool,
    /// Reason code when it was not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    fn applied() -> Self {
        Self { ok: true, error: None }
    }

    fn rejected(err: &Error) -> Self {
        if err.reason_code() == "internal" {
            warn!(error = %err, "internal failure surfaced as generic reason code");
        }
        Self {
            ok: false,
            error: Some(err.reason_code().to_string()),
        }
    }
}

/// Generic error body for the read endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Stable reason code
    pub error: String,
}

impl From<Error> for ErrorResponse {
    fn from(err: Error) -> Self {
        if err.reason_code() == "internal" {
            warn!(error = %err, "internal failure surfaced as generic reason code");
        }
        Self {
            error: err.reason_code().to_string(),
        }
    }
}

/// One delivery in the schedule response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryView {
    /// Calendar date
    pub date: NaiveDate,
    /// Current status
    pub status: DeliveryStatus,
}

/// Delivery schedule response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleResponse {
    /// All deliveries, ordered by date
    pub deliveries: Vec<DeliveryView>,
    /// Total rows, any status
    pub total_deliveries: usize,
    /// Delivered rows
    pub completed_deliveries: usize,
    /// Scheduled rows
    pub pending_deliveries: usize,
    /// Next scheduled delivery on or after today
    pub next_delivery_date: Option<NaiveDate>,
    /// Whether a pause request would currently be accepted
    pub can_pause: bool,
    /// Earliest date a pause window could start
    pub pause_eligible_date: NaiveDate,
}

/// Price quote request body.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    /// Plan variant to price against
    pub plan_name: String,
    /// Delivery days per week
    pub days_per_week: u32,
    /// Duration in weeks
    pub duration_weeks: u32,
    /// Meal types per delivery day
    pub meal_types: Vec<String>,
}

/// Price quote response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResponse {
    /// Weekly subtotal per meal type
    pub weekly_totals: BTreeMap<String, f64>,
    /// Rules that contributed to the discount
    pub discounts: Vec<pricing::AppliedDiscount>,
    /// Total discount fraction applied
    pub discount_fraction: f64,
    /// Weekly total after discount
    pub weekly_total: f64,
    /// Weekly total × duration
    pub total_for_duration: f64,
    /// Weekly total ÷ delivery days
    pub price_per_day: f64,
}

/// Handles a pause request.
pub async fn pause(
    db: &DatabaseConnection,
    request: &PauseRequest,
    now: DateTime<Utc>,
) -> ActionResponse {
    match orchestrator::pause_subscription(
        db,
        request.subscription_id,
        request.pause_start,
        request.pause_end,
        request.reason.clone(),
        now,
    )
    .await
    {
        Ok(_) => ActionResponse::applied(),
        Err(err) => ActionResponse::rejected(&err),
    }
}

/// Handles a resume request.
pub async fn resume(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> ActionResponse {
    match orchestrator::resume_subscription(db, subscription_id, now).await {
        Ok(_) => ActionResponse::applied(),
        Err(err) => ActionResponse::rejected(&err),
    }
}

/// Handles a delivery-schedule query.
pub async fn delivery_schedule(
    db: &DatabaseConnection,
    subscription_id: i64,
    now: DateTime<Utc>,
) -> Result<ScheduleResponse, ErrorResponse> {
    let view = orchestrator::delivery_schedule(db, subscription_id, now).await?;

    Ok(ScheduleResponse {
        deliveries: view
            .deliveries
            .iter()
            .map(|d| DeliveryView {
                date: d.delivery_date,
                status: d.status,
            })
            .collect(),
        total_deliveries: view.total_deliveries,
        completed_deliveries: view.completed_deliveries,
        pending_deliveries: view.pending_deliveries,
        next_delivery_date: view.next_delivery_date,
        can_pause: view.can_pause,
        pause_eligible_date: view.pause_eligible_date,
    })
}

/// Handles a price-quote query.
pub async fn price_quote(
    db: &DatabaseConnection,
    request: &QuoteRequest,
) -> Result<QuoteResponse, ErrorResponse> {
    let selection = pricing::Selection {
        days_per_week: request.days_per_week,
        duration_weeks: request.duration_weeks,
        meal_types_per_day: request.meal_types.clone(),
    };
    let quote = orchestrator::quote_price(db, &request.plan_name, &selection).await?;

    Ok(QuoteResponse {
        weekly_totals: quote.weekly_subtotals,
        discounts: quote.applied,
        discount_fraction: quote.discount_fraction,
        weekly_total: quote.weekly_total,
        total_for_duration: quote.total_for_duration,
        price_per_day: quote.price_per_day,
    })
}
