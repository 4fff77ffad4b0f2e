//! Unified error types for the scheduling and pricing core.
//!
//! Every precondition violation is a distinct variant so callers (and the web
//! boundary) can react to the exact rule that failed. `reason_code` maps each
//! variant to the stable code surfaced over the wire; internal defects all map
//! to `"internal"` so rule contents and database details never leak.

use thiserror::Error;

/// All failures the crate can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("subscription {id} not found")]
    SubscriptionNotFound { id: i64 },

    #[error("no base prices configured for plan '{plan}'")]
    PlanNotFound { plan: String },

    #[error("no base price for meal type '{meal_type}' in plan '{plan}'")]
    MealTypePriceNotFound { plan: String, meal_type: String },

    #[error("invalid recurrence: {message}")]
    InvalidRecurrence { message: String },

    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("pause must start at least {required_hours}h from now (got {actual_hours}h)")]
    InsufficientNotice {
        required_hours: i64,
        actual_hours: i64,
    },

    #[error("pause window exceeds the {max_days}-day maximum")]
    PauseTooLong { max_days: i64 },

    #[error("pause end must be after pause start")]
    InvalidPauseWindow,

    #[error("subscription {id} has already used its pause allowance")]
    AlreadyPaused { id: i64 },

    #[error("subscription {id} is not paused")]
    NotPaused { id: i64 },

    #[error("subscription {id} is not active")]
    NotActive { id: i64 },

    #[error("concurrent update lost on subscription {id}")]
    Conflict { id: i64 },

    #[error("malformed discount rule {rule_id}: {message}")]
    MalformedDiscountRule { rule_id: i64, message: String },

    #[error("inconsistent subscription state: {message}")]
    CorruptState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Stable reason code for the web boundary.
    ///
    /// Validation and not-found failures get specific codes; anything that is
    /// a defect rather than user input collapses to `"internal"`.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::SubscriptionNotFound { .. } => "subscription_not_found",
            Self::PlanNotFound { .. } => "plan_not_found",
            Self::MealTypePriceNotFound { .. } => "meal_type_price_not_found",
            Self::InvalidRecurrence { .. } => "invalid_recurrence",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::InsufficientNotice { .. } => "insufficient_notice",
            Self::PauseTooLong { .. } => "pause_too_long",
            Self::InvalidPauseWindow => "invalid_pause_window",
            Self::AlreadyPaused { .. } => "already_paused",
            Self::NotPaused { .. } => "not_paused",
            Self::NotActive { .. } => "not_active",
            Self::Conflict { .. } => "conflict",
            Self::MalformedDiscountRule { .. }
            | Self::CorruptState { .. }
            | Self::Config { .. }
            | Self::Database(_) => "internal",
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
