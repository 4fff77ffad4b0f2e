//! Delivery entity - one scheduled fulfillment occurrence for a subscription.
//!
//! Rows are created in bulk when the recurrence pattern is expanded and are
//! never deleted afterwards; they only change status. Scheduled rows move to
//! delivered/skipped (external fulfillment) or paused (pause window); paused
//! rows move back to scheduled on resume. Delivered and skipped are terminal.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Waiting for fulfillment
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Fulfilled (terminal)
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Skipped by fulfillment (terminal)
    #[sea_orm(string_value = "skipped")]
    Skipped,
    /// Suspended by the subscription's pause window
    #[sea_orm(string_value = "paused")]
    Paused,
}

/// Delivery database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    /// Unique identifier for the delivery
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subscription this delivery belongs to
    pub subscription_id: i64,
    /// Calendar date of the delivery, unique per subscription
    pub delivery_date: Date,
    /// Current status
    pub status: DeliveryStatus,
}

/// Defines relationships between Delivery and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each delivery belongs to one subscription
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
