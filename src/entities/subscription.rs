//! Subscription entity - a recurring order for a meal-plan variant.
//!
//! The billing parameters (meal types, delivery weekdays, duration) are typed
//! columns validated once at creation time; the pause window lives in three
//! nullable columns that are only ever written together with the status, and
//! `Model::state` projects them into a tagged enum so an inconsistent
//! combination is caught at the read boundary instead of leaking downstream.

use crate::errors::Error;
use chrono::{DateTime, Utc, Weekday};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription lifecycle status stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Deliveries are being generated and fulfilled
    #[sea_orm(string_value = "active")]
    Active,
    /// Deliveries inside the pause window are suspended
    #[sea_orm(string_value = "paused")]
    Paused,
    /// Terminated by the subscriber
    #[sea_orm(string_value = "canceled")]
    Canceled,
    /// Ran past its configured duration without renewal
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Meal types requested per delivery day, stored as a typed JSON column.
/// Parsed and validated once at subscription creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MealTypes(pub Vec<String>);

/// Delivery weekdays as indices (0 = Sunday … 6 = Saturday), stored as a
/// typed JSON column so renewals can re-expand the original pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct DeliveryWeekdays(pub Vec<u8>);

impl DeliveryWeekdays {
    /// Builds the stored representation from chrono weekdays.
    #[must_use]
    pub fn from_weekdays(weekdays: &[Weekday]) -> Self {
        let mut indices: Vec<u8> = weekdays
            .iter()
            .map(|d| d.num_days_from_sunday() as u8)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    /// Converts the stored indices back into chrono weekdays.
    pub fn to_weekdays(&self) -> crate::errors::Result<Vec<Weekday>> {
        self.0.iter().map(|i| weekday_from_sunday_index(*i)).collect()
    }
}

/// Maps a 0=Sunday…6=Saturday index to a chrono weekday.
fn weekday_from_sunday_index(index: u8) -> crate::errors::Result<Weekday> {
    Ok(match index {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        _ => {
            return Err(Error::InvalidRecurrence {
                message: format!("weekday index {index} out of range 0-6"),
            });
        }
    })
}

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user reference
    pub user_id: String,
    /// Plan variant this subscription is for (keys the base prices)
    pub plan_name: String,
    /// Delivery days per week (derived from the weekday set at creation)
    pub days_per_week: i32,
    /// Meals delivered per day
    pub meals_per_day: i32,
    /// Configured duration in weeks, used for renewal and quotes
    pub duration_weeks: i32,
    /// Weekly price after discounts, fixed at creation
    pub weekly_price: f64,
    /// Meal types per delivery day
    pub meal_types: MealTypes,
    /// Weekly recurrence pattern
    pub delivery_weekdays: DeliveryWeekdays,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// First delivery-eligible date
    pub starts_at: Date,
    /// Next renewal date, None once canceled or expired
    pub renews_at: Option<Date>,
    /// Pause window start, set only while paused
    pub pause_start: Option<DateTimeUtc>,
    /// Pause window end, set only while paused
    pub pause_end: Option<DateTimeUtc>,
    /// Optional subscriber-supplied pause reason
    pub pause_reason: Option<String>,
    /// Monotonic marker: set on the first successful pause, never cleared
    pub pause_used: bool,
}

/// The pause window of a paused subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseWindow {
    /// When the pause takes effect
    pub start: DateTime<Utc>,
    /// When deliveries resume automatically
    pub end: DateTime<Utc>,
    /// Subscriber-supplied reason, if any
    pub reason: Option<String>,
}

/// Tagged lifecycle state, derived from the row.
///
/// `Paused` always carries its window, so "paused without a window" and
/// "active with a window" are unrepresentable past this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Deliveries running normally
    Active,
    /// Suspended for the carried window
    Paused(PauseWindow),
    /// Terminated by the subscriber
    Canceled,
    /// Ran out without renewal
    Expired,
}

impl Model {
    /// Projects the status and window columns into a tagged state.
    ///
    /// A `paused` row missing either window bound, or a non-paused row that
    /// still carries window columns, is reported as corrupt rather than
    /// silently interpreted.
    pub fn state(&self) -> crate::errors::Result<SubscriptionState> {
        match self.status {
            SubscriptionStatus::Paused => match (self.pause_start, self.pause_end) {
                (Some(start), Some(end)) => Ok(SubscriptionState::Paused(PauseWindow {
                    start,
                    end,
                    reason: self.pause_reason.clone(),
                })),
                _ => Err(Error::CorruptState {
                    message: format!("subscription {} is paused without a pause window", self.id),
                }),
            },
            SubscriptionStatus::Active => {
                self.ensure_no_window()?;
                Ok(SubscriptionState::Active)
            }
            SubscriptionStatus::Canceled => {
                self.ensure_no_window()?;
                Ok(SubscriptionState::Canceled)
            }
            SubscriptionStatus::Expired => {
                self.ensure_no_window()?;
                Ok(SubscriptionState::Expired)
            }
        }
    }

    fn ensure_no_window(&self) -> crate::errors::Result<()> {
        if self.pause_start.is_some() || self.pause_end.is_some() {
            return Err(Error::CorruptState {
                message: format!(
                    "subscription {} has a pause window but status {:?}",
                    self.id, self.status
                ),
            });
        }
        Ok(())
    }
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One subscription has many deliveries
    #[sea_orm(has_many = "super::delivery::Entity")]
    Deliveries,
}

impl Related<super::delivery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deliveries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    fn base_model() -> Model {
        Model {
            id: 1,
            user_id: "user1".to_string(),
            plan_name: "standard".to_string(),
            days_per_week: 3,
            meals_per_day: 2,
            duration_weeks: 4,
            weekly_price: 483.0,
            meal_types: MealTypes(vec!["breakfast".to_string(), "lunch".to_string()]),
            delivery_weekdays: DeliveryWeekdays(vec![1, 3, 5]),
            status: SubscriptionStatus::Active,
            starts_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            renews_at: None,
            pause_start: None,
            pause_end: None,
            pause_reason: None,
            pause_used: false,
        }
    }

    #[test]
    fn test_state_active() {
        let model = base_model();
        assert_eq!(model.state().unwrap(), SubscriptionState::Active);
    }

    #[test]
    fn test_state_paused_with_window() {
        let mut model = base_model();
        model.status = SubscriptionStatus::Paused;
        model.pause_start = Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        model.pause_end = Some(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap());
        model.pause_reason = Some("vacation".to_string());

        match model.state().unwrap() {
            SubscriptionState::Paused(window) => {
                assert_eq!(window.reason.as_deref(), Some("vacation"));
                assert!(window.end > window.start);
            }
            other => panic!("expected paused state, got {other:?}"),
        }
    }

    #[test]
    fn test_state_paused_without_window_is_corrupt() {
        let mut model = base_model();
        model.status = SubscriptionStatus::Paused;

        assert!(matches!(
            model.state().unwrap_err(),
            Error::CorruptState { message: _ }
        ));
    }

    #[test]
    fn test_state_active_with_window_is_corrupt() {
        let mut model = base_model();
        model.pause_start = Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());

        assert!(matches!(
            model.state().unwrap_err(),
            Error::CorruptState { message: _ }
        ));
    }

    #[test]
    fn test_delivery_weekdays_round_trip() {
        let weekdays = [Weekday::Fri, Weekday::Mon, Weekday::Wed, Weekday::Mon];
        let stored = DeliveryWeekdays::from_weekdays(&weekdays);
        // Sorted by Sunday-based index, duplicates collapsed
        assert_eq!(stored.0, vec![1, 3, 5]);

        let back = stored.to_weekdays().unwrap();
        assert_eq!(back, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    }

    #[test]
    fn test_delivery_weekdays_rejects_bad_index() {
        let stored = DeliveryWeekdays(vec![7]);
        assert!(matches!(
            stored.to_weekdays().unwrap_err(),
            Error::InvalidRecurrence { message: _ }
        ));
    }
}
