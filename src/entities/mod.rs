//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod delivery;
pub mod discount_rule;
pub mod meal_type_price;
pub mod subscription;

// Re-export specific types to avoid conflicts
pub use delivery::{
    Column as DeliveryColumn, DeliveryStatus, Entity as Delivery, Model as DeliveryModel,
};
pub use discount_rule::{
    Column as DiscountRuleColumn, DiscountRuleKind, Entity as DiscountRule,
    Model as DiscountRuleModel,
};
pub use meal_type_price::{
    Column as MealTypePriceColumn, Entity as MealTypePrice, Model as MealTypePriceModel,
};
pub use subscription::{
    Column as SubscriptionColumn, DeliveryWeekdays, Entity as Subscription, MealTypes,
    Model as SubscriptionModel, PauseWindow, SubscriptionState, SubscriptionStatus,
};
