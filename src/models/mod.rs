pub mod account;
pub mod bag;
pub mod order;

pub use account::{Account, ClubAccount, Role, SubscriptionPlan, SubscriptionStatus, UserId};
pub use bag::{Bag, BagLocation, LocationCounts, Member};
pub use order::{NewOrder, Order, OrderPriority, OrderStatus, OrderType, StatusCounts};
