//! # Kitchen Store
//!
//! 食材與採購單的交易邊界：每個食材獨立加鎖並帶版本號

pub mod dirty_tracking;
pub mod store;

pub use dirty_tracking::DirtyTracker;
pub use store::{KitchenStore, VersionedIngredient};
