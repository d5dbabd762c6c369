//! Database Models

// Serde helpers
pub mod serde_helpers;

// Inventory & configuration
pub mod dining_table;
pub mod restaurant;

// Re-exports
pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate};
pub use restaurant::{Restaurant, RestaurantCreate, RestaurantUpdate};
