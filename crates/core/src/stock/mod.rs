//! Inventory stock tracker.
//!
//! Stock is counted in bags. Each sale or purchase line moves its item by
//! `ceil(kg / bag_weight)` bags, and every non-universal bag also moves the
//! universal packaging item. Stock may go negative; it never blocks a
//! transaction.

pub mod catalog;
pub mod item;
pub mod plan;
pub mod policy;
pub mod tracker;

#[cfg(test)]
mod props;

pub use catalog::ItemCatalog;
pub use item::{Item, ItemCategory, ItemUpdate, ItemView, NewItem, StockStatus, sort_items};
pub use plan::{PlanEntry, StockPlan};
pub use policy::{DEFAULT_BAG_WEIGHT_KG, StockPolicy};
pub use tracker::{StockChange, StockTracker};
