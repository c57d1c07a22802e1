//! Inventory items and stock status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::ItemId;

use crate::ledger::normalize_name;

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// Main traded goods.
    Primary,
    /// Sundries.
    Kirana,
}

impl ItemCategory {
    /// Stable lowercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Kirana => "kirana",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "kirana" => Ok(Self::Kirana),
            _ => Err(format!("Unknown item category: {s}")),
        }
    }
}

/// Advisory stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Above the alert threshold.
    InStock,
    /// At or below the alert threshold.
    LowStock,
    /// Exactly zero bags.
    OutOfStock,
}

impl StockStatus {
    /// Classifies a stock level against its alert threshold.
    #[must_use]
    pub fn of(stock: Decimal, low_stock_alert: Decimal) -> Self {
        if stock.is_zero() {
            Self::OutOfStock
        } else if stock <= low_stock_alert {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

/// An inventory item counted in bags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item ID.
    pub id: ItemId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Category.
    pub category: ItemCategory,
    /// Current stock in bags. May be negative.
    pub stock: Decimal,
    /// Low stock threshold in bags.
    pub low_stock_alert: Decimal,
    /// Packaging item consumed by every other item.
    pub is_universal: bool,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last modified at.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Builds an item from creation input.
    #[must_use]
    pub fn new(input: &NewItem) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            name: input.name.trim().to_string(),
            category: input.category,
            stock: input.opening_stock,
            low_stock_alert: input.low_stock_alert,
            is_universal: input.is_universal,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lowercased name used for lookups.
    #[must_use]
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Current stock status.
    #[must_use]
    pub fn status(&self) -> StockStatus {
        StockStatus::of(self.stock, self.low_stock_alert)
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name.
    pub name: String,
    /// Category.
    pub category: ItemCategory,
    /// Opening stock in bags.
    #[serde(default)]
    pub opening_stock: Decimal,
    /// Low stock threshold in bags.
    #[serde(default)]
    pub low_stock_alert: Decimal,
    /// Marks the packaging item.
    #[serde(default)]
    pub is_universal: bool,
}

/// Partial update of an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<ItemCategory>,
    /// Stock correction in bags.
    #[serde(default)]
    pub stock: Option<Decimal>,
    /// New low stock threshold.
    #[serde(default)]
    pub low_stock_alert: Option<Decimal>,
    /// Rejected unless it equals the current flag.
    #[serde(default)]
    pub is_universal: Option<bool>,
}

/// Item with its derived status, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    /// The item.
    #[serde(flatten)]
    pub item: Item,
    /// Derived stock status.
    pub status: StockStatus,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        let status = item.status();
        Self { item, status }
    }
}

/// Orders items for listing: universal first, then by name.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.is_universal
            .cmp(&a.is_universal)
            .then_with(|| a.name_key().cmp(&b.name_key()))
    });
}
