//! Item catalog service.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::ItemId;
use tracing::info;

use super::item::{Item, ItemCategory, ItemUpdate, ItemView, NewItem, sort_items};
use crate::billing::BillingError;
use crate::ledger::normalize_name;
use crate::records::validate_bags;
use crate::store::{LedgerStore, UnitOfWork};

/// Creates, edits, and lists inventory items.
pub struct ItemCatalog<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for ItemCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> ItemCatalog<S> {
    /// Create a new item catalog.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates an item.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is blank or the alert threshold is negative
    /// - Another item has the same name
    /// - A universal item is requested while one already exists
    pub async fn create(&self, input: NewItem) -> Result<Item, BillingError> {
        validate_name(&input.name)?;
        validate_alert(input.low_stock_alert)?;
        validate_bags(input.opening_stock)?;

        let mut work = self.store.begin().await?;
        if work
            .find_item_by_name(&normalize_name(&input.name))
            .await?
            .is_some()
        {
            return Err(BillingError::DuplicateItem(input.name.trim().to_string()));
        }
        if input.is_universal
            && let Some(existing) = work.universal_item().await?
        {
            return Err(BillingError::UniversalItemExists(existing.name));
        }

        let item = Item::new(&input);
        work.insert_item(&item).await?;
        work.commit().await?;

        info!(item_id = %item.id, name = %item.name, universal = item.is_universal, "Item created");
        Ok(item)
    }

    /// Applies a partial update. A stock value is an administrative
    /// correction and overwrites the current count.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The item does not exist
    /// - The update tries to flip the universal flag
    /// - The new name is blank or taken by another item
    /// - The name changes while record lines still refer to the old one
    pub async fn update(&self, id: ItemId, update: ItemUpdate) -> Result<Item, BillingError> {
        let mut work = self.store.begin().await?;
        let mut item = work
            .get_item(id)
            .await?
            .ok_or(BillingError::ItemNotFound(id))?;

        if update.is_universal.is_some_and(|flag| flag != item.is_universal) {
            return Err(BillingError::UniversalFlagChange);
        }

        if let Some(name) = update.name {
            validate_name(&name)?;
            let clash = work.find_item_by_name(&normalize_name(&name)).await?;
            if clash.is_some_and(|other| other.id != id) {
                return Err(BillingError::DuplicateItem(name.trim().to_string()));
            }
            let current = normalize_name(&item.name);
            if normalize_name(&name) != current {
                let lines = work.count_item_lines(&current).await?;
                if lines > 0 {
                    return Err(BillingError::ItemInUse {
                        name: item.name,
                        lines,
                    });
                }
            }
            item.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            item.category = category;
        }
        if let Some(alert) = update.low_stock_alert {
            validate_alert(alert)?;
            item.low_stock_alert = alert;
        }
        if let Some(stock) = update.stock {
            validate_bags(stock)?;
            info!(item_id = %id, from = %item.stock, to = %stock, "Stock corrected");
            item.stock = stock;
        }
        item.updated_at = Utc::now();

        work.update_item(&item).await?;
        work.commit().await?;
        Ok(item)
    }

    /// Deletes an item. The universal item is protected.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `UniversalItemProtected`.
    pub async fn delete(&self, id: ItemId) -> Result<(), BillingError> {
        let mut work = self.store.begin().await?;
        let item = work
            .get_item(id)
            .await?
            .ok_or(BillingError::ItemNotFound(id))?;
        if item.is_universal {
            return Err(BillingError::UniversalItemProtected(item.name));
        }
        work.delete_item(id).await?;
        work.commit().await?;

        info!(item_id = %id, name = %item.name, "Item deleted");
        Ok(())
    }

    /// Gets an item with its status.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`.
    pub async fn get(&self, id: ItemId) -> Result<ItemView, BillingError> {
        let mut work = self.store.begin().await?;
        work.get_item(id)
            .await?
            .map(ItemView::from)
            .ok_or(BillingError::ItemNotFound(id))
    }

    /// Lists items: universal first, then by name.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list(&self) -> Result<Vec<ItemView>, BillingError> {
        let mut work = self.store.begin().await?;
        let mut items = work.list_items().await?;
        sort_items(&mut items);
        Ok(items.into_iter().map(ItemView::from).collect())
    }

    /// Makes sure a universal item exists, creating `name` if none does.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if a regular item already uses `name`.
    pub async fn ensure_universal_item(&self, name: &str) -> Result<Item, BillingError> {
        {
            let mut work = self.store.begin().await?;
            if let Some(existing) = work.universal_item().await? {
                return Ok(existing);
            }
        }
        self.create(NewItem {
            name: name.to_string(),
            category: ItemCategory::Primary,
            opening_stock: Decimal::ZERO,
            low_stock_alert: Decimal::ZERO,
            is_universal: true,
        })
        .await
    }
}

fn validate_name(name: &str) -> Result<(), BillingError> {
    if name.trim().is_empty() {
        return Err(BillingError::InvalidItem("item name is required"));
    }
    Ok(())
}

fn validate_alert(alert: Decimal) -> Result<(), BillingError> {
    if alert < Decimal::ZERO {
        return Err(BillingError::InvalidItem("low stock alert cannot be negative"));
    }
    validate_bags(alert)
}
