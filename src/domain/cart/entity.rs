use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

use super::errors::CartError;

// ============================================================================
// Cart Entity
// ============================================================================
//
// One mutable cart per customer, created lazily on first add. The whole
// document is read, modified and written back as a unit; last writer wins.
// Committing a cart into an order deletes the document, it is never emptied
// in place.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Cart-local identifier, distinct from the catalog product id so the
    /// same product can appear twice with different customizations.
    pub id: Uuid,
    pub product_ref: Uuid,
    pub title: String,
    pub front_image: String,
    pub side_image: String,
    pub price: Money,
    pub size: String,
    pub color: String,
    pub logo: String,
    pub quantity: u32,
    pub method: String,
    pub position: String,
    pub text_line: String,
    pub font: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub customer_id: Uuid,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn add_item(&mut self, item: CartItem) {
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove an item by its cart-local id, preserving the relative order
    /// of the remaining items. Returns the removed item.
    pub fn remove_item(&mut self, item_id: Uuid) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(CartError::ItemNotFound(item_id))?;
        Ok(self.items.remove(index))
    }

    pub fn increase_quantity(&mut self, item_id: Uuid) -> Result<&CartItem, CartError> {
        let item = self.item_mut(item_id)?;
        item.quantity += 1;
        Ok(item)
    }

    /// Decrease floors at 1; it never removes the line.
    pub fn decrease_quantity(&mut self, item_id: Uuid) -> Result<&CartItem, CartError> {
        let item = self.item_mut(item_id)?;
        if item.quantity > 1 {
            item.quantity -= 1;
        }
        Ok(item)
    }

    fn item_mut(&mut self, item_id: Uuid) -> Result<&mut CartItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(CartError::ItemNotFound(item_id))
    }
}
