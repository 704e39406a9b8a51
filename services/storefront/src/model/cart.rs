use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct CartItemModel {
    pub id: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    // display fields passed through from the storefront page
    pub name: Option<String>,
    pub image: Option<String>,
    pub sku: Option<String>,
}

#[derive(Debug)]
pub struct CartModel {
    pub session_id: String,
    pub items: Vec<CartItemModel>,
    // increased on each save, reported to clients for diagnosing lost updates
    pub version: u32,
    pub last_access: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum CartUpdateError {
    ItemNotFound,
}

impl CartItemModel {
    fn same_product(&self, other: &Self) -> bool {
        self.id == other.id && self.variant == other.variant
    }
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl CartModel {
    pub fn new(session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            items: Vec::new(),
            version: 0,
            last_access: now,
        }
    }

    /// merge into existing line with the same product and variant,
    /// otherwise append at the end of the cart
    pub fn add_item(&mut self, newitem: CartItemModel) {
        if let Some(saved) = self.items.iter_mut().find(|i| i.same_product(&newitem)) {
            saved.quantity = saved.quantity.saturating_add(newitem.quantity);
        } else {
            self.items.push(newitem);
        }
    }

    // quantity is written as-is, no lower / upper bound at this layer
    pub fn update_quantity(&mut self, item_id: &str, quantity: u32) -> Result<(), CartUpdateError> {
        let found = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(CartUpdateError::ItemNotFound)?;
        found.quantity = quantity;
        Ok(())
    }

    /// remove all lines of the product regardless of variant, return number
    /// of lines removed
    pub fn remove_item(&mut self, item_id: &str) -> usize {
        let num_before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        num_before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl_secs: u32) -> bool {
        let ttl = Duration::seconds(ttl_secs as i64);
        (now - self.last_access) > ttl
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItemModel::line_total).sum()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| i.quantity as u64).sum()
    }
} // end of impl CartModel
