//! In-memory order store.
//!
//! Orders are append-mostly: a persisted order is the permanent receipt
//! of a delivery and is never mutated afterwards.

use std::collections::HashMap;
use std::sync::RwLock;

use credvend_types::{Order, OrderId, UserId};

/// Shared order store. Cheap to share behind an `Arc`.
pub struct OrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Persist an order.
    pub fn save(&self, order: Order) {
        self.orders
            .write()
            .expect("order store lock poisoned")
            .insert(order.id, order);
    }

    /// Load an order by internal id (clone).
    #[must_use]
    pub fn find(&self, id: OrderId) -> Option<Order> {
        self.orders
            .read()
            .expect("order store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Look up an order by its buyer-facing order number.
    #[must_use]
    pub fn find_by_number(&self, number: &str) -> Option<Order> {
        self.orders
            .read()
            .expect("order store lock poisoned")
            .values()
            .find(|o| o.order_number.as_str() == number)
            .cloned()
    }

    /// A buyer's order history, newest first.
    #[must_use]
    pub fn find_by_buyer(&self, buyer: UserId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .expect("order store lock poisoned")
            .values()
            .filter(|o| o.buyer == buyer)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }

    /// Number of orders persisted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().expect("order store lock poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
