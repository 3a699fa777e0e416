use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{OrderRepository, OrderSearch};
use crate::{
    constants::{ORDER_NAMESPACE, PURCHASE_ORDER_CLASS},
    entities::{Cart, PurchaseOrder},
    errors::ServiceError,
};

/// Process-local cart and order store
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    carts: Arc<DashMap<Uuid, Cart>>,
    orders: Arc<DashMap<Uuid, PurchaseOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_scope(search: &OrderSearch) -> bool {
        search.namespace == ORDER_NAMESPACE
            && search
                .classes
                .iter()
                .any(|class| class == PURCHASE_ORDER_CLASS)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save_cart(&self, cart: &Cart) -> Result<(), ServiceError> {
        let mut stored = cart.clone();
        stored.updated_at = Utc::now();
        self.carts.insert(stored.id, stored);
        Ok(())
    }

    async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>, ServiceError> {
        Ok(self.carts.get(&cart_id).map(|cart| cart.value().clone()))
    }

    async fn save_order(&self, order: &PurchaseOrder) -> Result<(), ServiceError> {
        let mut stored = order.clone();
        stored.updated_at = Utc::now();
        self.orders.insert(stored.id, stored);
        Ok(())
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Option<PurchaseOrder>, ServiceError> {
        Ok(self.orders.get(&order_id).map(|order| order.value().clone()))
    }

    async fn find_purchase_orders(&self, search: &OrderSearch) -> Result<Vec<Uuid>, ServiceError> {
        if !Self::in_scope(search) {
            debug!(namespace = %search.namespace, "Order search outside purchase order scope");
            return Ok(Vec::new());
        }

        let mut matches: Vec<_> = self
            .orders
            .iter()
            .filter(|order| {
                order
                    .metadata
                    .get(&search.meta_field)
                    .is_some_and(|value| *value == search.value)
            })
            .map(|order| (order.created_at, order.id))
            .collect();

        matches.sort();
        Ok(matches
            .into_iter()
            .take(search.records_to_retrieve)
            .map(|(_, id)| id)
            .collect())
    }
}
