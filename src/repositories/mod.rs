use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    constants::{ORDER_NAMESPACE, PURCHASE_ORDER_CLASS},
    entities::{Cart, PurchaseOrder},
    errors::ServiceError,
};

pub mod in_memory;

pub use in_memory::InMemoryOrderRepository;

/// Metadata search over stored orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSearch {
    pub meta_field: String,
    pub value: String,
    /// Order classes in scope (e.g. "PurchaseOrder")
    pub classes: Vec<String>,
    pub namespace: String,
    pub records_to_retrieve: usize,
}

impl OrderSearch {
    /// Completed purchase orders whose `meta_field` equals `value`
    pub fn purchase_orders(meta_field: &str, value: &str) -> Self {
        Self {
            meta_field: meta_field.to_string(),
            value: value.to_string(),
            classes: vec![PURCHASE_ORDER_CLASS.to_string()],
            namespace: ORDER_NAMESPACE.to_string(),
            records_to_retrieve: 10_000,
        }
    }
}

/// Storage for carts and placed orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save_cart(&self, cart: &Cart) -> Result<(), ServiceError>;

    async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>, ServiceError>;

    async fn save_order(&self, order: &PurchaseOrder) -> Result<(), ServiceError>;

    async fn load_order(&self, order_id: Uuid) -> Result<Option<PurchaseOrder>, ServiceError>;

    /// Ids of matching orders in creation order
    async fn find_purchase_orders(&self, search: &OrderSearch) -> Result<Vec<Uuid>, ServiceError>;
}
