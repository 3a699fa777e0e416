use uuid::Uuid;

use crate::entities::Cart;

/// Produces the merchant reference for an order about to be placed
pub trait OrderNumberGenerator: Send + Sync {
    fn generate_order_number(&self, cart: &Cart) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOrderNumberGenerator;

impl OrderNumberGenerator for DefaultOrderNumberGenerator {
    fn generate_order_number(&self, _cart: &Cart) -> String {
        let simple = Uuid::new_v4().simple().to_string();
        format!("PO-{}", simple[..12].to_uppercase())
    }
}
