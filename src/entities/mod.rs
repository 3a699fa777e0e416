pub mod address;
pub mod cart;
pub mod order;

pub use address::OrderAddress;
pub use cart::{Cart, CustomerInfo, KlarnaSessionRef, LineItem, Market, Shipment};
pub use order::{FraudStatus, Payment, PaymentStatus, PurchaseOrder};
