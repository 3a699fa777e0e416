use async_trait::async_trait;
use tracing::info;

use crate::{
    entities::{FraudStatus, PaymentStatus, PurchaseOrder},
    errors::ServiceError,
};

/// Settles the payments of an order after a state change
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process_payments(&self, order: &mut PurchaseOrder) -> Result<(), ServiceError>;
}

/// Moves pending payments forward based on their recorded fraud decision
#[derive(Debug, Clone, Copy, Default)]
pub struct FraudAwarePaymentProcessor;

#[async_trait]
impl PaymentProcessor for FraudAwarePaymentProcessor {
    async fn process_payments(&self, order: &mut PurchaseOrder) -> Result<(), ServiceError> {
        for payment in order.payments.iter_mut().filter(|p| p.is_pending()) {
            let next = match payment.fraud_status {
                Some(FraudStatus::Accepted) => PaymentStatus::Processed,
                Some(FraudStatus::Rejected) | Some(FraudStatus::Stopped) => PaymentStatus::Failed,
                Some(FraudStatus::Pending) | None => continue,
            };
            info!(payment_id = %payment.id, status = %next, "Payment settled");
            payment.status = next;
        }
        Ok(())
    }
}
