use metrics::counter;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::KlarnaService;
use crate::{
    constants::KLARNA_ORDER_ID_FIELD,
    entities::{PaymentStatus, PurchaseOrder},
    errors::ServiceError,
    models::NotificationModel,
    repositories::OrderSearch,
};

/// What a fraud notification did to the matching order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FraudUpdateOutcome {
    OrderNotFound,
    /// The payment had already left `Pending`; nothing was changed
    PaymentNotPending { status: PaymentStatus },
    /// Fraud status recorded and the order saved. `processed` is false when the
    /// payment processor failed.
    Updated { processed: bool },
}

impl KlarnaService {
    #[instrument(skip(self, notification), fields(klarna_order_id = %notification.order_id, status = %notification.status))]
    pub async fn fraud_update(
        &self,
        notification: &NotificationModel,
    ) -> Result<FraudUpdateOutcome, ServiceError> {
        let Some(mut order) = self.find_order_by_klarna_id(&notification.order_id).await? else {
            warn!("No purchase order matches Klarna order id");
            return Ok(FraudUpdateOutcome::OrderNotFound);
        };

        let order_id = order.id;
        let Some(payment) = order.primary_payment_mut() else {
            warn!(%order_id, "Purchase order has no payments");
            return Ok(FraudUpdateOutcome::OrderNotFound);
        };
        if !payment.is_pending() {
            info!(%order_id, payment_status = %payment.status, "Payment is no longer pending; notification ignored");
            return Ok(FraudUpdateOutcome::PaymentNotPending {
                status: payment.status,
            });
        }
        payment.fraud_status = Some(notification.status);

        let processed = match self.payment_processor.process_payments(&mut order).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, order_id = %order.id, "Failed to process payments after fraud decision");
                false
            }
        };

        self.repository.save_order(&order).await.map_err(|e| {
            error!(error = %e, order_id = %order.id, "Failed to save order after fraud decision");
            e
        })?;

        counter!("klarna.fraud_updates", 1);
        info!(order_id = %order.id, processed, "Fraud decision applied");
        Ok(FraudUpdateOutcome::Updated { processed })
    }

    async fn find_order_by_klarna_id(
        &self,
        klarna_order_id: &str,
    ) -> Result<Option<PurchaseOrder>, ServiceError> {
        let search = OrderSearch::purchase_orders(KLARNA_ORDER_ID_FIELD, klarna_order_id);
        let ids = self.repository.find_purchase_orders(&search).await?;

        let Some(first) = ids.first() else {
            return Ok(None);
        };
        if ids.len() > 1 {
            warn!(matches = ids.len(), selected = %first, "Several purchase orders share a Klarna order id");
        }
        self.repository.load_order(*first).await
    }
}
