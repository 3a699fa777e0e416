use serde::{Deserialize, Serialize};

use crate::entities::FraudStatus;

/// Fraud decision pushed by Klarna to the notification URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationModel {
    pub order_id: String,
    #[serde(rename = "event_type", alias = "status")]
    pub status: FraudStatus,
}
