use serde::{Deserialize, Serialize};

/// Address as captured by the checkout (shipping or billing)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAddress {
    pub first_name: String,
    pub last_name: String,
    pub organization: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region_name: Option<String>,
    pub postal_code: String,
    pub country_code: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}
