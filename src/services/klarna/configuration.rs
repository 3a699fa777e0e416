use crate::{
    constants::{PRE_ASSESSMENT_FIELD, SEND_PRODUCT_AND_IMAGE_URL_FIELD, USE_ATTACHMENTS_FIELD},
    errors::ServiceError,
    payment_methods::PaymentMethod,
};

/// Klarna behaviour switches read from the payment method parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Configuration {
    pub customer_pre_assessment: bool,
    pub send_product_and_image_url: bool,
    pub use_attachments: bool,
}

impl Configuration {
    /// Without a payment method every switch is off.
    pub fn from_payment_method(method: Option<&PaymentMethod>) -> Result<Self, ServiceError> {
        let Some(method) = method else {
            return Ok(Self::default());
        };

        Ok(Self {
            customer_pre_assessment: parse_flag(method, PRE_ASSESSMENT_FIELD)?,
            send_product_and_image_url: parse_flag(method, SEND_PRODUCT_AND_IMAGE_URL_FIELD)?,
            use_attachments: parse_flag(method, USE_ATTACHMENTS_FIELD)?,
        })
    }
}

fn parse_flag(method: &PaymentMethod, name: &str) -> Result<bool, ServiceError> {
    let raw = method.get_parameter(name, "false");
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ServiceError::ConfigurationError(format!(
            "{} must be true or false, got '{}'",
            name, raw
        ))),
    }
}
