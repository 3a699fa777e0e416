use metrics::counter;
use tracing::{error, info, instrument, warn};
use url::form_urlencoded;

use super::KlarnaService;
use crate::{
    constants::TRACKING_NUMBER_PARAMETER, entities::Cart, errors::ServiceError,
    models::CreateOrderResponse,
};

impl KlarnaService {
    /// Exchanges an authorization token for a Klarna order.
    ///
    /// The session is fetched fresh from Klarna, tagged with a newly generated
    /// merchant reference and sent back with the token. Returns `None` when the
    /// cart was never bound to a session.
    #[instrument(skip(self, authorization_token, cart), fields(cart_id = %cart.id))]
    pub async fn create_order(
        &self,
        authorization_token: &str,
        cart: &Cart,
    ) -> Result<Option<CreateOrderResponse>, ServiceError> {
        let Some(session_id) = cart.session_id() else {
            warn!("Cart has no Klarna session; order not created");
            return Ok(None);
        };

        let mut session = self.get_session(session_id).await?;

        let reference = self.order_numbers.generate_order_number(cart);
        if let Some(urls) = session.merchant_urls.as_mut() {
            urls.confirmation = urls
                .confirmation
                .as_deref()
                .map(|url| append_tracking_number(url, &reference));
        }
        session.merchant_reference1 = Some(reference.clone());

        let response = self
            .api
            .create_order(authorization_token, &session)
            .await
            .map_err(|e| {
                error!(error = %e, session_id, merchant_reference = %reference, "Failed to create Klarna order");
                ServiceError::from(e)
            })?;

        counter!("klarna.orders.created", 1);
        info!(
            session_id,
            klarna_order_id = %response.order_id,
            merchant_reference = %reference,
            "Klarna order created"
        );
        Ok(Some(response))
    }

    /// Releases an authorization that will not be turned into an order
    #[instrument(skip(self, authorization_token))]
    pub async fn cancel_authorization(&self, authorization_token: &str) -> Result<(), ServiceError> {
        self.api
            .cancel_authorization(authorization_token)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to cancel Klarna authorization");
                ServiceError::from(e)
            })?;

        info!("Klarna authorization cancelled");
        Ok(())
    }
}

/// Adds `trackingNumber=<reference>` to a confirmation URL.
///
/// Works on the raw string so URL templates like `{checkout.order.id}` survive.
pub fn append_tracking_number(url: &str, reference: &str) -> String {
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair(TRACKING_NUMBER_PARAMETER, reference)
        .finish();

    let separator = match url.find('?') {
        None => "?",
        Some(idx) if idx + 1 == url.len() || url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", url, separator, encoded)
}
