use metrics::counter;
use tracing::{error, info, instrument, warn};

use super::{personal_information::can_send_personal_information, KlarnaService};
use crate::{
    entities::{Cart, KlarnaSessionRef},
    errors::ServiceError,
    models::{Address, Session},
};

#[derive(Debug, Clone, Copy)]
enum AddressKind {
    Billing,
    Shipping,
}

impl KlarnaService {
    /// Pushes the current cart to Klarna and returns the client token for the widget.
    ///
    /// A cart already bound to a session is updated in place; if Klarna no longer
    /// knows that session a new one is created and stored on the cart.
    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn create_or_update_session(&self, cart: &mut Cart) -> Result<String, ServiceError> {
        let (configuration, method) = self.configuration_for(cart)?;
        let session = self
            .builder
            .build(cart, &configuration, method.as_ref())
            .await?;
        let mut session = self.enricher.enrich(session, cart, &configuration);

        let pii_allowed =
            can_send_personal_information(self.countries.as_ref(), &session.purchase_country);
        if !configuration.customer_pre_assessment || !pii_allowed {
            session.customer = None;
        } else if session.customer.is_none() {
            return Err(ServiceError::ConfigurationError(
                "Customer information is required when customer pre-assessment is enabled"
                    .to_string(),
            ));
        }

        if let Some(existing) = cart.klarna_session.clone() {
            match self.api.update_session(&existing.session_id, &session).await {
                Ok(()) => {
                    counter!("klarna.sessions.updated", 1);
                    info!(session_id = %existing.session_id, "Klarna session updated");
                    return Ok(existing.client_token);
                }
                Err(e) if e.is_stale_session() => {
                    counter!("klarna.sessions.recreated", 1);
                    warn!(
                        error = %e,
                        session_id = %existing.session_id,
                        "Stored Klarna session is gone; creating a new one"
                    );
                }
                Err(e) => {
                    error!(error = %e, session_id = %existing.session_id, "Failed to update Klarna session");
                    return Err(e.into());
                }
            }
        }

        self.create_session(cart, &session).await
    }

    async fn create_session(&self, cart: &mut Cart, session: &Session) -> Result<String, ServiceError> {
        let response = self.api.create_session(session).await.map_err(|e| {
            error!(error = %e, "Failed to create Klarna session");
            ServiceError::from(e)
        })?;

        let session_ref = KlarnaSessionRef::new(response.session_id, response.client_token);
        session_ref.to_properties(&mut cart.properties);
        cart.klarna_session = Some(session_ref.clone());

        self.repository.save_cart(cart).await.map_err(|e| {
            error!(error = %e, session_id = %session_ref.session_id, "Failed to persist Klarna session on cart");
            e
        })?;

        counter!("klarna.sessions.created", 1);
        info!(session_id = %session_ref.session_id, "Klarna session created");
        Ok(session_ref.client_token)
    }

    /// Replaces the billing address on the cart's Klarna session.
    ///
    /// Returns `false` without contacting Klarna when personal data may not be sent
    /// for the purchase country or the cart has no session.
    #[instrument(skip(self, cart, address), fields(cart_id = %cart.id))]
    pub async fn update_billing_address(
        &self,
        cart: &Cart,
        address: Address,
    ) -> Result<bool, ServiceError> {
        self.update_address(cart, address, AddressKind::Billing).await
    }

    #[instrument(skip(self, cart, address), fields(cart_id = %cart.id))]
    pub async fn update_shipping_address(
        &self,
        cart: &Cart,
        address: Address,
    ) -> Result<bool, ServiceError> {
        self.update_address(cart, address, AddressKind::Shipping).await
    }

    async fn update_address(
        &self,
        cart: &Cart,
        address: Address,
        kind: AddressKind,
    ) -> Result<bool, ServiceError> {
        let purchase_country = self.builder.purchase_country(cart)?;
        if !can_send_personal_information(self.countries.as_ref(), &purchase_country) {
            info!(%purchase_country, ?kind, "Address not sent to Klarna for this country");
            return Ok(false);
        }

        let Some(session_id) = cart.session_id() else {
            return Ok(false);
        };

        let mut session = self.get_session(session_id).await?;
        match kind {
            AddressKind::Billing => session.billing_address = Some(address),
            AddressKind::Shipping => session.shipping_address = Some(address),
        }

        self.api
            .update_session(session_id, &session)
            .await
            .map_err(|e| {
                error!(error = %e, session_id, ?kind, "Failed to update address on Klarna session");
                ServiceError::from(e)
            })?;

        counter!("klarna.sessions.updated", 1);
        Ok(true)
    }
}
