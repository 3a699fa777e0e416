use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;

use stateset_klarna_payments as klarna;

use klarna::{
    catalog::InMemoryCatalog,
    clients::HttpKlarnaPaymentsApi,
    geo::StaticCountryResolver,
    payment_methods::InMemoryPaymentMethodRepository,
    repositories::{InMemoryOrderRepository, OrderRepository},
    services::{
        klarna::{CartSessionEnricher, KlarnaService},
        order_numbers::DefaultOrderNumberGenerator,
        payment_processor::FraudAwarePaymentProcessor,
        totals::DefaultTotalsCalculator,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = klarna::config::load_config().context("failed to load configuration")?;
    klarna::config::init_tracing(cfg.log_level(), cfg.log_json);

    let api = HttpKlarnaPaymentsApi::new(&cfg.klarna).context("failed to build Klarna client")?;
    info!(
        base_url = cfg.klarna.api_base_url(),
        production = cfg.klarna.is_production,
        "Klarna Payments client ready"
    );

    let repository: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderRepository::new());
    let payment_methods = InMemoryPaymentMethodRepository::from_config(&cfg.payment_methods);

    let service = KlarnaService::new(
        Arc::new(api),
        Arc::new(DefaultTotalsCalculator),
        repository.clone(),
        Arc::new(InMemoryCatalog::new()),
        Arc::new(StaticCountryResolver::new()),
        Arc::new(payment_methods),
        Arc::new(DefaultOrderNumberGenerator),
        Arc::new(FraudAwarePaymentProcessor),
        Arc::new(CartSessionEnricher),
    );

    let app = klarna::app_router(AppState::new(Arc::new(service), repository));

    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("klarna-payments listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
