use std::sync::Arc;

use billing_reconciler::adapters::http::{webhook_router, WebhookAppState};
use billing_reconciler::adapters::memory::InMemoryWebhookLedger;
use billing_reconciler::adapters::rest::{
    RestClient, RestConfig, RestInvoiceRepository, RestPlanCatalog, RestSubscriptionRepository,
};
use billing_reconciler::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use billing_reconciler::application::SweepWebhookLedgerHandler;
use billing_reconciler::config::AppConfig;
use billing_reconciler::domain::billing::{
    BillingReconciler, IdempotentWebhookProcessor, StripeWebhookVerifier, VerificationMode,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let addr = config.server.socket_addr()?;
    let verification = config.verification_mode();
    if let VerificationMode::Disabled = verification {
        tracing::warn!(
            environment = ?config.server.environment,
            "SIGNATURE VERIFICATION DISABLED: no webhook signing secret configured, every request will be trusted"
        );
    }

    // Billing store
    let rest = RestClient::new(
        RestConfig::new(config.persistence.url.clone(), config.persistence.service_key.clone())
            .with_timeout(config.server.request_timeout()),
    )?;

    // Stripe
    let stripe = StripePaymentAdapter::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_timeout(config.server.request_timeout()),
    )?;

    let reconciler = BillingReconciler::new(
        Arc::new(RestInvoiceRepository::new(rest.clone())),
        Arc::new(RestSubscriptionRepository::new(rest.clone())),
        Arc::new(RestPlanCatalog::new(rest)),
        Arc::new(stripe),
    );

    let ledger = Arc::new(InMemoryWebhookLedger::new(
        config.webhook.ledger_capacity,
        config.webhook.ledger_retention_secs,
    ));
    let sweeper = SweepWebhookLedgerHandler::new(ledger.clone(), config.webhook.ledger_retention())
        .spawn(config.webhook.ledger_sweep_interval());

    let state = WebhookAppState {
        verifier: Arc::new(StripeWebhookVerifier::new(verification)),
        processor: Arc::new(IdempotentWebhookProcessor::new(ledger, Arc::new(reconciler))),
        ack_on_handler_failure: config.webhook.ack_on_handler_failure,
    };
    let app = webhook_router(state, &config.server.cors_origins_list());

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        ack_on_handler_failure = config.webhook.ack_on_handler_failure,
        "Billing reconciler listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Billing reconciler stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over config.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
