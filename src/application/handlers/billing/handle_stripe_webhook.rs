//! HandleStripeWebhookHandler - Command handler for one Stripe webhook delivery.
//!
//! Verification always runs against the untouched request bytes, before any
//! parsing. Handler failures are either acknowledged (the provider stops
//! retrying) or surfaced, depending on the configured ack policy.

use std::sync::Arc;

use crate::domain::billing::{
    IdempotentWebhookProcessor, StripeEvent, StripeWebhookVerifier, WebhookError, WebhookResult,
};

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if the request carried one.
    pub signature: Option<String>,
}

/// Result of webhook handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleStripeWebhookResult {
    /// The processor finished (applied, ignored or duplicate).
    Completed(WebhookResult),
    /// A handler failed, but the delivery is acknowledged anyway.
    FailureAcknowledged { reason: String },
}

/// Handler for Stripe webhook deliveries.
pub struct HandleStripeWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    processor: Arc<IdempotentWebhookProcessor>,
    ack_on_handler_failure: bool,
}

impl HandleStripeWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        processor: Arc<IdempotentWebhookProcessor>,
        ack_on_handler_failure: bool,
    ) -> Self {
        Self {
            verifier,
            processor,
            ack_on_handler_failure,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<HandleStripeWebhookResult, WebhookError> {
        // 1. Authenticate the raw bytes
        if let Err(e) = self.verifier.verify(&cmd.payload, cmd.signature.as_deref()) {
            tracing::warn!(error = %e, "Rejected webhook delivery");
            return Err(e);
        }

        // 2. Parse and resolve the event
        let envelope = StripeEvent::parse(&cmd.payload)?;
        let event = envelope.resolve()?;

        tracing::info!(
            event_id = envelope.log_id(),
            event_type = %envelope.event_type,
            livemode = envelope.livemode,
            "Received Stripe webhook"
        );

        // 3. Dedup and dispatch
        match self.processor.process(&envelope, &event).await {
            Ok(result) => {
                match &result {
                    WebhookResult::Processed(action) => tracing::info!(
                        event_id = envelope.log_id(),
                        action = %action.summary(),
                        "Webhook applied"
                    ),
                    WebhookResult::Ignored(reason) => tracing::info!(
                        event_id = envelope.log_id(),
                        reason = %reason,
                        "Webhook ignored"
                    ),
                    WebhookResult::AlreadyProcessed => {}
                }
                Ok(HandleStripeWebhookResult::Completed(result))
            }
            Err(e) => {
                tracing::error!(
                    event_id = envelope.log_id(),
                    event_type = %envelope.event_type,
                    error = %e,
                    retryable = e.is_retryable(),
                    acknowledged = self.ack_on_handler_failure,
                    "Webhook handler failed"
                );
                if self.ack_on_handler_failure {
                    Ok(HandleStripeWebhookResult::FailureAcknowledged {
                        reason: e.to_string(),
                    })
                } else {
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryInvoiceRepository, InMemoryPlanCatalog, InMemorySubscriptionRepository,
        InMemoryWebhookLedger,
    };
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{
        sign_payload, BillingReconciler, Invoice, ReconcileAction, VerificationMode,
    };
    use crate::ports::InvoiceRepository;
    use secrecy::SecretString;

    const SECRET: &str = "whsec_test_secret";

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        handler: HandleStripeWebhookHandler,
        invoices: Arc<InMemoryInvoiceRepository>,
    }

    fn fixture(mode: VerificationMode, ack_on_handler_failure: bool) -> Fixture {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let reconciler = BillingReconciler::new(
            invoices.clone(),
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemoryPlanCatalog::new(vec![])),
            Arc::new(MockPaymentProvider::new()),
        );
        let processor = IdempotentWebhookProcessor::new(
            Arc::new(InMemoryWebhookLedger::default()),
            Arc::new(reconciler),
        );
        Fixture {
            handler: HandleStripeWebhookHandler::new(
                Arc::new(StripeWebhookVerifier::new(mode)),
                Arc::new(processor),
                ack_on_handler_failure,
            ),
            invoices,
        }
    }

    fn enforced() -> VerificationMode {
        VerificationMode::Enforced(SecretString::new(SECRET.to_string()))
    }

    fn invoice_checkout(event_id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": event_id,
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_1",
                "mode": "payment",
                "amount_total": 15000,
                "metadata": {"invoice_id": "inv_1"}
            }}
        }))
        .unwrap()
    }

    fn subscription_checkout() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_sub",
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_2",
                "mode": "subscription",
                "subscription": "sub_missing",
                "metadata": {"user_id": "user_1"}
            }}
        }))
        .unwrap()
    }

    fn signed(payload: Vec<u8>) -> HandleStripeWebhookCommand {
        let signature = sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();
        HandleStripeWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_invoice_checkout_marks_invoice_paid() {
        let f = fixture(enforced(), true);
        f.invoices.insert(Invoice::sent("inv_1")).await;

        let result = f.handler.handle(signed(invoice_checkout("evt_1"))).await.unwrap();

        assert_eq!(
            result,
            HandleStripeWebhookResult::Completed(WebhookResult::Processed(
                ReconcileAction::InvoicePaid {
                    invoice_id: "inv_1".to_string()
                }
            ))
        );
        let invoice = f.invoices.find_by_id("inv_1").await.unwrap().unwrap();
        assert!(invoice.is_paid());
        assert_eq!(invoice.amount_paid, Some(150.0));
    }

    #[tokio::test]
    async fn missing_signature_is_rejected_when_enforced() {
        let f = fixture(enforced(), true);
        f.invoices.insert(Invoice::sent("inv_1")).await;

        let result = f
            .handler
            .handle(HandleStripeWebhookCommand {
                payload: invoice_checkout("evt_1"),
                signature: None,
            })
            .await;

        assert!(matches!(result, Err(WebhookError::MissingSignature)));
        let invoice = f.invoices.find_by_id("inv_1").await.unwrap().unwrap();
        assert!(!invoice.is_paid());
    }

    #[tokio::test]
    async fn tampered_body_is_rejected() {
        let f = fixture(enforced(), true);
        let mut cmd = signed(invoice_checkout("evt_1"));
        cmd.payload = invoice_checkout("evt_2");

        let result = f.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[tokio::test]
    async fn disabled_verification_accepts_unsigned_delivery() {
        let f = fixture(VerificationMode::Disabled, true);
        f.invoices.insert(Invoice::sent("inv_1")).await;

        let result = f
            .handler
            .handle(HandleStripeWebhookCommand {
                payload: invoice_checkout("evt_1"),
                signature: None,
            })
            .await;

        assert!(matches!(
            result,
            Ok(HandleStripeWebhookResult::Completed(WebhookResult::Processed(_)))
        ));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Parsing and Dedup
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let f = fixture(enforced(), true);

        let result = f.handler.handle(signed(b"{not json".to_vec())).await;

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[tokio::test]
    async fn redelivery_is_already_processed() {
        let f = fixture(enforced(), true);
        f.invoices.insert(Invoice::sent("inv_1")).await;

        f.handler.handle(signed(invoice_checkout("evt_1"))).await.unwrap();
        let second = f.handler.handle(signed(invoice_checkout("evt_1"))).await.unwrap();

        assert_eq!(
            second,
            HandleStripeWebhookResult::Completed(WebhookResult::AlreadyProcessed)
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Ack Policy
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn handler_failure_is_acknowledged_when_policy_is_on() {
        let f = fixture(enforced(), true);

        let result = f.handler.handle(signed(subscription_checkout())).await.unwrap();

        assert!(matches!(
            result,
            HandleStripeWebhookResult::FailureAcknowledged { .. }
        ));
    }

    #[tokio::test]
    async fn handler_failure_surfaces_when_policy_is_off() {
        let f = fixture(enforced(), false);

        let result = f.handler.handle(signed(subscription_checkout())).await;

        assert!(matches!(result, Err(WebhookError::SubscriptionNotFound(_))));
    }
}
