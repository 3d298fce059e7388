//! Billing domain - invoices, subscriptions and Stripe webhook reconciliation.
//!
//! # Webhook Pipeline
//!
//! - `webhook_verifier` - HMAC-SHA256 signature check over the raw body
//! - `stripe_event` - Envelope parsing and resolution into `BillingEvent`
//! - `webhook_processor` - Dedup ledger around dispatch
//! - `webhook_reconciler` - One handler per `BillingEvent` variant

mod invoice;
mod plan;
mod stripe_event;
mod subscription;
mod webhook_errors;
mod webhook_processor;
mod webhook_reconciler;
mod webhook_verifier;

pub use invoice::{Invoice, InvoicePayment, InvoiceStatus};
pub use plan::Plan;
pub use stripe_event::{
    BillingEvent, StripeCheckoutSession, StripeEvent, StripeEventData, StripeInvoice,
    StripeInvoiceLine, StripeList, StripePeriod, StripePrice, StripeSubscription,
    StripeSubscriptionItem, CHECKOUT_SESSION_COMPLETED, CUSTOMER_SUBSCRIPTION_DELETED,
    CUSTOMER_SUBSCRIPTION_UPDATED, INVOICE_PAYMENT_FAILED, INVOICE_PAYMENT_SUCCEEDED,
};
pub use subscription::{from_unix, Subscription, SubscriptionChanges, SubscriptionStatus};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{IdempotentWebhookProcessor, WebhookResult};
pub use webhook_reconciler::{BillingReconciler, ReconcileAction, WebhookDispatcher};
pub use webhook_verifier::{
    sign_payload, SignatureHeader, StripeWebhookVerifier, VerificationMode,
    SIGNATURE_TOLERANCE_SECS,
};
