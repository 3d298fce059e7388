//! Billing reconciler - applies Stripe events to invoices and subscriptions.
//!
//! Each [`BillingEvent`] variant has exactly one handler. A handler performs at
//! most one provider fetch, one catalog lookup and one write, and every write
//! is keyed (invoice id or Stripe subscription id) so replaying an event
//! converges on the same state.
//!
//! A recognized event whose preconditions are not met returns
//! `WebhookError::Ignored`; the caller acknowledges it without retry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::invoice::InvoicePayment;
use super::stripe_event::{BillingEvent, StripeCheckoutSession, StripeInvoice, StripeSubscription};
use super::subscription::{Subscription, SubscriptionChanges, SubscriptionStatus};
use super::webhook_errors::WebhookError;
use crate::ports::{InvoiceRepository, PaymentProvider, PlanCatalog, SubscriptionRepository};

/// What a successfully applied event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    InvoicePaid {
        invoice_id: String,
    },
    SubscriptionUpserted {
        subscription_id: String,
        plan_id: Option<String>,
    },
    SubscriptionUpdated {
        subscription_id: String,
        status: Option<SubscriptionStatus>,
    },
}

impl ReconcileAction {
    pub fn summary(&self) -> String {
        match self {
            Self::InvoicePaid { invoice_id } => format!("invoice {} paid", invoice_id),
            Self::SubscriptionUpserted { subscription_id, .. } => {
                format!("subscription {} upserted", subscription_id)
            }
            Self::SubscriptionUpdated { subscription_id, .. } => {
                format!("subscription {} updated", subscription_id)
            }
        }
    }
}

/// Routes a resolved event to its handler.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Returns `Err(WebhookError::Ignored)` for events that need no action.
    async fn dispatch(&self, event: &BillingEvent) -> Result<ReconcileAction, WebhookError>;
}

pub struct BillingReconciler {
    invoices: Arc<dyn InvoiceRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanCatalog>,
    provider: Arc<dyn PaymentProvider>,
}

impl BillingReconciler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanCatalog>,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            invoices,
            subscriptions,
            plans,
            provider,
        }
    }

    async fn handle_checkout_completed(
        &self,
        session: &StripeCheckoutSession,
    ) -> Result<ReconcileAction, WebhookError> {
        // An invoice reference wins over subscription mode.
        if let Some(invoice_id) = session.invoice_id() {
            return self.record_invoice_payment(invoice_id, session).await;
        }

        if session.is_subscription_mode() {
            return self.create_subscription(session).await;
        }

        Err(WebhookError::Ignored(
            "checkout session references neither an invoice nor a subscription".to_string(),
        ))
    }

    async fn record_invoice_payment(
        &self,
        invoice_id: &str,
        session: &StripeCheckoutSession,
    ) -> Result<ReconcileAction, WebhookError> {
        let amount_total = session.amount_total.ok_or_else(|| {
            tracing::warn!(invoice_id, "Checkout for invoice has no amount_total");
            WebhookError::Ignored(format!("checkout for invoice {} has no amount_total", invoice_id))
        })?;

        let payment = InvoicePayment::stripe(invoice_id, amount_total, Utc::now());
        if !self.invoices.record_payment(&payment).await? {
            tracing::warn!(invoice_id, "Paid checkout references unknown invoice");
            return Err(WebhookError::Ignored(format!(
                "invoice {} not found",
                invoice_id
            )));
        }

        tracing::info!(
            invoice_id,
            amount_paid = payment.amount_paid(),
            "Invoice marked paid"
        );
        Ok(ReconcileAction::InvoicePaid {
            invoice_id: invoice_id.to_string(),
        })
    }

    async fn create_subscription(
        &self,
        session: &StripeCheckoutSession,
    ) -> Result<ReconcileAction, WebhookError> {
        let user_id = session.user_id().ok_or_else(|| {
            WebhookError::Ignored("subscription checkout has no user_id metadata".to_string())
        })?;
        let subscription_id = session.subscription.as_deref().ok_or_else(|| {
            WebhookError::Ignored("subscription checkout has no subscription".to_string())
        })?;

        let remote = self
            .provider
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        let plan_id = match remote.price_id() {
            Some(price_id) => self.resolve_plan(price_id, subscription_id).await?,
            None => None,
        };
        let status = remote.status().unwrap_or_else(|| {
            tracing::warn!(
                subscription_id,
                status = ?remote.status,
                "Unrecognized subscription status, recording as active"
            );
            SubscriptionStatus::Active
        });

        let subscription = Subscription {
            user_id: user_id.to_string(),
            plan_id: plan_id.clone(),
            external_subscription_id: subscription_id.to_string(),
            external_customer_id: remote.customer.clone().or_else(|| session.customer.clone()),
            status,
            current_period_start: remote.period_start(),
            current_period_end: remote.period_end(),
            cancel_at_period_end: remote.cancel_at_period_end.unwrap_or(false),
            updated_at: Utc::now(),
        };
        self.subscriptions.upsert(&subscription).await?;

        tracing::info!(
            subscription_id,
            user_id,
            plan_id = ?plan_id,
            status = %status,
            "Subscription upserted from checkout"
        );
        Ok(ReconcileAction::SubscriptionUpserted {
            subscription_id: subscription_id.to_string(),
            plan_id,
        })
    }

    async fn handle_subscription_changed(
        &self,
        remote: &StripeSubscription,
        deleted: bool,
    ) -> Result<ReconcileAction, WebhookError> {
        let subscription_id = remote
            .id
            .as_deref()
            .ok_or_else(|| WebhookError::Ignored("subscription event has no id".to_string()))?;

        let status = if deleted {
            Some(SubscriptionStatus::Canceled)
        } else {
            if remote.status.is_some() && remote.status().is_none() {
                tracing::warn!(
                    subscription_id,
                    status = ?remote.status,
                    "Unrecognized subscription status left unchanged"
                );
            }
            remote.status()
        };

        let mut changes = SubscriptionChanges {
            status,
            ..Default::default()
        }
        .with_period(remote.period_start(), remote.period_end())
        .with_cancel_at_period_end(remote.cancel_at_period_end);

        // A price the catalog does not know clears the plan, so plan and period
        // never come from different events.
        if let Some(price_id) = remote.price_id() {
            changes = changes.with_plan(self.resolve_plan(price_id, subscription_id).await?);
        }

        self.apply_changes(subscription_id, &changes).await
    }

    async fn handle_invoice_payment_succeeded(
        &self,
        invoice: &StripeInvoice,
    ) -> Result<ReconcileAction, WebhookError> {
        if !invoice.is_subscription_cycle() {
            return Err(WebhookError::Ignored(format!(
                "billing_reason {} is not a renewal",
                invoice.billing_reason.as_deref().unwrap_or("none")
            )));
        }
        let subscription_id = invoice_subscription(invoice)?;

        let (start, end) = invoice.service_period();
        let changes = SubscriptionChanges::status(SubscriptionStatus::Active).with_period(start, end);

        self.apply_changes(subscription_id, &changes).await
    }

    async fn handle_invoice_payment_failed(
        &self,
        invoice: &StripeInvoice,
    ) -> Result<ReconcileAction, WebhookError> {
        let subscription_id = invoice_subscription(invoice)?;
        let changes = SubscriptionChanges::status(SubscriptionStatus::PastDue);

        self.apply_changes(subscription_id, &changes).await
    }

    async fn apply_changes(
        &self,
        subscription_id: &str,
        changes: &SubscriptionChanges,
    ) -> Result<ReconcileAction, WebhookError> {
        let matched = self
            .subscriptions
            .update_by_external_id(subscription_id, changes, Utc::now())
            .await?;

        if !matched {
            // The checkout upsert fetches current provider state, so nothing is lost.
            tracing::warn!(subscription_id, "No stored subscription to update");
            return Err(WebhookError::Ignored(format!(
                "subscription {} not stored yet",
                subscription_id
            )));
        }

        tracing::info!(
            subscription_id,
            status = ?changes.status,
            plan_id = ?changes.plan_id,
            "Subscription updated"
        );
        Ok(ReconcileAction::SubscriptionUpdated {
            subscription_id: subscription_id.to_string(),
            status: changes.status,
        })
    }

    async fn resolve_plan(
        &self,
        price_id: &str,
        subscription_id: &str,
    ) -> Result<Option<String>, WebhookError> {
        match self.plans.find_by_price_id(price_id).await? {
            Some(plan) => Ok(Some(plan.id)),
            None => {
                tracing::warn!(subscription_id, price_id, "Stripe price not in plan catalog");
                Ok(None)
            }
        }
    }
}

fn invoice_subscription(invoice: &StripeInvoice) -> Result<&str, WebhookError> {
    invoice
        .subscription
        .as_deref()
        .ok_or_else(|| WebhookError::Ignored("invoice has no subscription".to_string()))
}

#[async_trait]
impl WebhookDispatcher for BillingReconciler {
    async fn dispatch(&self, event: &BillingEvent) -> Result<ReconcileAction, WebhookError> {
        match event {
            BillingEvent::CheckoutCompleted(session) => {
                self.handle_checkout_completed(session).await
            }
            BillingEvent::SubscriptionUpdated(sub) => {
                self.handle_subscription_changed(sub, false).await
            }
            BillingEvent::SubscriptionDeleted(sub) => {
                self.handle_subscription_changed(sub, true).await
            }
            BillingEvent::InvoicePaymentSucceeded(invoice) => {
                self.handle_invoice_payment_succeeded(invoice).await
            }
            BillingEvent::InvoicePaymentFailed(invoice) => {
                self.handle_invoice_payment_failed(invoice).await
            }
            BillingEvent::Unrecognized { event_type } => Err(WebhookError::Ignored(format!(
                "unhandled event type {}",
                event_type
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryInvoiceRepository, InMemoryPlanCatalog, InMemorySubscriptionRepository,
    };
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{from_unix, Invoice, InvoiceStatus, Plan};
    use serde_json::json;

    struct Fixture {
        invoices: Arc<InMemoryInvoiceRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        provider: Arc<MockPaymentProvider>,
        reconciler: BillingReconciler,
    }

    fn fixture() -> Fixture {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let plans = Arc::new(InMemoryPlanCatalog::new(vec![
            Plan::new("P1", "Pro", "price_pro"),
            Plan::new("P2", "Team", "price_team"),
        ]));
        let provider = Arc::new(MockPaymentProvider::new());
        let reconciler = BillingReconciler::new(
            invoices.clone(),
            subscriptions.clone(),
            plans,
            provider.clone(),
        );
        Fixture {
            invoices,
            subscriptions,
            provider,
            reconciler,
        }
    }

    fn stored_subscription(id: &str) -> Subscription {
        Subscription {
            user_id: "U1".to_string(),
            plan_id: Some("P1".to_string()),
            external_subscription_id: id.to_string(),
            external_customer_id: Some("cus_1".to_string()),
            status: SubscriptionStatus::Active,
            current_period_start: from_unix(Some(1_700_000_000)),
            current_period_end: from_unix(Some(1_702_592_000)),
            cancel_at_period_end: false,
            updated_at: Utc::now(),
        }
    }

    fn subscription_payload(value: serde_json::Value) -> StripeSubscription {
        serde_json::from_value(value).unwrap()
    }

    fn invoice_payload(value: serde_json::Value) -> StripeInvoice {
        serde_json::from_value(value).unwrap()
    }

    fn checkout(value: serde_json::Value) -> BillingEvent {
        BillingEvent::CheckoutCompleted(serde_json::from_value(value).unwrap())
    }

    // ══════════════════════════════════════════════════════════════
    // checkout.session.completed (one-time)
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_with_invoice_marks_invoice_paid() {
        let f = fixture();
        f.invoices.insert(Invoice::sent("inv_1")).await;

        let action = f
            .reconciler
            .dispatch(&checkout(json!({
                "mode": "payment",
                "amount_total": 15000,
                "metadata": {"invoice_id": "inv_1"}
            })))
            .await
            .unwrap();

        assert_eq!(
            action,
            ReconcileAction::InvoicePaid {
                invoice_id: "inv_1".to_string()
            }
        );
        let invoice = f.invoices.find_by_id("inv_1").await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.amount_paid, Some(150.0));
        assert_eq!(invoice.payment_method.as_deref(), Some("stripe"));
        assert!(invoice.paid_at.is_some());
    }

    #[tokio::test]
    async fn invoice_metadata_takes_precedence_over_subscription_mode() {
        let f = fixture();
        f.invoices.insert(Invoice::sent("inv_2")).await;

        let action = f
            .reconciler
            .dispatch(&checkout(json!({
                "mode": "subscription",
                "subscription": "sub_9",
                "amount_total": 500,
                "metadata": {"invoice_id": "inv_2", "user_id": "U1"}
            })))
            .await
            .unwrap();

        assert!(matches!(action, ReconcileAction::InvoicePaid { .. }));
        assert_eq!(f.provider.fetch_count(), 0);
        assert_eq!(f.subscriptions.write_count(), 0);
    }

    #[tokio::test]
    async fn checkout_for_unknown_invoice_is_ignored() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&checkout(json!({
                "amount_total": 100,
                "metadata": {"invoice_id": "inv_missing"}
            })))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    #[tokio::test]
    async fn checkout_without_invoice_or_subscription_is_ignored() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&checkout(json!({"mode": "payment", "amount_total": 100})))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // checkout.session.completed (subscription)
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_checkout_upserts_with_resolved_plan() {
        let f = fixture();
        f.provider.set_subscription(subscription_payload(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "cancel_at_period_end": false,
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        })));

        let action = f
            .reconciler
            .dispatch(&checkout(json!({
                "mode": "subscription",
                "subscription": "sub_1",
                "customer": "cus_1",
                "metadata": {"user_id": "U1"}
            })))
            .await
            .unwrap();

        assert_eq!(
            action,
            ReconcileAction::SubscriptionUpserted {
                subscription_id: "sub_1".to_string(),
                plan_id: Some("P1".to_string())
            }
        );
        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.user_id, "U1");
        assert_eq!(stored.plan_id.as_deref(), Some("P1"));
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(stored.current_period_end, from_unix(Some(1_702_592_000)));
        assert_eq!(f.subscriptions.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_price_upserts_without_plan() {
        let f = fixture();
        f.provider.set_subscription(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "items": {"data": [{"price": {"id": "price_legacy"}}]}
        })));

        f.reconciler
            .dispatch(&checkout(json!({
                "mode": "subscription",
                "subscription": "sub_1",
                "metadata": {"user_id": "U1"}
            })))
            .await
            .unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert!(stored.plan_id.is_none());
    }

    #[tokio::test]
    async fn repeated_subscription_checkout_keeps_single_row() {
        let f = fixture();
        f.provider.set_subscription(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        })));
        let event = checkout(json!({
            "mode": "subscription",
            "subscription": "sub_1",
            "metadata": {"user_id": "U1"}
        }));

        f.reconciler.dispatch(&event).await.unwrap();
        f.reconciler.dispatch(&event).await.unwrap();

        assert_eq!(f.subscriptions.len().await, 1);
    }

    #[tokio::test]
    async fn subscription_checkout_without_user_is_ignored() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&checkout(json!({"mode": "subscription", "subscription": "sub_1"})))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
        assert_eq!(f.provider.fetch_count(), 0);
    }

    #[tokio::test]
    async fn subscription_missing_at_provider_fails() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&checkout(json!({
                "mode": "subscription",
                "subscription": "sub_gone",
                "metadata": {"user_id": "U1"}
            })))
            .await;

        assert!(matches!(result, Err(WebhookError::SubscriptionNotFound(id)) if id == "sub_gone"));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_provider_error() {
        let f = fixture();
        f.provider.fail_next(crate::ports::PaymentError::network("timeout"));

        let result = f
            .reconciler
            .dispatch(&checkout(json!({
                "mode": "subscription",
                "subscription": "sub_1",
                "metadata": {"user_id": "U1"}
            })))
            .await;

        assert!(matches!(result, Err(WebhookError::Provider(_))));
        assert_eq!(f.subscriptions.write_count(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // customer.subscription.updated / deleted
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_updated_writes_status_plan_and_period() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();

        f.reconciler
            .dispatch(&BillingEvent::SubscriptionUpdated(subscription_payload(json!({
                "id": "sub_1",
                "status": "active",
                "current_period_start": 1_710_000_000,
                "current_period_end": 1_712_592_000,
                "cancel_at_period_end": true,
                "items": {"data": [{"price": {"id": "price_team"}}]}
            }))))
            .await
            .unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.plan_id.as_deref(), Some("P2"));
        assert_eq!(stored.current_period_start, from_unix(Some(1_710_000_000)));
        assert!(stored.cancel_at_period_end);
    }

    #[tokio::test]
    async fn subscription_updated_twice_is_idempotent() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();
        let event = BillingEvent::SubscriptionUpdated(subscription_payload(json!({
            "id": "sub_1",
            "status": "past_due",
            "current_period_start": 1_710_000_000,
            "current_period_end": 1_712_592_000,
            "cancel_at_period_end": false
        })));

        f.reconciler.dispatch(&event).await.unwrap();
        let mut once = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        f.reconciler.dispatch(&event).await.unwrap();
        let twice = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();

        once.updated_at = twice.updated_at;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn out_of_order_updates_take_plan_and_period_from_last_event() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();
        let newer = BillingEvent::SubscriptionUpdated(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "current_period_start": 1_720_000_000,
            "current_period_end": 1_722_592_000,
            "items": {"data": [{"price": {"id": "price_team"}}]}
        })));
        let older = BillingEvent::SubscriptionUpdated(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "current_period_start": 1_710_000_000,
            "current_period_end": 1_712_592_000,
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        })));

        f.reconciler.dispatch(&newer).await.unwrap();
        f.reconciler.dispatch(&older).await.unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.plan_id.as_deref(), Some("P1"));
        assert_eq!(stored.current_period_start, from_unix(Some(1_710_000_000)));
        assert_eq!(stored.current_period_end, from_unix(Some(1_712_592_000)));
    }

    #[tokio::test]
    async fn uncataloged_price_after_known_price_clears_plan() {
        let f = fixture();
        let mut sub = stored_subscription("sub_1");
        sub.plan_id = None;
        f.subscriptions.upsert(&sub).await.unwrap();
        let known = BillingEvent::SubscriptionUpdated(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "current_period_start": 1000,
            "current_period_end": 1500,
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        })));
        let legacy = BillingEvent::SubscriptionUpdated(subscription_payload(json!({
            "id": "sub_1",
            "status": "active",
            "current_period_start": 2000,
            "current_period_end": 2500,
            "items": {"data": [{"price": {"id": "price_legacy"}}]}
        })));

        f.reconciler.dispatch(&known).await.unwrap();
        f.reconciler.dispatch(&legacy).await.unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert!(stored.plan_id.is_none());
        assert_eq!(stored.current_period_start, from_unix(Some(2000)));
        assert_eq!(stored.current_period_end, from_unix(Some(2500)));
    }

    #[tokio::test]
    async fn update_without_price_keeps_stored_plan() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();

        f.reconciler
            .dispatch(&BillingEvent::SubscriptionUpdated(subscription_payload(json!({
                "id": "sub_1",
                "status": "past_due"
            }))))
            .await
            .unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.plan_id.as_deref(), Some("P1"));
        assert_eq!(stored.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn subscription_deleted_forces_canceled() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();

        f.reconciler
            .dispatch(&BillingEvent::SubscriptionDeleted(subscription_payload(json!({
                "id": "sub_1",
                "status": "active"
            }))))
            .await
            .unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Canceled);
        assert_eq!(stored.user_id, "U1");
    }

    #[tokio::test]
    async fn update_for_unknown_subscription_is_ignored() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&BillingEvent::SubscriptionUpdated(subscription_payload(json!({
                "id": "sub_unknown",
                "status": "active"
            }))))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
        assert_eq!(f.subscriptions.len().await, 0);
    }

    // ══════════════════════════════════════════════════════════════
    // invoice.payment_succeeded / invoice.payment_failed
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn renewal_updates_period_and_reactivates() {
        let f = fixture();
        let mut sub = stored_subscription("sub_1");
        sub.status = SubscriptionStatus::PastDue;
        f.subscriptions.upsert(&sub).await.unwrap();

        f.reconciler
            .dispatch(&BillingEvent::InvoicePaymentSucceeded(invoice_payload(json!({
                "subscription": "sub_1",
                "billing_reason": "subscription_cycle",
                "lines": {"data": [{"period": {"start": 1_702_592_000, "end": 1_705_270_400}}]}
            }))))
            .await
            .unwrap();

        let stored = f.subscriptions.find_by_external_id("sub_1").await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(stored.current_period_start, from_unix(Some(1_702_592_000)));
        assert_eq!(stored.current_period_end, from_unix(Some(1_705_270_400)));
    }

    #[tokio::test]
    async fn first_invoice_of_subscription_is_ignored() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();
        let writes_before = f.subscriptions.write_count();

        let result = f
            .reconciler
            .dispatch(&BillingEvent::InvoicePaymentSucceeded(invoice_payload(json!({
                "subscription": "sub_1",
                "billing_reason": "subscription_create"
            }))))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
        assert_eq!(f.subscriptions.write_count(), writes_before);
    }

    #[tokio::test]
    async fn failed_payment_marks_past_due() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();

        let action = f
            .reconciler
            .dispatch(&BillingEvent::InvoicePaymentFailed(invoice_payload(json!({
                "subscription": "sub_1"
            }))))
            .await
            .unwrap();

        assert_eq!(
            action,
            ReconcileAction::SubscriptionUpdated {
                subscription_id: "sub_1".to_string(),
                status: Some(SubscriptionStatus::PastDue)
            }
        );
    }

    #[tokio::test]
    async fn failed_payment_without_subscription_is_ignored() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&BillingEvent::InvoicePaymentFailed(invoice_payload(json!({}))))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    #[tokio::test]
    async fn persistence_failure_is_reported() {
        let f = fixture();
        f.subscriptions.upsert(&stored_subscription("sub_1")).await.unwrap();
        f.subscriptions.set_failing(true);

        let result = f
            .reconciler
            .dispatch(&BillingEvent::InvoicePaymentFailed(invoice_payload(json!({
                "subscription": "sub_1"
            }))))
            .await;

        assert!(matches!(result, Err(WebhookError::Persistence(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Unrecognized
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unrecognized_event_is_ignored_without_side_effects() {
        let f = fixture();

        let result = f
            .reconciler
            .dispatch(&BillingEvent::Unrecognized {
                event_type: "charge.refunded".to_string(),
            })
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(reason)) if reason.contains("charge.refunded")));
        assert_eq!(f.subscriptions.write_count(), 0);
        assert_eq!(f.provider.fetch_count(), 0);
    }
}
