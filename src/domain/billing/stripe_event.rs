//! Stripe webhook event types.
//!
//! The envelope is parsed leniently and then resolved, once, into the closed
//! [`BillingEvent`] union. Payload objects only capture the fields the
//! reconciler reads; every other Stripe field is ignored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::subscription::{from_unix, SubscriptionStatus};
use super::webhook_errors::WebhookError;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CUSTOMER_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const CUSTOMER_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format). Absent in some
    /// hand-crafted test payloads; such events bypass the dedup ledger.
    #[serde(default)]
    pub id: Option<String>,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: Option<i64>,

    #[serde(default)]
    pub livemode: bool,

    pub data: StripeEventData,

    /// Stamped when the service parsed the event.
    #[serde(skip, default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Parses the raw body. Any JSON or shape error is malformed input.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// Resolves the event type and payload into a [`BillingEvent`].
    pub fn resolve(&self) -> Result<BillingEvent, WebhookError> {
        let event = match self.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => BillingEvent::CheckoutCompleted(self.object()?),
            CUSTOMER_SUBSCRIPTION_UPDATED => BillingEvent::SubscriptionUpdated(self.object()?),
            CUSTOMER_SUBSCRIPTION_DELETED => BillingEvent::SubscriptionDeleted(self.object()?),
            INVOICE_PAYMENT_SUCCEEDED => BillingEvent::InvoicePaymentSucceeded(self.object()?),
            INVOICE_PAYMENT_FAILED => BillingEvent::InvoicePaymentFailed(self.object()?),
            other => BillingEvent::Unrecognized {
                event_type: other.to_string(),
            },
        };
        Ok(event)
    }

    /// Event id for logging; `"-"` when the envelope carried none.
    pub fn log_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }

    fn object<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            WebhookError::ParseError(format!("invalid {} payload: {}", self.event_type, e))
        })
    }
}

/// Closed set of events the reconciler understands.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    CheckoutCompleted(StripeCheckoutSession),
    SubscriptionUpdated(StripeSubscription),
    SubscriptionDeleted(StripeSubscription),
    InvoicePaymentSucceeded(StripeInvoice),
    InvoicePaymentFailed(StripeInvoice),
    Unrecognized { event_type: String },
}

impl BillingEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            Self::SubscriptionUpdated(_) => CUSTOMER_SUBSCRIPTION_UPDATED,
            Self::SubscriptionDeleted(_) => CUSTOMER_SUBSCRIPTION_DELETED,
            Self::InvoicePaymentSucceeded(_) => INVOICE_PAYMENT_SUCCEEDED,
            Self::InvoicePaymentFailed(_) => INVOICE_PAYMENT_FAILED,
            Self::Unrecognized { event_type } => event_type,
        }
    }
}

/// Checkout session payload (`checkout.session.completed`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    #[serde(default)]
    pub id: Option<String>,
    /// `payment`, `subscription` or `setup`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Total in minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl StripeCheckoutSession {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn invoice_id(&self) -> Option<&str> {
        self.metadata_value("invoice_id")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.metadata_value("user_id")
    }

    pub fn is_subscription_mode(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }
}

/// Subscription payload, shared by lifecycle events and the provider fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeSubscription {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: Option<bool>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
}

impl StripeSubscription {
    pub fn status(&self) -> Option<SubscriptionStatus> {
        self.status
            .as_deref()
            .and_then(SubscriptionStatus::from_provider)
    }

    fn first_item(&self) -> Option<&StripeSubscriptionItem> {
        self.items.as_ref().and_then(|list| list.data.first())
    }

    /// Price of the first subscription item.
    pub fn price_id(&self) -> Option<&str> {
        self.first_item()
            .and_then(|item| item.price.as_ref())
            .and_then(|price| price.id.as_deref())
    }

    /// Billing period start. Newer API versions only report it per item.
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        from_unix(
            self.current_period_start
                .or_else(|| self.first_item().and_then(|i| i.current_period_start)),
        )
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        from_unix(
            self.current_period_end
                .or_else(|| self.first_item().and_then(|i| i.current_period_end)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    #[serde(default)]
    pub price: Option<StripePrice>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripePrice {
    #[serde(default)]
    pub id: Option<String>,
}

/// Stripe list object (`{"object":"list","data":[...]}`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// Invoice payload (`invoice.payment_succeeded`, `invoice.payment_failed`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeInvoice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub billing_reason: Option<String>,
    #[serde(default)]
    pub period_start: Option<i64>,
    #[serde(default)]
    pub period_end: Option<i64>,
    #[serde(default)]
    pub lines: Option<StripeList<StripeInvoiceLine>>,
}

impl StripeInvoice {
    pub const SUBSCRIPTION_CYCLE: &'static str = "subscription_cycle";

    pub fn is_subscription_cycle(&self) -> bool {
        self.billing_reason.as_deref() == Some(Self::SUBSCRIPTION_CYCLE)
    }

    fn first_line_period(&self) -> Option<&StripePeriod> {
        self.lines
            .as_ref()
            .and_then(|lines| lines.data.first())
            .and_then(|line| line.period.as_ref())
    }

    /// Service period of the renewal: first line item, else the invoice itself.
    pub fn service_period(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self.first_line_period() {
            Some(period) => (from_unix(period.start), from_unix(period.end)),
            None => (from_unix(self.period_start), from_unix(self.period_end)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeInvoiceLine {
    #[serde(default)]
    pub period: Option<StripePeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripePeriod {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}
