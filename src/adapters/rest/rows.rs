//! Wire rows for the REST billing store.
//!
//! Column names follow the database schema, which uses `stripe_*` where the
//! domain speaks of external ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::billing::{
    InvoicePayment, InvoiceStatus, Subscription, SubscriptionChanges, SubscriptionStatus,
};

#[derive(Debug, Serialize)]
pub(crate) struct InvoicePaymentPatch<'a> {
    pub status: InvoiceStatus,
    pub paid_at: DateTime<Utc>,
    pub payment_method: &'a str,
    pub amount_paid: f64,
}

impl<'a> From<&'a InvoicePayment> for InvoicePaymentPatch<'a> {
    fn from(payment: &'a InvoicePayment) -> Self {
        Self {
            status: payment.status(),
            paid_at: payment.paid_at,
            payment_method: &payment.payment_method,
            amount_paid: payment.amount_paid(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SubscriptionRow {
    pub user_id: String,
    pub plan_id: Option<String>,
    pub stripe_subscription_id: String,
    pub stripe_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(s: &Subscription) -> Self {
        Self {
            user_id: s.user_id.clone(),
            plan_id: s.plan_id.clone(),
            stripe_subscription_id: s.external_subscription_id.clone(),
            stripe_customer_id: s.external_customer_id.clone(),
            status: s.status,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
            cancel_at_period_end: s.cancel_at_period_end,
            updated_at: s.updated_at,
        }
    }
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            user_id: row.user_id,
            plan_id: row.plan_id,
            external_subscription_id: row.stripe_subscription_id,
            external_customer_id: row.stripe_customer_id,
            status: row.status,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            updated_at: row.updated_at,
        }
    }
}

/// Partial update body. Absent fields are omitted so the store keeps them.
#[derive(Debug, Serialize)]
pub(crate) struct SubscriptionPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    /// Outer `None` omits the column; `Some(None)` writes null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> SubscriptionPatch<'a> {
    pub fn new(changes: &'a SubscriptionChanges, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: changes.status,
            plan_id: changes.plan_id.as_ref().map(|p| p.as_deref()),
            current_period_start: changes.current_period_start,
            current_period_end: changes.current_period_end,
            cancel_at_period_end: changes.cancel_at_period_end,
            updated_at,
        }
    }
}
