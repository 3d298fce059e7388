//! Invoice aggregate and the payment patch applied by checkout webhooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an invoice.
///
/// Only `Paid` is ever written by webhook reconciliation; the other states
/// belong to the invoicing workflow of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Partial,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Partial => "partial",
        }
    }
}

/// Invoice as persisted by the billing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    /// Decimal amount in major currency units.
    pub amount_paid: Option<f64>,
}

impl Invoice {
    /// Creates an unpaid invoice in the `sent` state.
    pub fn sent(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: InvoiceStatus::Sent,
            paid_at: None,
            payment_method: None,
            amount_paid: None,
        }
    }

    /// Applies a provider payment, overwriting any previous payment data.
    pub fn apply_payment(&mut self, payment: &InvoicePayment) {
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(payment.paid_at);
        self.payment_method = Some(payment.payment_method.clone());
        self.amount_paid = Some(payment.amount_paid());
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Patch recording that an invoice was settled through Stripe Checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePayment {
    pub invoice_id: String,
    pub paid_at: DateTime<Utc>,
    pub payment_method: String,
    /// Provider-reported total in minor units (cents).
    pub amount_total_cents: i64,
}

impl InvoicePayment {
    /// Payment method recorded for every webhook-driven payment.
    pub const STRIPE: &'static str = "stripe";

    pub fn stripe(
        invoice_id: impl Into<String>,
        amount_total_cents: i64,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            paid_at,
            payment_method: Self::STRIPE.to_string(),
            amount_total_cents,
        }
    }

    /// Amount in major currency units, as stored on the invoice.
    pub fn amount_paid(&self) -> f64 {
        self.amount_total_cents as f64 / 100.0
    }

    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::Paid
    }
}
