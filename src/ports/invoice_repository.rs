//! Invoice repository port (write side).
//!
//! Webhook reconciliation only ever records payments against invoices the
//! dashboard created; it never creates or deletes invoices.

use async_trait::async_trait;

use crate::domain::billing::{Invoice, InvoicePayment};
use crate::domain::foundation::DomainError;

/// Repository port for the Invoice aggregate.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Marks the invoice paid with the given payment data.
    ///
    /// Returns `false` when no invoice with that id exists. Recording the
    /// same payment twice leaves the invoice unchanged apart from `paid_at`.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn record_payment(&self, payment: &InvoicePayment) -> Result<bool, DomainError>;

    /// Find an invoice by id.
    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, DomainError>;
}
