//! In-memory InvoiceRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{Invoice, InvoicePayment};
use crate::domain::foundation::DomainError;
use crate::ports::InvoiceRepository;

/// Invoice store held in a map keyed by invoice id.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, invoice: Invoice) {
        self.invoices
            .write()
            .await
            .insert(invoice.id.clone(), invoice);
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn record_payment(&self, payment: &InvoicePayment) -> Result<bool, DomainError> {
        let mut invoices = self.invoices.write().await;
        match invoices.get_mut(&payment.invoice_id) {
            Some(invoice) => {
                invoice.apply_payment(payment);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.read().await.get(invoice_id).cloned())
    }
}
