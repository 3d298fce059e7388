//! REST implementation of InvoiceRepository.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{eq, RestClient};
use super::rows::InvoicePaymentPatch;
use crate::domain::billing::{Invoice, InvoicePayment};
use crate::domain::foundation::DomainError;
use crate::ports::InvoiceRepository;

const TABLE: &str = "invoices";

pub struct RestInvoiceRepository {
    client: RestClient,
}

impl RestInvoiceRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InvoiceRepository for RestInvoiceRepository {
    async fn record_payment(&self, payment: &InvoicePayment) -> Result<bool, DomainError> {
        let request = self
            .client
            .table(Method::PATCH, TABLE)
            .query(&[("id", eq(&payment.invoice_id))])
            .header("Prefer", "return=representation")
            .json(&InvoicePaymentPatch::from(payment));

        let response = self.client.send(request, "record invoice payment").await?;
        let rows: Vec<serde_json::Value> =
            RestClient::rows(response, "record invoice payment").await?;

        Ok(!rows.is_empty())
    }

    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, DomainError> {
        let request = self
            .client
            .table(Method::GET, TABLE)
            .query(&[
                ("id", eq(invoice_id).as_str()),
                ("select", "id,status,paid_at,payment_method,amount_paid"),
            ]);

        let response = self.client.send(request, "find invoice").await?;
        let rows: Vec<Invoice> = RestClient::rows(response, "find invoice").await?;

        Ok(rows.into_iter().next())
    }
}
