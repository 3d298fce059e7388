//! REST implementation of PlanCatalog.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{eq, RestClient};
use crate::domain::billing::Plan;
use crate::domain::foundation::DomainError;
use crate::ports::PlanCatalog;

pub struct RestPlanCatalog {
    client: RestClient,
}

impl RestPlanCatalog {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlanCatalog for RestPlanCatalog {
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError> {
        let request = self
            .client
            .table(Method::GET, "plans")
            .query(&[
                ("stripe_price_id", eq(price_id).as_str()),
                ("select", "id,name,stripe_price_id"),
                ("limit", "1"),
            ]);

        let response = self.client.send(request, "find plan").await?;
        let plans: Vec<Plan> = RestClient::rows(response, "find plan").await?;

        Ok(plans.into_iter().next())
    }
}
