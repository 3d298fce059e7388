//! REST implementation of SubscriptionRepository.
//!
//! `upsert` relies on the unique index over `stripe_subscription_id`: the
//! store merges a conflicting insert into the existing row in one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;

use super::client::{eq, RestClient};
use super::rows::{SubscriptionPatch, SubscriptionRow};
use crate::domain::billing::{Subscription, SubscriptionChanges};
use crate::domain::foundation::DomainError;
use crate::ports::SubscriptionRepository;

const TABLE: &str = "subscriptions";
const CONFLICT_KEY: &str = "stripe_subscription_id";

pub struct RestSubscriptionRepository {
    client: RestClient,
}

impl RestSubscriptionRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscriptionRepository for RestSubscriptionRepository {
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let request = self
            .client
            .table(Method::POST, TABLE)
            .query(&[("on_conflict", CONFLICT_KEY)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&SubscriptionRow::from(subscription));

        self.client.send(request, "upsert subscription").await?;
        Ok(())
    }

    async fn update_by_external_id(
        &self,
        external_subscription_id: &str,
        changes: &SubscriptionChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let request = self
            .client
            .table(Method::PATCH, TABLE)
            .query(&[(CONFLICT_KEY, eq(external_subscription_id))])
            .header("Prefer", "return=representation")
            .json(&SubscriptionPatch::new(changes, updated_at));

        let response = self.client.send(request, "update subscription").await?;
        let rows: Vec<serde_json::Value> =
            RestClient::rows(response, "update subscription").await?;

        Ok(!rows.is_empty())
    }

    async fn find_by_external_id(
        &self,
        external_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let request = self
            .client
            .table(Method::GET, TABLE)
            .query(&[
                (CONFLICT_KEY, eq(external_subscription_id).as_str()),
                ("select", "*"),
            ]);

        let response = self.client.send(request, "find subscription").await?;
        let rows: Vec<SubscriptionRow> = RestClient::rows(response, "find subscription").await?;

        Ok(rows.into_iter().next().map(Subscription::from))
    }
}
