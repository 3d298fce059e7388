//! Subscription aggregate mirrored from Stripe.
//!
//! A row is keyed by the provider's subscription id. Creation and every later
//! update resolve to the same row; rows are never deleted, cancellation is a
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription status, mirroring Stripe's status set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    /// Maps a Stripe status string. Unknown statuses yield `None`.
    pub fn from_provider(status: &str) -> Option<Self> {
        match status {
            "active" => Some(Self::Active),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            "trialing" => Some(Self::Trialing),
            "incomplete" => Some(Self::Incomplete),
            "incomplete_expired" => Some(Self::IncompleteExpired),
            "unpaid" => Some(Self::Unpaid),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Trialing => "trialing",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
        }
    }

}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted subscription row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    /// `None` when the Stripe price is not present in the plan catalog.
    pub plan_id: Option<String>,
    pub external_subscription_id: String,
    pub external_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Applies a partial update. Fields absent from `changes` are left untouched.
    pub fn apply(&mut self, changes: &SubscriptionChanges, updated_at: DateTime<Utc>) {
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(plan_id) = &changes.plan_id {
            self.plan_id = plan_id.clone();
        }
        if let Some(start) = changes.current_period_start {
            self.current_period_start = Some(start);
        }
        if let Some(end) = changes.current_period_end {
            self.current_period_end = Some(end);
        }
        if let Some(flag) = changes.cancel_at_period_end {
            self.cancel_at_period_end = flag;
        }
        self.updated_at = updated_at;
    }
}

/// Partial update produced by one lifecycle event.
///
/// All fields a payload carries are written together in a single update, so
/// plan and billing period always come from the same event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub status: Option<SubscriptionStatus>,
    /// `None` leaves the plan alone; `Some(None)` clears it (price not in catalog).
    pub plan_id: Option<Option<String>>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: Option<bool>,
}

impl SubscriptionChanges {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Writes the plan column, clearing it when `plan_id` is `None`.
    pub fn with_plan(mut self, plan_id: Option<String>) -> Self {
        self.plan_id = Some(plan_id);
        self
    }

    pub fn with_period(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.current_period_start = start;
        self.current_period_end = end;
        self
    }

    pub fn with_cancel_at_period_end(mut self, flag: Option<bool>) -> Self {
        self.cancel_at_period_end = flag;
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Converts a Stripe unix timestamp.
pub fn from_unix(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}
