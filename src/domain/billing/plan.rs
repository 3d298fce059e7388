use serde::{Deserialize, Serialize};

/// Catalog entry linking an internal plan to its Stripe price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub stripe_price_id: String,
}

impl Plan {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stripe_price_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stripe_price_id: stripe_price_id.into(),
        }
    }
}
