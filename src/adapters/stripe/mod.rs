//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API. The
//! only call the reconciler needs is a subscription read.
//!
//! # Security
//!
//! - The secret key is held in `secrecy::SecretString` and sent as a bearer token

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::MockPaymentProvider;
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
