//! Stripe webhook signature verification.
//!
//! Implements verification of Stripe webhook signatures using HMAC-SHA256
//! over the raw request bytes, with a symmetric 5-minute timestamp window to
//! reject replays.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed distance between the signature timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// How inbound webhooks are authenticated.
///
/// `Disabled` trusts every request and exists for local development only.
/// It must be chosen explicitly; the binary logs a warning at startup
/// whenever it is active.
#[derive(Clone)]
pub enum VerificationMode {
    Enforced(SecretString),
    Disabled,
}

impl VerificationMode {
    /// Enforced when a signing secret is configured, disabled otherwise.
    pub fn from_secret(secret: Option<SecretString>) -> Self {
        match secret {
            Some(secret) if !secret.expose_secret().is_empty() => Self::Enforced(secret),
            _ => Self::Disabled,
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self, Self::Enforced(_))
    }
}

impl std::fmt::Debug for VerificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enforced(_) => f.write_str("Enforced([REDACTED])"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret is rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...]`. Unknown
    /// keys such as the legacy `v0` are skipped.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=').ok_or_else(|| {
                WebhookError::MalformedSignatureHeader("expected key=value pairs".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedSignatureHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::MalformedSignatureHeader(
                            "invalid v1 signature hex".to_string(),
                        )
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            WebhookError::MalformedSignatureHeader("missing timestamp".to_string())
        })?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedSignatureHeader(
                "missing v1 signature".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
#[derive(Debug, Clone)]
pub struct StripeWebhookVerifier {
    mode: VerificationMode,
}

impl StripeWebhookVerifier {
    pub fn new(mode: VerificationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &VerificationMode {
        &self.mode
    }

    /// Verifies a delivery against the current wall clock.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        self.verify_at(payload, signature, chrono::Utc::now().timestamp())
    }

    /// Boolean verdict for callers that do not need the failure reason.
    pub fn is_authentic(&self, payload: &[u8], signature: Option<&str>) -> bool {
        self.verify(payload, signature).is_ok()
    }

    /// Verifies a delivery as of `now` (Unix seconds).
    ///
    /// 1. Parse the signature header
    /// 2. Reject timestamps more than 300 seconds from `now`
    /// 3. Compute HMAC-SHA256 of `"{t}." ++ payload`
    /// 4. Accept if any v1 signature matches in constant time
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<(), WebhookError> {
        let secret = match &self.mode {
            VerificationMode::Disabled => return Ok(()),
            VerificationMode::Enforced(secret) => secret,
        };

        let header = SignatureHeader::parse(signature.ok_or(WebhookError::MissingSignature)?)?;

        // `t` is attacker-controlled; abs_diff cannot overflow.
        let skew = now.abs_diff(header.timestamp);
        if skew > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                skew_secs = skew,
                "Webhook timestamp outside tolerance, possible replay"
            );
            return Err(WebhookError::TimestampOutOfRange);
        }

        let expected = compute_signature(secret.expose_secret(), header.timestamp, payload)?;

        if header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

/// Computes the raw HMAC-SHA256 for the given timestamp and payload bytes.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a `Stripe-Signature` header value for `payload`.
///
/// Used by tests and local tooling that replay captured events.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
