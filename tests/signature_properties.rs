//! Property tests for webhook signature verification.

use proptest::prelude::*;
use secrecy::SecretString;

use billing_reconciler::domain::billing::{
    sign_payload, StripeWebhookVerifier, VerificationMode, WebhookError, SIGNATURE_TOLERANCE_SECS,
};

const SECRET: &str = "whsec_property_secret";
const NOW: i64 = 1_700_000_000;

fn verifier() -> StripeWebhookVerifier {
    StripeWebhookVerifier::new(VerificationMode::Enforced(SecretString::new(
        SECRET.to_string(),
    )))
}

proptest! {
    #[test]
    fn signed_payload_verifies(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
        let header = sign_payload(SECRET, NOW, &payload).unwrap();

        prop_assert!(verifier().verify_at(&payload, Some(&header), NOW).is_ok());
    }

    #[test]
    fn any_single_byte_mutation_is_rejected(
        payload in proptest::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let header = sign_payload(SECRET, NOW, &payload).unwrap();
        let mut tampered = payload.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= flip;

        let result = verifier().verify_at(&tampered, Some(&header), NOW);

        prop_assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn timestamps_outside_window_are_rejected(
        skew in (SIGNATURE_TOLERANCE_SECS + 1)..100_000i64,
        future in any::<bool>(),
    ) {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let signed_at = if future { NOW + skew } else { NOW - skew };
        let header = sign_payload(SECRET, signed_at, payload).unwrap();

        let result = verifier().verify_at(payload, Some(&header), NOW);

        prop_assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn timestamps_inside_window_are_accepted(
        skew in -SIGNATURE_TOLERANCE_SECS..=SIGNATURE_TOLERANCE_SECS,
    ) {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = sign_payload(SECRET, NOW + skew, payload).unwrap();

        prop_assert!(verifier().verify_at(payload, Some(&header), NOW).is_ok());
    }
}
