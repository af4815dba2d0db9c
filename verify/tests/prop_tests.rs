use proptest::prelude::*;

use wellspring_verify::code::{validate_candidate, CODE_LEN};
use wellspring_verify::VerificationCode;

#[test]
fn every_generated_code_is_six_decimal_digits() {
    for _ in 0..1_000 {
        let code = VerificationCode::generate();
        assert_eq!(code.as_str().len(), CODE_LEN);
        assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        let value: u32 = code.as_str().parse().unwrap();
        assert!((100_000..=999_999).contains(&value));
    }
}

#[test]
fn consecutive_resends_do_not_degenerate() {
    // A broken RNG repeating one value would make every resend reissue
    // the same code. 100 draws colliding pairwise every time is
    // impossible for a working generator; even a single all-equal run
    // has probability (1/900000)^99.
    let codes: std::collections::HashSet<String> = (0..100)
        .map(|_| VerificationCode::generate().as_str().to_string())
        .collect();
    assert!(codes.len() > 1);
}

proptest! {
    /// A generated code always matches itself and validates as a candidate.
    #[test]
    fn issued_code_is_a_valid_candidate(_seed in 0u8..) {
        let code = VerificationCode::generate();
        prop_assert!(validate_candidate(code.as_str()).is_ok());
        prop_assert!(code.matches(code.as_str()));
    }

    /// No string that differs from the issued code ever matches it.
    #[test]
    fn only_the_issued_code_matches(candidate in "[0-9]{6}") {
        let code = VerificationCode::generate();
        if candidate != code.as_str() {
            prop_assert!(!code.matches(&candidate));
        }
    }

    /// Candidates that are not exactly six ASCII digits never validate.
    #[test]
    fn malformed_candidates_are_rejected(candidate in "[0-9]{0,5}|[0-9]{7,9}|[a-z0-9]{6}") {
        let six_digits = candidate.len() == 6 && candidate.bytes().all(|b| b.is_ascii_digit());
        prop_assert_eq!(validate_candidate(&candidate).is_ok(), six_digits);
    }
}
