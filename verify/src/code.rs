//! One-time verification codes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VerifyError;

/// The code is always exactly this many decimal digits.
pub const CODE_LEN: usize = 6;

/// Lowest value the generator produces. Starting at 100000 means every
/// output is exactly six digits with no zero-padding case.
const CODE_MIN: u32 = 100_000;

/// Highest value the generator produces (inclusive).
const CODE_MAX: u32 = 999_999;

/// A 6-digit one-time numeric credential proving control of an email
/// address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh code, uniform over [100000, 999999].
    ///
    /// Called exactly once per issuance; the previous code is discarded
    /// by the caller, never reused.
    pub fn generate() -> Self {
        let n = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX);
        Self(n.to_string())
    }

    /// Build a code from a known digit string. Test seam only; real
    /// issuance always goes through [`VerificationCode::generate`].
    #[cfg(test)]
    pub(crate) fn known(digits: &str) -> Self {
        Self(digits.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string equality against a candidate. The candidate must
    /// already have passed [`validate_candidate`]; anything else simply
    /// fails to match.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that a submitted candidate is exactly six ASCII digits.
///
/// The UI assembles per-digit inputs into one string; a short or
/// non-numeric candidate is a validation error and never counts as a
/// failed attempt.
pub fn validate_candidate(candidate: &str) -> Result<&str, VerifyError> {
    if candidate.len() != CODE_LEN || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VerifyError::MalformedCandidate { expected: CODE_LEN });
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = VerificationCode::generate();
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(code.as_str().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn generation_is_not_degenerate() {
        // A constant RNG would produce one value; ten draws giving at
        // least two distinct codes catches that without flaking.
        let codes: std::collections::HashSet<String> = (0..10)
            .map(|_| VerificationCode::generate().as_str().to_string())
            .collect();
        assert!(codes.len() >= 2);
    }

    #[test]
    fn candidate_validation() {
        assert!(validate_candidate("482913").is_ok());
        assert!(validate_candidate("48291").is_err());
        assert!(validate_candidate("4829133").is_err());
        assert!(validate_candidate("48291a").is_err());
        assert!(validate_candidate("").is_err());
        assert!(validate_candidate("４８２９１３").is_err()); // non-ASCII digits
    }
}
