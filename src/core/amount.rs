//! Amount text as typed by the user.

use std::fmt;

/// Returns true if `text` looks like `digits[.dd]`: optional integer digits,
/// optionally followed by a dot and at most two fractional digits. The empty
/// string is accepted.
pub fn is_valid_amount(text: &str) -> bool {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    all_digits(int_part)
        && frac_part.is_none_or(|frac| frac.len() <= 2 && all_digits(frac))
}

/// An amount exactly as entered. Always satisfies [`is_valid_amount`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountInput(String);

impl AmountInput {
    /// Accepts `candidate` if it matches the amount pattern after uppercasing.
    pub fn parse(candidate: &str) -> Option<Self> {
        let candidate = candidate.to_uppercase();
        is_valid_amount(&candidate).then_some(AmountInput(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value of the amount. Empty text or a lone `.` yields NaN.
    pub fn to_number(&self) -> f64 {
        self.0.parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for AmountInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
