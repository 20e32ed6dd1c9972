//! Currency codes and the rate lookup abstraction

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{InputError, LookupFailure};

/// A three letter, uppercase currency code such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses `text` into a code, uppercasing it first.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let code = text.trim().to_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(CurrencyCode(code))
        } else {
            Err(InputError::MalformedCurrency(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// The fixed, ordered list of currencies a session may convert between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCurrencies {
    codes: Vec<CurrencyCode>,
}

impl SupportedCurrencies {
    pub fn new(codes: Vec<CurrencyCode>) -> Self {
        SupportedCurrencies { codes }
    }

    /// Resolves user text to a member of the configured set.
    pub fn resolve(&self, text: &str) -> Result<CurrencyCode, InputError> {
        let code = CurrencyCode::parse(text)?;
        if self.contains(&code) {
            Ok(code)
        } else {
            Err(InputError::UnsupportedCurrency(code.0))
        }
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

}

/// Decoded answer of a rate lookup. Rates are per 1 unit of the base currency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateResponse {
    pub rates: HashMap<String, f64>,
}

impl RateResponse {
    pub fn rate_for(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code.as_str()).copied()
    }
}

/// Fetches exchange rates from a remote service.
///
/// Implementations issue exactly one request per call and neither cache nor
/// retry. Membership of `from`/`to` in the supported set is the caller's
/// concern.
#[async_trait]
pub trait RateLookupClient: Send + Sync {
    async fn fetch_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<RateResponse, LookupFailure>;
}
