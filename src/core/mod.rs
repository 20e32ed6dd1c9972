//! Conversion workflow, history and their supporting types

pub mod amount;
pub mod config;
pub mod controller;
pub mod currency;
pub mod error;
pub mod history;
pub mod log;

// Re-export main types for cleaner imports
pub use amount::{AmountInput, is_valid_amount};
pub use controller::{ConversionController, ConversionState, is_data_valid};
pub use currency::{CurrencyCode, RateLookupClient, RateResponse, SupportedCurrencies};
pub use error::{InputError, LookupFailure};
pub use history::{ConversionRecord, HistoryLog, RecordKey};
