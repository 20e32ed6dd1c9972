//! Session state and the conversion workflow.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, ensure};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::amount::AmountInput;
use super::currency::{CurrencyCode, RateLookupClient, SupportedCurrencies};
use super::error::InputError;
use super::history::{ConversionRecord, HistoryLog, RecordKey};

/// True when both codes are three characters long and an amount was entered.
///
/// Neither numeric-ness nor a nonzero amount is checked here.
pub fn is_data_valid(from_currency: &str, to_currency: &str, amount: &str) -> bool {
    from_currency.len() == 3 && to_currency.len() == 3 && !amount.is_empty()
}

/// What the user has entered so far, plus the outcome of the last lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionState {
    pub amount: AmountInput,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    /// Empty when the last conversion succeeded or none ran yet.
    pub error: String,
}

impl ConversionState {
    pub fn is_data_valid(&self) -> bool {
        is_data_valid(
            self.from_currency.as_str(),
            self.to_currency.as_str(),
            self.amount.as_str(),
        )
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Owns one session: its input state, its history and the rate client.
pub struct ConversionController<C: RateLookupClient> {
    client: C,
    currencies: SupportedCurrencies,
    state: Mutex<ConversionState>,
    history: Mutex<HistoryLog>,
    last_key: AtomicU64,
}

impl<C: RateLookupClient> ConversionController<C> {
    /// Starts a session converting from the first configured currency to the
    /// second.
    pub fn new(client: C, currencies: SupportedCurrencies, history_capacity: usize) -> Result<Self> {
        ensure!(
            currencies.codes().len() >= 2,
            "At least two currencies must be configured, found {}",
            currencies.codes().len()
        );
        ensure!(history_capacity > 0, "History capacity must be at least 1");

        let codes = currencies.codes();
        let state = ConversionState {
            amount: AmountInput::default(),
            from_currency: codes[0].clone(),
            to_currency: codes[1].clone(),
            error: String::new(),
        };

        Ok(ConversionController {
            client,
            currencies,
            state: Mutex::new(state),
            history: Mutex::new(HistoryLog::with_capacity(history_capacity)),
            last_key: AtomicU64::new(0),
        })
    }

    pub fn currencies(&self) -> &SupportedCurrencies {
        &self.currencies
    }

    pub async fn state(&self) -> ConversionState {
        self.state.lock().await.clone()
    }

    pub async fn is_data_valid(&self) -> bool {
        self.state.lock().await.is_data_valid()
    }

    /// Replaces the amount if `candidate` is a valid amount. Invalid edits are
    /// dropped and reported only through the return value.
    pub async fn set_amount(&self, candidate: &str) -> bool {
        match AmountInput::parse(candidate) {
            Some(amount) => {
                self.state.lock().await.amount = amount;
                true
            }
            None => {
                debug!(candidate, "Discarding amount edit");
                false
            }
        }
    }

    pub async fn set_from_currency(&self, text: &str) -> Result<CurrencyCode, InputError> {
        let code = self.currencies.resolve(text)?;
        self.state.lock().await.from_currency = code.clone();
        Ok(code)
    }

    pub async fn set_to_currency(&self, text: &str) -> Result<CurrencyCode, InputError> {
        let code = self.currencies.resolve(text)?;
        self.state.lock().await.to_currency = code.clone();
        Ok(code)
    }

    /// Looks up the current pair and records the converted amount.
    ///
    /// On a lookup failure the message lands in the state's error field and
    /// the history is left alone. Empty or non-numeric amounts are converted
    /// to NaN and recorded as such.
    #[instrument(name = "Convert", skip(self))]
    pub async fn convert(&self) -> Option<ConversionRecord> {
        let (amount, from, to) = {
            let state = self.state.lock().await;
            (
                state.amount.clone(),
                state.from_currency.clone(),
                state.to_currency.clone(),
            )
        };

        let response = match self.client.fetch_rate(&from, &to).await {
            Ok(response) => {
                self.state.lock().await.error.clear();
                response
            }
            Err(failure) => {
                warn!(error = %failure, "Rate lookup failed");
                self.state.lock().await.error = failure.to_string();
                return None;
            }
        };

        let rate = response.rate_for(&to).unwrap_or_else(|| {
            warn!(currency = %to, "Rate missing from response");
            f64::NAN
        });
        let conversion_result = amount.to_number() * rate;

        let record = ConversionRecord {
            key: self.next_key(),
            from_currency: from,
            to_currency: to,
            amount,
            rate,
            conversion_result,
            created_at: Utc::now(),
        };
        info!(
            key = %record.key,
            amount = %record.amount,
            from = %record.from_currency,
            to = %record.to_currency,
            result = record.conversion_result,
            "Conversion recorded"
        );

        self.history.lock().await.append(record.clone());
        Some(record)
    }

    pub async fn history(&self) -> Vec<ConversionRecord> {
        self.history.lock().await.records()
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub async fn remove_record(&self, key: RecordKey) -> bool {
        self.history.lock().await.remove(key)
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    fn next_key(&self) -> RecordKey {
        RecordKey(self.last_key.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::currency::RateResponse;
    use crate::core::error::LookupFailure;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    /// Answers every lookup with the same canned result.
    pub(crate) struct StubClient {
        pub result: Result<RateResponse, LookupFailure>,
        pub calls: Arc<AtomicUsize>,
    }

    impl StubClient {
        pub(crate) fn with_rates(rates: &[(&str, f64)]) -> Self {
            let rates = rates
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect::<HashMap<_, _>>();
            StubClient {
                result: Ok(RateResponse { rates }),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn failing(failure: LookupFailure) -> Self {
            StubClient {
                result: Err(failure),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl RateLookupClient for StubClient {
        async fn fetch_rate(
            &self,
            _from: &CurrencyCode,
            _to: &CurrencyCode,
        ) -> Result<RateResponse, LookupFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    pub(crate) fn test_currencies() -> SupportedCurrencies {
        SupportedCurrencies::new(
            ["USD", "EUR", "GBP", "JPY"]
                .iter()
                .map(|c| CurrencyCode::parse(c).unwrap())
                .collect(),
        )
    }

    fn controller(client: StubClient) -> ConversionController<StubClient> {
        ConversionController::new(client, test_currencies(), 20).unwrap()
    }

    #[test]
    fn test_is_data_valid() {
        assert!(!is_data_valid("US", "EUR", "5"));
        assert!(is_data_valid("USD", "EUR", "5"));
        assert!(!is_data_valid("USD", "EUR", ""));
        assert!(is_data_valid("USD", "EUR", "0"));
    }

    #[test]
    fn test_new_rejects_single_currency() {
        let currencies = SupportedCurrencies::new(vec![CurrencyCode::parse("USD").unwrap()]);
        let result = ConversionController::new(StubClient::with_rates(&[]), currencies, 20);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_initial_state() {
        let controller = controller(StubClient::with_rates(&[]));
        let state = controller.state().await;
        assert_eq!(state.from_currency.as_str(), "USD");
        assert_eq!(state.to_currency.as_str(), "EUR");
        assert!(state.amount.is_empty());
        assert!(!state.has_error());
        assert!(!controller.is_data_valid().await);
    }

    #[tokio::test]
    async fn test_rejected_amount_keeps_previous() {
        let controller = controller(StubClient::with_rates(&[]));
        assert!(controller.set_amount("12.3").await);
        assert!(!controller.set_amount("12.345").await);
        assert_eq!(controller.state().await.amount.as_str(), "12.3");
        assert!(controller.is_data_valid().await);
    }

    #[tokio::test]
    async fn test_currency_selection() {
        let controller = controller(StubClient::with_rates(&[]));
        assert_eq!(controller.set_to_currency("gbp").await.unwrap().as_str(), "GBP");
        assert_eq!(
            controller.set_from_currency("CHF").await,
            Err(InputError::UnsupportedCurrency("CHF".to_string()))
        );
        let state = controller.state().await;
        assert_eq!(state.from_currency.as_str(), "USD");
        assert_eq!(state.to_currency.as_str(), "GBP");
    }

    #[tokio::test]
    async fn test_convert_success_records_result() {
        let controller = controller(StubClient::with_rates(&[("EUR", 0.9)]));
        controller.set_amount("10").await;

        let record = controller.convert().await.expect("a record");
        assert!((record.conversion_result - 9.0).abs() < 1e-9);
        assert_eq!(record.amount.as_str(), "10");
        assert_eq!(record.from_currency.as_str(), "USD");
        assert_eq!(record.to_currency.as_str(), "EUR");

        let history = controller.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], record);
        assert!(!controller.state().await.has_error());
    }

    #[tokio::test]
    async fn test_convert_service_failure_leaves_history() {
        let client = StubClient::failing(LookupFailure::ServiceReported("Invalid key".to_string()));
        let calls = Arc::clone(&client.calls);
        let controller = controller(client);
        controller.set_amount("10").await;

        assert!(controller.convert().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().await.error, "Invalid key");
        assert_eq!(controller.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_convert_transport_failure_sets_error() {
        let controller = controller(StubClient::failing(LookupFailure::Transport(
            "connection refused".to_string(),
        )));
        controller.set_amount("1").await;

        controller.convert().await;
        assert_eq!(
            controller.state().await.error,
            "Rate lookup failed: connection refused"
        );
        assert_eq!(controller.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let controller = controller(StubClient::with_rates(&[("EUR", 0.9)]));
        controller.state.lock().await.error = "Invalid key".to_string();
        controller.set_amount("10").await;

        controller.convert().await;
        assert_eq!(controller.state().await.error, "");
    }

    #[tokio::test]
    async fn test_empty_amount_records_nan() {
        let controller = controller(StubClient::with_rates(&[("EUR", 0.9)]));

        let record = controller.convert().await.expect("a record");
        assert!(record.conversion_result.is_nan());
        assert!(record.amount.is_empty());
        assert_eq!(controller.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_rate_records_nan() {
        let controller = controller(StubClient::with_rates(&[("GBP", 0.8)]));
        controller.set_amount("10").await;

        let record = controller.convert().await.expect("a record");
        assert!(record.rate.is_nan());
        assert!(record.conversion_result.is_nan());
    }

    #[tokio::test]
    async fn test_keys_strictly_increase_and_survive_clear() {
        let controller = controller(StubClient::with_rates(&[("EUR", 0.9)]));
        controller.set_amount("1").await;

        let first = controller.convert().await.unwrap().key;
        let second = controller.convert().await.unwrap().key;
        controller.clear_history().await;
        let third = controller.convert().await.unwrap().key;

        assert!(first < second && second < third);
        assert_eq!(controller.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let controller = controller(StubClient::with_rates(&[("EUR", 0.9)]));
        controller.set_amount("1").await;
        let mut keys = Vec::new();
        for _ in 0..3 {
            keys.push(controller.convert().await.unwrap().key);
        }

        assert!(controller.remove_record(keys[1]).await);
        assert!(!controller.remove_record(keys[1]).await);
        let remaining: Vec<_> = controller.history().await.iter().map(|r| r.key).collect();
        assert_eq!(remaining, vec![keys[0], keys[2]]);

        controller.clear_history().await;
        assert_eq!(controller.history_len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_conversions_do_not_lose_records() {
        let controller = Arc::new(controller(StubClient::with_rates(&[("EUR", 0.9)])));
        controller.set_amount("2").await;

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move { controller.convert().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let history = controller.history().await;
        assert_eq!(history.len(), 10);
        let mut keys: Vec<_> = history.iter().map(|r| r.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 10);
    }
}
