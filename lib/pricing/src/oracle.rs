//! Price estimation oracles.

use crate::error::PriceError;
use async_trait::async_trait;
use budget_chat_ai::prompt::{PRICE_ESTIMATE_SYSTEM, price_estimate};
use budget_chat_ai::{LlmBackend, LlmRequest};
use std::sync::Arc;
use tracing::instrument;

/// Estimates a unit price for an item.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Returns the oracle's raw answer, expected to be a bare integer in pesos.
    async fn estimate(&self, item: &str) -> Result<String, PriceError>;
}

/// Oracle that asks a language model.
pub struct LlmPriceOracle {
    backend: Arc<dyn LlmBackend>,
}

impl LlmPriceOracle {
    /// Creates an oracle over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PriceOracle for LlmPriceOracle {
    #[instrument(skip(self), fields(model = %self.backend.model()))]
    async fn estimate(&self, item: &str) -> Result<String, PriceError> {
        let request = LlmRequest::new(price_estimate(item))
            .with_system(PRICE_ESTIMATE_SYSTEM)
            .with_temperature(0.3)
            .with_max_tokens(20);

        let response =
            self.backend
                .generate(&request)
                .await
                .map_err(|e| PriceError::OracleFailed {
                    reason: e.to_string(),
                })?;
        Ok(response.content)
    }
}

/// Extracts a positive whole-peso price from an oracle answer.
///
/// Takes the first number in the text, ignoring `.` thousands separators
/// and anything after a decimal comma. Returns `None` for no number or zero.
#[must_use]
pub fn parse_price(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse::<u64>().ok().filter(|price| *price > 0)
}
