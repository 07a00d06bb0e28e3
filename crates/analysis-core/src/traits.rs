use async_trait::async_trait;

use crate::AnalysisError;

/// Loosely-structured provider response. Field presence is not guaranteed.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Source of per-company data (prices, fundamentals).
///
/// Retries, caching and timeouts belong to implementations; the engine calls
/// this once per analysis request.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_company_data(&self, symbol: &str) -> Result<RawRecord, AnalysisError>;
}

/// Source of macroeconomic indicator series (GDP growth, CPI, rates, VIX).
///
/// `Ok(None)` means the indicator is not available from this source.
#[async_trait]
pub trait MacroIndicatorSource: Send + Sync {
    async fn fetch_indicator(
        &self,
        name: &str,
        periods: usize,
    ) -> Result<Option<Vec<f64>>, AnalysisError>;
}
