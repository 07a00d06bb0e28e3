use std::sync::Arc;

use analysis_core::{
    AnalysisError, CompanyProfile, CompoundingScore, DataProvider, EngineConfig, FinancialRecord,
    MacroIndicatorSource, RecommendationResult, TechnicalSnapshot, ValuationResult,
};
use chrono::{DateTime, Utc};
use fundamental_analysis::FundamentalAnalysisEngine;
use serde::{Deserialize, Serialize};
use technical_analysis::TechnicalAnalysisEngine;

pub mod macro_context;
pub mod scorer;

pub use macro_context::{
    assess_macro, fetch_macro_snapshot, Impact, MacroContext, MacroSnapshot, MarketMood,
    SectorSensitivity, Sensitivity,
};
pub use scorer::{label_for, score};

/// Everything the engine knows about one symbol after a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub record: FinancialRecord,
    pub valuation: ValuationResult,
    pub technicals: TechnicalSnapshot,
    pub recommendation: RecommendationResult,
    pub compounding: CompoundingScore,
    pub profile: CompanyProfile,
    pub macro_context: Option<MacroContext>,
}

pub struct AnalysisOrchestrator {
    provider: Arc<dyn DataProvider>,
    /// Optional macro indicator feed; analysis runs without it
    macro_source: Option<Arc<dyn MacroIndicatorSource>>,
    fundamental_analyzer: FundamentalAnalysisEngine,
    technical_analyzer: TechnicalAnalysisEngine,
    config: EngineConfig,
}

impl AnalysisOrchestrator {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            macro_source: None,
            fundamental_analyzer: FundamentalAnalysisEngine::new(),
            technical_analyzer: TechnicalAnalysisEngine::new(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the engine configuration. Rejected when it fails validation.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        self.fundamental_analyzer = FundamentalAnalysisEngine::with_config(config.clone());
        self.technical_analyzer = TechnicalAnalysisEngine::with_config(config.technical.clone());
        self.config = config;
        Ok(self)
    }

    pub fn with_macro_source(mut self, source: Arc<dyn MacroIndicatorSource>) -> Self {
        self.macro_source = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch, normalize and score one symbol.
    ///
    /// Provider and normalization failures are returned as errors; nothing
    /// is computed from a record that failed normalization. A failing macro
    /// source only drops the macro context.
    pub async fn analyze(
        &self,
        symbol: &str,
        peer_multiple: Option<f64>,
    ) -> Result<StockAnalysis, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::DataError("empty symbol".to_string()));
        }
        tracing::info!("Starting analysis for {}", symbol);

        let (raw_result, macro_snapshot) = tokio::join!(
            self.provider.fetch_company_data(&symbol),
            self.fetch_macro(),
        );

        let raw = raw_result.map_err(|e| {
            tracing::warn!("Provider failed for {}: {}", symbol, e);
            e
        })?;
        let record = self.fundamental_analyzer.normalize(&raw)?;
        if record.symbol != symbol {
            tracing::warn!("Requested {} but provider returned {}", symbol, record.symbol);
        }
        if !record.missing_fields.is_empty() {
            tracing::debug!("{} missing fields: {:?}", record.symbol, record.missing_fields);
        }

        Ok(self.evaluate(record, peer_multiple, macro_snapshot))
    }

    /// Run the synchronous pipeline over an already normalized record.
    ///
    /// Pure computation over in-memory data; it runs inline on the caller's
    /// task.
    pub fn evaluate(
        &self,
        record: FinancialRecord,
        peer_multiple: Option<f64>,
        macro_snapshot: Option<MacroSnapshot>,
    ) -> StockAnalysis {
        let valuation = self.fundamental_analyzer.value(&record, peer_multiple);
        let technicals = self.technical_analyzer.analyze(&record.price_history);

        let recommendation = scorer::score(&valuation, &technicals, &record, &self.config.scoring);
        let compounding = self.fundamental_analyzer.score_compounding(&record);
        let profile = self.fundamental_analyzer.profile(&record);
        let macro_context = macro_snapshot.map(|s| assess_macro(&s, record.sector.as_deref()));

        tracing::info!(
            "{}: {} (score {}), methods {:?}, compounding {:?}",
            record.symbol,
            recommendation.label.to_label(),
            recommendation
                .score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "n/a".to_string()),
            valuation.methods_used,
            compounding.verdict
        );

        StockAnalysis {
            symbol: record.symbol.clone(),
            generated_at: Utc::now(),
            record,
            valuation,
            technicals,
            recommendation,
            compounding,
            profile,
            macro_context,
        }
    }

    async fn fetch_macro(&self) -> Option<MacroSnapshot> {
        match &self.macro_source {
            Some(source) => fetch_macro_snapshot(source.as_ref()).await,
            None => None,
        }
    }
}
