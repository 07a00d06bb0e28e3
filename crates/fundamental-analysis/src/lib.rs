pub mod compounding;
pub mod normalizer;
pub mod profile;
pub mod valuation;

pub use compounding::score_compounding;
pub use normalizer::normalize;
pub use profile::{profile, sector_insight};
pub use valuation::{sector_benchmark_pe, value, value_dcf, value_pe};

use analysis_core::{
    AnalysisError, CompanyProfile, CompoundingScore, EngineConfig, FinancialRecord, RawRecord,
    ValuationResult,
};

/// Fundamental side of the pipeline: normalization, valuation and
/// compounding quality, all driven by one [`EngineConfig`].
pub struct FundamentalAnalysisEngine {
    config: EngineConfig,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<FinancialRecord, AnalysisError> {
        normalizer::normalize(raw)
    }

    pub fn value(&self, record: &FinancialRecord, peer_multiple: Option<f64>) -> ValuationResult {
        valuation::value(record, peer_multiple, &self.config)
    }

    pub fn score_compounding(&self, record: &FinancialRecord) -> CompoundingScore {
        compounding::score_compounding(record, &self.config.compounding)
    }

    pub fn profile(&self, record: &FinancialRecord) -> CompanyProfile {
        profile::profile(record)
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
