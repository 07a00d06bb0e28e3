use analysis_core::{Metric, RiskLevel, TechnicalConfig, TechnicalSnapshot, Trend};

use crate::indicators::*;

/// Trend from the moving-average crossover. Neutral when either average is
/// absent or they are equal.
pub fn trend_direction(sma_short: &Metric, sma_long: &Metric) -> Trend {
    match (sma_short.value(), sma_long.value()) {
        (Some(short), Some(long)) if short > long => Trend::Bullish,
        (Some(short), Some(long)) if short < long => Trend::Bearish,
        _ => Trend::Neutral,
    }
}

pub fn risk_level(volatility: &Metric, config: &TechnicalConfig) -> Option<RiskLevel> {
    volatility.value().map(|v| {
        if v > config.high_volatility {
            RiskLevel::High
        } else if v > config.moderate_volatility {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    })
}

/// Momentum snapshot of a chronological close series.
pub fn compute_technicals(closes: &[f64], config: &TechnicalConfig) -> TechnicalSnapshot {
    let sma_short = latest_sma(closes, config.short_window);
    let sma_long = latest_sma(closes, config.long_window);
    let rsi = latest_rsi(closes, config.rsi_period);
    let trend = trend_direction(&sma_short, &sma_long);
    let annualized_volatility = annualized_volatility(closes, config.trading_days_per_year);
    let risk_level = risk_level(&annualized_volatility, config);

    let last_close = closes
        .last()
        .map(|&c| Metric::new(c))
        .unwrap_or_else(Metric::missing);

    TechnicalSnapshot {
        sma_short,
        sma_long,
        rsi,
        trend,
        last_close,
        observations: closes.len(),
        annualized_volatility,
        risk_level,
    }
}

pub struct TechnicalAnalysisEngine {
    config: TechnicalConfig,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            config: TechnicalConfig::default(),
        }
    }

    pub fn with_config(config: TechnicalConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, closes: &[f64]) -> TechnicalSnapshot {
        let snapshot = compute_technicals(closes, &self.config);
        tracing::debug!(
            "Technicals over {} closes: trend {:?}, RSI {}",
            snapshot.observations,
            snapshot.trend,
            snapshot.rsi
        );
        snapshot
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
