use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Longest explicit DCF projection accepted.
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// DCF projection assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfAssumptions {
    /// Growth applied to free cash flow during the explicit projection (0.05 = 5%)
    pub near_term_growth: f64,
    /// Perpetual growth used by the Gordon terminal value
    pub terminal_growth: f64,
    /// Discount rate, a WACC proxy
    pub discount_rate: f64,
    pub projection_years: u32,
    /// Capex estimate as a fraction of revenue when only operating cash flow
    /// is reported
    pub capex_to_revenue: f64,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            near_term_growth: 0.05,
            terminal_growth: 0.02,
            discount_rate: 0.10,
            projection_years: 5,
            capex_to_revenue: 0.05,
        }
    }
}

/// Relative P/E valuation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeConfig {
    /// Multiple used when neither a peer multiple nor a sector benchmark is
    /// known. `None` makes the method unavailable instead.
    pub fallback_multiple: Option<f64>,
}

impl Default for PeConfig {
    fn default() -> Self {
        Self {
            fallback_multiple: Some(20.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub trading_days_per_year: f64,
    /// Annualized volatility above which risk is High
    pub high_volatility: f64,
    /// Annualized volatility above which risk is Moderate
    pub moderate_volatility: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            rsi_period: 14,
            trading_days_per_year: 252.0,
            high_volatility: 0.40,
            moderate_volatility: 0.25,
        }
    }
}

/// Weights, bands and label thresholds for the recommendation score.
///
/// Factor scores live in [-5, 5] and weights sum to at most 1, so the
/// composite score stays within [-5, 5].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub valuation_weight: f64,
    pub momentum_weight: f64,
    pub pe_weight: f64,
    /// Valuation gap (fraction) beyond which the factor is at full strength
    pub strong_gap: f64,
    /// Valuation gap beyond which the factor is at half strength
    pub mild_gap: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Trailing P/E above this draws a caution penalty
    pub pe_caution: f64,
    /// Positive trailing P/E below this earns a value bonus
    pub pe_value: f64,
    pub strong_buy_threshold: f64,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub strong_sell_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            valuation_weight: 0.5,
            momentum_weight: 0.3,
            pe_weight: 0.2,
            strong_gap: 0.20,
            mild_gap: 0.05,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            pe_caution: 40.0,
            pe_value: 10.0,
            strong_buy_threshold: 3.0,
            buy_threshold: 1.0,
            sell_threshold: -1.0,
            strong_sell_threshold: -3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompoundingConfig {
    /// Average ROE (fraction) that earns a full ROE score on its own
    pub high_roe: f64,
    /// Yearly growth of debt over earnings that drives debt discipline to zero
    pub debt_growth_tolerance: f64,
    pub strong_threshold: f64,
    pub moderate_threshold: f64,
}

impl Default for CompoundingConfig {
    fn default() -> Self {
        Self {
            high_roe: 0.20,
            debt_growth_tolerance: 0.25,
            strong_threshold: 7.0,
            moderate_threshold: 4.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dcf: DcfAssumptions,
    pub pe: PeConfig,
    pub technical: TechnicalConfig,
    pub scoring: ScoringConfig,
    pub compounding: CompoundingConfig,
}

impl EngineConfig {
    /// Load from `VALUATION_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let f = |key: &str, default: f64| -> f64 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        let d = Self::default();

        let fallback_multiple = match lookup("VALUATION_FALLBACK_PE") {
            Some(s) if s.trim().eq_ignore_ascii_case("none") => None,
            Some(s) => s.trim().parse().ok().or(d.pe.fallback_multiple),
            None => d.pe.fallback_multiple,
        };

        Self {
            dcf: DcfAssumptions {
                near_term_growth: f("VALUATION_NEAR_TERM_GROWTH", d.dcf.near_term_growth),
                terminal_growth: f("VALUATION_TERMINAL_GROWTH", d.dcf.terminal_growth),
                discount_rate: f("VALUATION_DISCOUNT_RATE", d.dcf.discount_rate),
                projection_years: lookup("VALUATION_PROJECTION_YEARS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(d.dcf.projection_years),
                capex_to_revenue: f("VALUATION_CAPEX_TO_REVENUE", d.dcf.capex_to_revenue),
            },
            pe: PeConfig { fallback_multiple },
            technical: d.technical,
            scoring: ScoringConfig {
                valuation_weight: f("VALUATION_WEIGHT_VALUATION", d.scoring.valuation_weight),
                momentum_weight: f("VALUATION_WEIGHT_MOMENTUM", d.scoring.momentum_weight),
                pe_weight: f("VALUATION_WEIGHT_PE", d.scoring.pe_weight),
                rsi_overbought: f("VALUATION_RSI_OVERBOUGHT", d.scoring.rsi_overbought),
                rsi_oversold: f("VALUATION_RSI_OVERSOLD", d.scoring.rsi_oversold),
                pe_caution: f("VALUATION_PE_CAUTION", d.scoring.pe_caution),
                pe_value: f("VALUATION_PE_VALUE", d.scoring.pe_value),
                strong_buy_threshold: f("VALUATION_STRONG_BUY_THRESHOLD", d.scoring.strong_buy_threshold),
                buy_threshold: f("VALUATION_BUY_THRESHOLD", d.scoring.buy_threshold),
                sell_threshold: f("VALUATION_SELL_THRESHOLD", d.scoring.sell_threshold),
                strong_sell_threshold: f("VALUATION_STRONG_SELL_THRESHOLD", d.scoring.strong_sell_threshold),
                ..d.scoring
            },
            compounding: d.compounding,
        }
    }

    /// Reject settings that would break the scoring invariants.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let d = &self.dcf;
        let rates = [
            ("near_term_growth", d.near_term_growth),
            ("terminal_growth", d.terminal_growth),
            ("discount_rate", d.discount_rate),
        ];
        if let Some((name, rate)) = rates.iter().find(|(_, r)| !r.is_finite() || *r <= -1.0) {
            return Err(AnalysisError::ConfigError(format!(
                "DCF {} must be finite and above -100%, got {}",
                name, rate
            )));
        }
        if !d.capex_to_revenue.is_finite() || d.capex_to_revenue < 0.0 {
            return Err(AnalysisError::ConfigError(format!(
                "capex to revenue must be finite and non-negative, got {}",
                d.capex_to_revenue
            )));
        }
        if d.discount_rate <= d.terminal_growth {
            return Err(AnalysisError::ConfigError(format!(
                "discount rate ({}) must exceed terminal growth ({})",
                d.discount_rate, d.terminal_growth
            )));
        }
        if d.projection_years == 0 || d.projection_years > MAX_PROJECTION_YEARS {
            return Err(AnalysisError::ConfigError(format!(
                "projection years must be within 1..={}, got {}",
                MAX_PROJECTION_YEARS, d.projection_years
            )));
        }

        let s = &self.scoring;
        let weights = [s.valuation_weight, s.momentum_weight, s.pe_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::ConfigError(
                "factor weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() > 1.0 + 1e-9 {
            return Err(AnalysisError::ConfigError(
                "factor weights must sum to at most 1.0".to_string(),
            ));
        }
        if s.rsi_oversold >= s.rsi_overbought {
            return Err(AnalysisError::ConfigError(format!(
                "RSI oversold band ({}) must be below overbought band ({})",
                s.rsi_oversold, s.rsi_overbought
            )));
        }
        if s.pe_value >= s.pe_caution {
            return Err(AnalysisError::ConfigError(format!(
                "P/E value band ({}) must be below caution band ({})",
                s.pe_value, s.pe_caution
            )));
        }
        if s.mild_gap < 0.0 || s.mild_gap > s.strong_gap {
            return Err(AnalysisError::ConfigError(
                "valuation gap bands must satisfy 0 <= mild <= strong".to_string(),
            ));
        }
        let ordered = s.strong_sell_threshold <= s.sell_threshold
            && s.sell_threshold < s.buy_threshold
            && s.buy_threshold <= s.strong_buy_threshold;
        if !ordered {
            return Err(AnalysisError::ConfigError(
                "label thresholds must be ordered strong_sell <= sell < buy <= strong_buy".to_string(),
            ));
        }
        let t = &self.technical;
        if t.short_window == 0 || t.long_window == 0 || t.rsi_period == 0 {
            return Err(AnalysisError::ConfigError(
                "technical windows must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dcf.discount_rate, 0.10);
        assert_eq!(config.dcf.terminal_growth, 0.02);
        assert_eq!(config.dcf.near_term_growth, 0.05);
        assert_eq!(config.dcf.projection_years, 5);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VALUATION_DISCOUNT_RATE", "0.08"),
            ("VALUATION_PROJECTION_YEARS", "10"),
            ("VALUATION_FALLBACK_PE", "none"),
            ("VALUATION_BUY_THRESHOLD", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.dcf.discount_rate, 0.08);
        assert_eq!(config.dcf.projection_years, 10);
        assert_eq!(config.pe.fallback_multiple, None);
        assert_eq!(config.scoring.buy_threshold, ScoringConfig::default().buy_threshold);
    }

    #[test]
    fn test_rejects_overweight() {
        let mut config = EngineConfig::default();
        config.scoring.momentum_weight = 0.6;
        assert!(matches!(config.validate(), Err(AnalysisError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_degenerate_dcf_assumptions() {
        let cases = [
            DcfAssumptions { near_term_growth: -1.5, ..Default::default() },
            DcfAssumptions { terminal_growth: -2.0, ..Default::default() },
            DcfAssumptions { discount_rate: 0.01, ..Default::default() },
            DcfAssumptions { near_term_growth: f64::NAN, ..Default::default() },
            DcfAssumptions { projection_years: 0, ..Default::default() },
            DcfAssumptions { projection_years: 3_000_000_000, ..Default::default() },
        ];
        for dcf in cases {
            let config = EngineConfig { dcf: dcf.clone(), ..Default::default() };
            assert!(
                matches!(config.validate(), Err(AnalysisError::ConfigError(_))),
                "accepted {:?}",
                dcf
            );
        }

        let config = EngineConfig {
            dcf: DcfAssumptions {
                near_term_growth: -0.5,
                terminal_growth: -0.2,
                projection_years: MAX_PROJECTION_YEARS,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_bands() {
        let mut config = EngineConfig::default();
        config.scoring.rsi_oversold = 80.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.scoring.buy_threshold = -2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"dcf": {"discount_rate": 0.12}}"#).unwrap();
        assert_eq!(config.dcf.discount_rate, 0.12);
        assert_eq!(config.dcf.terminal_growth, 0.02);
        assert_eq!(config.scoring, ScoringConfig::default());
    }
}
