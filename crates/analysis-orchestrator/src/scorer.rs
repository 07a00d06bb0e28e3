//! Multi-factor recommendation score.
//!
//! Three factors, each scored on [-5, 5] and weighted:
//!
//! | Factor        | Input                              | Default weight |
//! |---------------|------------------------------------|----------------|
//! | Valuation gap | (fair value - price) / price       | 0.5            |
//! | Momentum      | SMA crossover trend and RSI bands  | 0.3            |
//! | P/E sanity    | trailing P/E                       | 0.2            |
//!
//! An absent factor contributes zero and is flagged in the breakdown. The
//! score is exactly the sum of the contributions. Weights are applied as
//! given when they are non-negative and sum to at most one; otherwise they
//! are rescaled first, and the breakdown shows the weights actually used, so
//! the score never leaves [-5, 5].

use analysis_core::{
    AbsentReason, Factor, FactorContribution, FinancialRecord, Metric, Recommendation,
    RecommendationResult, ScoringConfig, TechnicalSnapshot, Trend, ValuationResult,
};

pub const MAX_SCORE: f64 = 5.0;
pub const MIN_SCORE: f64 = -5.0;

const FULL: f64 = 5.0;
const HALF: f64 = 2.5;

/// Score the valuation and technical outputs for one record.
pub fn score(
    valuation: &ValuationResult,
    technicals: &TechnicalSnapshot,
    record: &FinancialRecord,
    config: &ScoringConfig,
) -> RecommendationResult {
    let [valuation_weight, momentum_weight, pe_weight] = effective_weights(config);
    let breakdown = vec![
        valuation_gap(valuation, record.current_price, valuation_weight, config),
        momentum(technicals, momentum_weight, config),
        pe_sanity(&record.trailing_pe, pe_weight, config),
    ];
    let reason = summarize(&breakdown);

    if breakdown.iter().all(|f| !f.available) {
        tracing::debug!("{}: no scoring factor available", record.symbol);
        return RecommendationResult {
            score: None,
            label: Recommendation::InsufficientData,
            breakdown,
            reason,
        };
    }

    let total: f64 = breakdown.iter().map(|f| f.contribution).sum();

    RecommendationResult {
        score: Some(total),
        label: label_for(total, config),
        breakdown,
        reason,
    }
}

/// Weights as applied: negative or non-finite weights count as zero, and a
/// set summing to more than one is scaled down to sum to exactly one.
pub fn effective_weights(config: &ScoringConfig) -> [f64; 3] {
    let weights = [config.valuation_weight, config.momentum_weight, config.pe_weight]
        .map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 });
    let sum: f64 = weights.iter().sum();
    if sum > 1.0 {
        tracing::warn!("Factor weights sum to {:.3}; rescaling to 1.0", sum);
        weights.map(|w| w / sum)
    } else {
        weights
    }
}

/// Map a score to a label. Comparisons are strict, so a score sitting exactly
/// on a threshold falls to the weaker label.
pub fn label_for(score: f64, config: &ScoringConfig) -> Recommendation {
    if score > config.strong_buy_threshold {
        Recommendation::StrongBuy
    } else if score > config.buy_threshold {
        Recommendation::Buy
    } else if score < config.strong_sell_threshold {
        Recommendation::StrongSell
    } else if score < config.sell_threshold {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

fn contribution(
    factor: Factor,
    raw_value: Metric,
    factor_score: Option<f64>,
    weight: f64,
    detail: String,
) -> FactorContribution {
    let (factor_score, available) = match factor_score {
        Some(s) => (s.clamp(MIN_SCORE, MAX_SCORE), true),
        None => (0.0, false),
    };
    FactorContribution {
        factor,
        raw_value,
        factor_score,
        weight,
        contribution: weight * factor_score,
        available,
        detail,
    }
}

fn valuation_gap(
    valuation: &ValuationResult,
    price: f64,
    weight: f64,
    config: &ScoringConfig,
) -> FactorContribution {
    let (method, fair_value) = match valuation.best_fair_value() {
        Some(best) if price > 0.0 => best,
        _ => {
            return contribution(
                Factor::ValuationGap,
                Metric::Absent(AbsentReason::Missing),
                None,
                weight,
                "no fair value available".to_string(),
            )
        }
    };

    let gap = (fair_value - price) / price;
    let factor_score = if gap > config.strong_gap {
        FULL
    } else if gap > config.mild_gap {
        HALF
    } else if gap < -config.strong_gap {
        -FULL
    } else if gap < -config.mild_gap {
        -HALF
    } else {
        0.0
    };

    contribution(
        Factor::ValuationGap,
        Metric::new(gap),
        Some(factor_score),
        weight,
        format!(
            "{} fair value {:.2} vs price {:.2} ({:+.1}%)",
            method.label(),
            fair_value,
            price,
            gap * 100.0
        ),
    )
}

fn momentum(technicals: &TechnicalSnapshot, weight: f64, config: &ScoringConfig) -> FactorContribution {
    let trend_known = technicals.sma_short.is_present() && technicals.sma_long.is_present();
    let rsi = technicals.rsi.value();

    if !trend_known && rsi.is_none() {
        return contribution(
            Factor::Momentum,
            technicals.rsi.clone(),
            None,
            weight,
            format!("moving averages and RSI unavailable ({} closes)", technicals.observations),
        );
    }

    let mut factor_score = 0.0;
    let mut notes = Vec::new();

    if trend_known {
        factor_score += match technicals.trend {
            Trend::Bullish => HALF,
            Trend::Bearish => -HALF,
            Trend::Neutral => 0.0,
        };
        notes.push(format!("trend {:?}", technicals.trend).to_lowercase());
    }

    if let Some(rsi) = rsi {
        if rsi > config.rsi_overbought {
            factor_score -= HALF;
            notes.push(format!("RSI {:.1} overbought", rsi));
        } else if rsi < config.rsi_oversold {
            factor_score += HALF;
            notes.push(format!("RSI {:.1} oversold", rsi));
        } else {
            notes.push(format!("RSI {:.1}", rsi));
        }
    }

    contribution(
        Factor::Momentum,
        technicals.rsi.clone(),
        Some(factor_score),
        weight,
        notes.join(", "),
    )
}

fn pe_sanity(trailing_pe: &Metric, weight: f64, config: &ScoringConfig) -> FactorContribution {
    let pe = match trailing_pe.value() {
        Some(pe) => pe,
        None => {
            return contribution(
                Factor::PeSanity,
                trailing_pe.clone(),
                None,
                weight,
                "trailing P/E unavailable".to_string(),
            )
        }
    };

    let (factor_score, detail) = if pe > config.pe_caution {
        (-FULL, format!("P/E {:.1} above {:.0}", pe, config.pe_caution))
    } else if pe > 0.0 && pe < config.pe_value {
        (FULL, format!("P/E {:.1} below {:.0}", pe, config.pe_value))
    } else if pe <= 0.0 {
        (0.0, format!("P/E {:.1} not meaningful", pe))
    } else {
        (0.0, format!("P/E {:.1} in range", pe))
    };

    contribution(Factor::PeSanity, trailing_pe.clone(), Some(factor_score), weight, detail)
}

fn summarize(breakdown: &[FactorContribution]) -> String {
    let parts: Vec<String> = breakdown
        .iter()
        .filter(|f| f.available && f.contribution != 0.0)
        .map(|f| {
            let sign = if f.contribution > 0.0 { "+" } else { "-" };
            format!("{} {}", sign, f.factor.name())
        })
        .collect();

    if parts.is_empty() {
        "No decisive factors".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Confidence, MethodValuation, ValuationMethod};

    fn valuation(dcf: Option<f64>, pe: Option<f64>) -> ValuationResult {
        let method = |m: ValuationMethod, v: Option<f64>| match v {
            Some(v) => MethodValuation {
                method: m,
                fair_value: Metric::new(v),
                confidence: Confidence::Full,
                notes: vec![],
            },
            None => MethodValuation::unavailable(m, AbsentReason::Missing, "test"),
        };
        let dcf = method(ValuationMethod::Dcf, dcf);
        let pe = method(ValuationMethod::PriceEarnings, pe);
        let methods_used = [&dcf, &pe]
            .iter()
            .filter(|m| m.is_available())
            .map(|m| m.method)
            .collect();
        ValuationResult {
            dcf,
            pe,
            methods_used,
            graham_number: Metric::missing(),
            peg_ratio: Metric::missing(),
        }
    }

    fn technicals(sma: Option<(f64, f64)>, rsi: Option<f64>) -> TechnicalSnapshot {
        let (sma_short, sma_long, trend) = match sma {
            Some((s, l)) => (
                Metric::new(s),
                Metric::new(l),
                if s > l {
                    Trend::Bullish
                } else if s < l {
                    Trend::Bearish
                } else {
                    Trend::Neutral
                },
            ),
            None => (Metric::missing(), Metric::missing(), Trend::Neutral),
        };
        TechnicalSnapshot {
            sma_short,
            sma_long,
            rsi: rsi.map(Metric::new).unwrap_or_else(Metric::missing),
            trend,
            last_close: Metric::missing(),
            observations: 60,
            annualized_volatility: Metric::missing(),
            risk_level: None,
        }
    }

    fn record(price: f64, pe: Option<f64>) -> FinancialRecord {
        let mut record = FinancialRecord::new("TEST", price);
        record.trailing_pe = pe.map(Metric::new).unwrap_or_else(Metric::missing);
        record
    }

    #[test]
    fn test_everything_absent_is_insufficient_data() {
        let result = score(
            &valuation(None, None),
            &technicals(None, None),
            &record(100.0, None),
            &ScoringConfig::default(),
        );
        assert_eq!(result.label, Recommendation::InsufficientData);
        assert_eq!(result.score, None);
        assert_eq!(result.breakdown.len(), 3);
        assert!(result.breakdown.iter().all(|f| !f.available && f.contribution == 0.0));
    }

    #[test]
    fn test_score_equals_sum_of_contributions() {
        let cases = [
            (valuation(Some(150.0), None), technicals(Some((110.0, 100.0)), Some(25.0)), Some(8.0)),
            (valuation(None, Some(90.0)), technicals(None, Some(75.0)), Some(45.0)),
            (valuation(Some(100.0), Some(80.0)), technicals(Some((90.0, 100.0)), None), None),
            (valuation(None, None), technicals(Some((100.0, 100.0)), Some(50.0)), Some(-3.0)),
        ];
        for (v, t, pe) in cases.iter() {
            let result = score(v, t, &record(100.0, *pe), &ScoringConfig::default());
            let total = result.score.unwrap();
            assert!((total - result.contribution_total()).abs() < 1e-12);
            assert!((MIN_SCORE..=MAX_SCORE).contains(&total));
        }
    }

    #[test]
    fn test_maximal_bullish_case() {
        let result = score(
            &valuation(Some(150.0), None),
            &technicals(Some((110.0, 100.0)), Some(25.0)),
            &record(100.0, Some(8.0)),
            &ScoringConfig::default(),
        );
        assert_eq!(result.score, Some(5.0));
        assert_eq!(result.label, Recommendation::StrongBuy);
        assert_eq!(result.reason, "+ Valuation Gap, + Momentum, + P/E Sanity");
    }

    #[test]
    fn test_maximal_bearish_case() {
        let result = score(
            &valuation(None, Some(60.0)),
            &technicals(Some((90.0, 100.0)), Some(80.0)),
            &record(100.0, Some(55.0)),
            &ScoringConfig::default(),
        );
        assert_eq!(result.score, Some(-5.0));
        assert_eq!(result.label, Recommendation::StrongSell);
    }

    #[test]
    fn test_valuation_gap_bands() {
        let config = ScoringConfig::default();
        let gap_score = |fv: f64| {
            let r = score(&valuation(Some(fv), None), &technicals(None, None), &record(100.0, None), &config);
            r.breakdown[0].factor_score
        };
        assert_eq!(gap_score(125.0), 5.0);
        assert_eq!(gap_score(110.0), 2.5);
        assert_eq!(gap_score(103.0), 0.0);
        assert_eq!(gap_score(90.0), -2.5);
        assert_eq!(gap_score(70.0), -5.0);
    }

    #[test]
    fn test_dcf_preferred_over_pe_for_gap() {
        let result = score(
            &valuation(Some(130.0), Some(70.0)),
            &technicals(None, None),
            &record(100.0, None),
            &ScoringConfig::default(),
        );
        let gap = &result.breakdown[0];
        assert!((gap.raw_value.value().unwrap() - 0.30).abs() < 1e-12);
        assert!(gap.detail.starts_with("DCF"));
    }

    #[test]
    fn test_threshold_ties_resolve_to_hold() {
        // P/E bonus alone contributes exactly 0.2 * 5 = 1.0
        let result = score(
            &valuation(None, None),
            &technicals(None, None),
            &record(100.0, Some(5.0)),
            &ScoringConfig::default(),
        );
        assert_eq!(result.score, Some(1.0));
        assert_eq!(result.label, Recommendation::Hold);

        let config = ScoringConfig::default();
        assert_eq!(label_for(3.0, &config), Recommendation::Buy);
        assert_eq!(label_for(-1.0, &config), Recommendation::Hold);
        assert_eq!(label_for(-3.0, &config), Recommendation::Sell);
        assert_eq!(label_for(1.25, &config), Recommendation::Buy);
        assert_eq!(label_for(-3.5, &config), Recommendation::StrongSell);
    }

    #[test]
    fn test_rsi_alone_keeps_momentum_available() {
        let result = score(
            &valuation(None, None),
            &technicals(None, Some(20.0)),
            &record(100.0, None),
            &ScoringConfig::default(),
        );
        let momentum = &result.breakdown[1];
        assert!(momentum.available);
        assert_eq!(momentum.factor_score, 2.5);
        assert!((result.score.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(result.label, Recommendation::Hold);
    }

    #[test]
    fn test_negative_pe_is_present_but_neutral() {
        let result = score(
            &valuation(None, None),
            &technicals(None, None),
            &record(100.0, Some(-12.0)),
            &ScoringConfig::default(),
        );
        let pe = &result.breakdown[2];
        assert!(pe.available);
        assert_eq!(pe.factor_score, 0.0);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.label, Recommendation::Hold);
        assert_eq!(result.reason, "No decisive factors");
    }

    #[test]
    fn test_weights_follow_config() {
        let config = ScoringConfig {
            valuation_weight: 1.0,
            momentum_weight: 0.0,
            pe_weight: 0.0,
            ..Default::default()
        };
        let result = score(
            &valuation(Some(110.0), None),
            &technicals(Some((110.0, 100.0)), Some(50.0)),
            &record(100.0, Some(8.0)),
            &config,
        );
        assert_eq!(result.score, Some(2.5));
        assert_eq!(result.label, Recommendation::Buy);
    }

    #[test]
    fn test_overweight_config_is_rescaled_not_clamped() {
        let config = ScoringConfig {
            valuation_weight: 1.0,
            momentum_weight: 1.0,
            pe_weight: 1.0,
            ..Default::default()
        };
        let result = score(
            &valuation(Some(150.0), None),
            &technicals(Some((110.0, 100.0)), Some(25.0)),
            &record(100.0, Some(8.0)),
            &config,
        );
        let total = result.score.unwrap();
        assert_eq!(total, result.contribution_total());
        assert!((total - MAX_SCORE).abs() < 1e-9);
        for factor in &result.breakdown {
            assert!((factor.weight - 1.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(result.label, Recommendation::StrongBuy);
    }

    #[test]
    fn test_negative_weight_counts_as_zero() {
        let config = ScoringConfig {
            valuation_weight: -1.0,
            momentum_weight: 0.3,
            pe_weight: 0.2,
            ..Default::default()
        };
        let result = score(
            &valuation(Some(50.0), None),
            &technicals(None, None),
            &record(100.0, Some(8.0)),
            &config,
        );
        assert_eq!(result.breakdown[0].weight, 0.0);
        assert_eq!(result.breakdown[0].contribution, 0.0);
        assert_eq!(result.score, Some(result.contribution_total()));
        assert_eq!(effective_weights(&ScoringConfig::default()), [0.5, 0.3, 0.2]);
    }
}
