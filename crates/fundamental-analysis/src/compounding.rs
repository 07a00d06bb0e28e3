//! Profit compounding score: does the company grow earnings and reinvest them
//! at good returns, year after year?
//!
//! Four sub-scores on 0-10, each absent when its series has fewer than two
//! usable years. The composite is the mean of the present sub-scores only.
//! Alongside the scores, threshold readings of the same history are listed
//! as plain-language factors and warnings.

use analysis_core::stats::{align_latest, average_growth_pct, mean, series_cagr, yoy_pairs};
use analysis_core::{
    AbsentReason, CompoundingConfig, CompoundingScore, CompoundingSeries, CompoundingVerdict,
    FinancialRecord, Metric,
};

fn insufficient(available: usize) -> Metric {
    Metric::Absent(AbsentReason::InsufficientHistory {
        required: 2,
        available,
    })
}

const STRONG_REVENUE_GROWTH_PCT: f64 = 5.0;
const EXCELLENT_PROFIT_GROWTH_PCT: f64 = 10.0;
const GOOD_PROFIT_GROWTH_PCT: f64 = 5.0;
const HIGH_ROE_PCT: f64 = 15.0;
const GOOD_ROE_PCT: f64 = 10.0;
const LOW_ROE_PCT: f64 = 5.0;
const RETAINED_GROWTH_PCT: f64 = 5.0;
pub const LOW_DEBT_TO_EQUITY: f64 = 0.3;
pub const HIGH_DEBT_TO_EQUITY: f64 = 1.0;
const HIGH_PROFIT_MARGIN: f64 = 0.15;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Fraction of year-over-year periods in which both revenue and net income
/// grew, scaled to 0-10.
pub fn growth_consistency(revenue: &[Metric], net_income: &[Metric]) -> Metric {
    let (revenue, net_income) = align_latest(revenue, net_income);
    if revenue.len() < 2 {
        return insufficient(revenue.len());
    }

    let mut periods = 0usize;
    let mut growing = 0usize;
    for i in 1..revenue.len() {
        let values = (
            revenue[i - 1].value(),
            revenue[i].value(),
            net_income[i - 1].value(),
            net_income[i].value(),
        );
        if let (Some(r0), Some(r1), Some(n0), Some(n1)) = values {
            periods += 1;
            if r1 > r0 && n1 > n0 {
                growing += 1;
            }
        }
    }

    if periods == 0 {
        return insufficient(0);
    }
    Metric::new(growing as f64 / periods as f64 * 10.0)
}

/// Rewards an ROE series that never declines or whose average is high.
/// The better of the two readings wins.
pub fn roe_trend(roe: &[Metric], high_roe: f64) -> Metric {
    let pairs = yoy_pairs(roe);
    if pairs.is_empty() {
        return insufficient(Metric::present_values(roe).len());
    }

    let non_decreasing = pairs.iter().filter(|(prev, cur)| cur >= prev).count();
    let trend_score = non_decreasing as f64 / pairs.len() as f64 * 10.0;

    let level_score = match mean(&Metric::present_values(roe)).value() {
        Some(avg) if high_roe > 0.0 => (avg / high_roe * 10.0).clamp(0.0, 10.0),
        _ => 0.0,
    };

    Metric::new(trend_score.max(level_score))
}

/// Compares retained-earnings growth with net-income growth: money kept in
/// the business should come back as at least as much earnings growth.
pub fn reinvestment_quality(retained_earnings: &[Metric], net_income: &[Metric]) -> Metric {
    let (retained, income) = align_latest(retained_earnings, net_income);
    let re_growth = match series_cagr(retained) {
        Metric::Value(g) => g,
        absent => return absent,
    };
    let ni_growth = match series_cagr(income) {
        Metric::Value(g) => g,
        absent => return absent,
    };

    if re_growth > 0.0 {
        Metric::new((ni_growth / re_growth).clamp(0.0, 1.0) * 10.0)
    } else if ni_growth > 0.0 {
        // earnings grew without retention, e.g. capital returned via buybacks
        Metric::new(5.0)
    } else {
        Metric::new(0.0)
    }
}

/// Penalizes debt growing faster than net income.
pub fn debt_discipline(total_debt: &[Metric], net_income: &[Metric], tolerance: f64) -> Metric {
    let (debt, income) = align_latest(total_debt, net_income);
    let present: Vec<(usize, f64)> = debt
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.value().map(|v| (i, v)))
        .collect();
    let (first, last) = match (present.first(), present.last()) {
        (Some(&first), Some(&last)) if last.0 > first.0 => (first, last),
        _ => return insufficient(present.len()),
    };

    if last.1 <= first.1 {
        return Metric::new(10.0);
    }
    if first.1 <= 0.0 {
        // borrowing from nothing: maximal excess growth
        return Metric::new(0.0);
    }

    let years = (last.0 - first.0) as f64;
    let debt_growth = (last.1 / first.1).powf(1.0 / years) - 1.0;
    let ni_growth = match series_cagr(income) {
        Metric::Value(g) => g,
        Metric::Absent(reason) => {
            return Metric::undefined(format!("debt is rising but net income growth is {}", reason))
        }
    };

    let excess = debt_growth - ni_growth.max(0.0);
    if tolerance <= 0.0 {
        return Metric::new(if excess > 0.0 { 0.0 } else { 10.0 });
    }
    Metric::new((10.0 * (1.0 - excess / tolerance)).clamp(0.0, 10.0))
}

/// Averages computed by [`score_compounding`], read back as factors and
/// warnings. Growth figures and ROE are percentages.
struct Readings {
    revenue_growth_pct: Metric,
    profit_growth_pct: Metric,
    roe_pct: Metric,
    retained_growth_pct: Metric,
    debt_to_equity: Metric,
    profit_margin: Metric,
}

fn describe(r: &Readings) -> (Vec<String>, Vec<String>) {
    let mut factors = Vec::new();
    let mut warnings = Vec::new();

    match r.revenue_growth_pct.value() {
        Some(g) if g > STRONG_REVENUE_GROWTH_PCT => {
            factors.push(format!("Strong revenue growth ({:.1}% avg)", g))
        }
        Some(g) if g > 0.0 => factors.push("Positive revenue growth".to_string()),
        Some(_) => warnings.push("Declining revenue trend".to_string()),
        None => {}
    }

    match r.profit_growth_pct.value() {
        Some(g) if g > EXCELLENT_PROFIT_GROWTH_PCT => {
            factors.push(format!("Excellent profit growth ({:.1}% avg)", g))
        }
        Some(g) if g > GOOD_PROFIT_GROWTH_PCT => factors.push("Good profit growth".to_string()),
        Some(g) if g > 0.0 => factors.push("Moderate profit growth".to_string()),
        Some(_) => warnings.push("Declining profitability".to_string()),
        None => {}
    }

    match r.roe_pct.value() {
        Some(roe) if roe > HIGH_ROE_PCT => factors.push(format!("High ROE ({:.1}%)", roe)),
        Some(roe) if roe > GOOD_ROE_PCT => factors.push("Good ROE".to_string()),
        Some(roe) if roe < LOW_ROE_PCT => warnings.push("Low return on equity".to_string()),
        _ => {}
    }

    match r.retained_growth_pct.value() {
        Some(g) if g > RETAINED_GROWTH_PCT => factors.push("Growing retained earnings".to_string()),
        Some(g) if g < 0.0 => warnings.push("Declining retained earnings".to_string()),
        _ => {}
    }

    // zero is how providers report "no figure" for these two
    match r.debt_to_equity.value() {
        Some(de) if de > 0.0 && de < LOW_DEBT_TO_EQUITY => {
            factors.push("Conservative debt management".to_string())
        }
        Some(de) if de > HIGH_DEBT_TO_EQUITY => {
            warnings.push("High debt levels may limit growth".to_string())
        }
        _ => {}
    }

    if let Some(margin) = r.profit_margin.value() {
        if margin > HIGH_PROFIT_MARGIN {
            factors.push("High profit margins".to_string());
        }
    }

    (factors, warnings)
}

/// Multi-year compounding quality. Never feeds the recommendation score.
pub fn score_compounding(record: &FinancialRecord, config: &CompoundingConfig) -> CompoundingScore {
    let growth_consistency = growth_consistency(&record.revenue, &record.net_income);
    let roe_trend = roe_trend(&record.return_on_equity, config.high_roe);
    let reinvestment_quality = reinvestment_quality(&record.retained_earnings, &record.net_income);
    let debt_discipline = debt_discipline(
        &record.total_debt_history,
        &record.net_income,
        config.debt_growth_tolerance,
    );

    let present: Vec<f64> = [&growth_consistency, &roe_trend, &reinvestment_quality, &debt_discipline]
        .iter()
        .filter_map(|m| m.value())
        .collect();
    let composite = mean(&present).map(round1);
    if composite.is_absent() {
        tracing::debug!("{}: no compounding sub-score available", record.symbol);
    }

    let verdict = match composite.value() {
        Some(c) if c >= config.strong_threshold => CompoundingVerdict::Strong,
        Some(c) if c >= config.moderate_threshold => CompoundingVerdict::Moderate,
        Some(_) => CompoundingVerdict::Weak,
        None => CompoundingVerdict::InsufficientData,
    };

    let readings = Readings {
        revenue_growth_pct: average_growth_pct(&record.revenue),
        profit_growth_pct: average_growth_pct(&record.net_income),
        roe_pct: mean(&Metric::present_values(&record.return_on_equity)).map(|r| r * 100.0),
        retained_growth_pct: average_growth_pct(&record.retained_earnings),
        debt_to_equity: record.debt_to_equity.clone(),
        profit_margin: record.profit_margin.clone(),
    };
    let (factors, mut warnings) = describe(&readings);
    if verdict == CompoundingVerdict::InsufficientData {
        warnings.push("Insufficient financial data for compounding analysis".to_string());
    }

    CompoundingScore {
        composite,
        growth_consistency,
        roe_trend,
        reinvestment_quality,
        debt_discipline,
        verdict,
        avg_revenue_growth_pct: readings.revenue_growth_pct,
        avg_profit_growth_pct: readings.profit_growth_pct,
        avg_roe_pct: readings.roe_pct,
        avg_retained_earnings_growth_pct: readings.retained_growth_pct,
        debt_to_equity: readings.debt_to_equity,
        profit_margin_pct: readings.profit_margin.map(|m| m * 100.0),
        factors,
        warnings,
        series: CompoundingSeries {
            revenue: record.revenue.clone(),
            net_income: record.net_income.clone(),
            return_on_equity: record.return_on_equity.clone(),
            retained_earnings: record.retained_earnings.clone(),
            total_debt: record.total_debt_history.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Metric> {
        values.iter().map(|&v| Metric::new(v)).collect()
    }

    fn compounder() -> FinancialRecord {
        let mut record = FinancialRecord::new("CMPD", 100.0);
        record.revenue = series(&[100.0, 110.0, 121.0, 133.0]);
        record.net_income = series(&[10.0, 12.0, 14.0, 17.0]);
        record.return_on_equity = series(&[0.18, 0.19, 0.21, 0.22]);
        record.retained_earnings = series(&[50.0, 55.0, 60.0, 66.0]);
        record.total_debt_history = series(&[40.0, 38.0, 35.0, 30.0]);
        record
    }

    #[test]
    fn test_growth_consistency() {
        let revenue = series(&[100.0, 110.0, 105.0, 120.0, 130.0]);
        let income = series(&[10.0, 11.0, 12.0, 13.0, 12.0]);
        // growth in both only for periods 1 and 3 out of 4
        assert_eq!(growth_consistency(&revenue, &income), Metric::Value(5.0));
    }

    #[test]
    fn test_growth_consistency_aligns_latest_years() {
        let revenue = series(&[1.0, 2.0, 3.0]);
        let income = series(&[5.0, 6.0]);
        assert_eq!(growth_consistency(&revenue, &income), Metric::Value(10.0));
    }

    #[test]
    fn test_roe_trend_rewards_high_average() {
        let declining_but_high = series(&[0.40, 0.35, 0.30]);
        assert_eq!(roe_trend(&declining_but_high, 0.20), Metric::Value(10.0));

        let declining_and_low = series(&[0.10, 0.08, 0.06]);
        let score = roe_trend(&declining_and_low, 0.20).value().unwrap();
        assert!((score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_reinvestment_quality() {
        let retained = series(&[100.0, 121.0]);
        let income = series(&[10.0, 11.0]);
        // retained grows 21%, income 10%
        let score = reinvestment_quality(&retained, &income).value().unwrap();
        assert!((score - 10.0 * 0.10 / 0.21).abs() < 1e-9);

        let shrinking_retained = series(&[100.0, 90.0]);
        assert_eq!(reinvestment_quality(&shrinking_retained, &income), Metric::Value(5.0));
    }

    #[test]
    fn test_reinvestment_needs_positive_endpoints() {
        let deficit = series(&[-50.0, 20.0]);
        let income = series(&[10.0, 11.0]);
        assert_eq!(
            reinvestment_quality(&deficit, &income),
            Metric::Absent(AbsentReason::NonPositive)
        );
    }

    #[test]
    fn test_debt_discipline() {
        let income = series(&[10.0, 11.0]);
        assert_eq!(debt_discipline(&series(&[50.0, 40.0]), &income, 0.25), Metric::Value(10.0));

        // debt +35% vs income +10%: excess 0.25 hits the tolerance
        let score = debt_discipline(&series(&[100.0, 135.0]), &income, 0.25).value().unwrap();
        assert!(score.abs() < 1e-9);

        let score = debt_discipline(&series(&[100.0, 120.0]), &income, 0.25).value().unwrap();
        assert!((score - 6.0).abs() < 1e-9);

        assert_eq!(debt_discipline(&series(&[0.0, 10.0]), &income, 0.25), Metric::Value(0.0));
    }

    #[test]
    fn test_strong_compounder() {
        let score = score_compounding(&compounder(), &CompoundingConfig::default());
        assert_eq!(score.growth_consistency, Metric::Value(10.0));
        assert_eq!(score.roe_trend, Metric::Value(10.0));
        assert_eq!(score.debt_discipline, Metric::Value(10.0));
        assert_eq!(score.verdict, CompoundingVerdict::Strong);
        assert_eq!(score.series.revenue.len(), 4);
    }

    #[test]
    fn test_composite_is_mean_of_present_sub_scores() {
        let mut record = compounder();
        record.retained_earnings = vec![];
        record.total_debt_history = series(&[40.0]);
        let score = score_compounding(&record, &CompoundingConfig::default());

        assert!(score.reinvestment_quality.is_absent());
        assert!(score.debt_discipline.is_absent());
        let present: Vec<f64> = score.sub_scores().iter().filter_map(|m| m.value()).collect();
        assert_eq!(present.len(), 2);
        let expected = present.iter().sum::<f64>() / 2.0;
        assert!((score.composite.value().unwrap() - expected).abs() <= 0.05);
    }

    #[test]
    fn test_all_absent_composite_is_absent() {
        let mut record = FinancialRecord::new("NEW", 10.0);
        record.revenue = series(&[100.0]);
        record.net_income = series(&[5.0]);
        let score = score_compounding(&record, &CompoundingConfig::default());

        assert!(score.sub_scores().iter().all(|m| m.is_absent()));
        assert!(score.composite.is_absent());
        assert_eq!(score.verdict, CompoundingVerdict::InsufficientData);
    }

    #[test]
    fn test_composite_rounded_to_one_decimal() {
        let mut record = FinancialRecord::new("R", 10.0);
        record.revenue = series(&[100.0, 110.0, 105.0]);
        record.net_income = series(&[10.0, 11.0, 12.0]);
        let score = score_compounding(&record, &CompoundingConfig::default());
        assert_eq!(score.composite, Metric::Value(5.0));

        let mut record = compounder();
        record.return_on_equity = vec![];
        record.total_debt_history = vec![];
        let score = score_compounding(&record, &CompoundingConfig::default());
        let c = score.composite.value().unwrap();
        assert!(((c * 10.0).round() - c * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_factors_for_strong_compounder() {
        let mut record = compounder();
        record.debt_to_equity = Metric::new(0.2);
        record.profit_margin = Metric::new(0.25);
        let score = score_compounding(&record, &CompoundingConfig::default());

        // revenue ~10% avg, income ~19% avg, ROE 20% avg, retained ~9.6% avg
        assert!(score.factors[0].starts_with("Strong revenue growth"));
        assert!(score.factors[1].starts_with("Excellent profit growth"));
        assert_eq!(score.factors[2], "High ROE (20.0%)");
        assert!(score.factors.contains(&"Growing retained earnings".to_string()));
        assert!(score.factors.contains(&"Conservative debt management".to_string()));
        assert!(score.factors.contains(&"High profit margins".to_string()));
        assert!(score.warnings.is_empty());
        assert_eq!(score.profit_margin_pct, Metric::Value(25.0));
    }

    #[test]
    fn test_warnings_for_declining_leveraged_company() {
        let mut record = FinancialRecord::new("DECL", 10.0);
        record.revenue = series(&[120.0, 110.0, 100.0]);
        record.net_income = series(&[12.0, 9.0, 6.0]);
        record.return_on_equity = series(&[0.04, 0.03]);
        record.retained_earnings = series(&[60.0, 55.0, 50.0]);
        record.debt_to_equity = Metric::new(2.4);
        record.profit_margin = Metric::new(0.06);
        let score = score_compounding(&record, &CompoundingConfig::default());

        assert!(score.factors.is_empty());
        assert_eq!(
            score.warnings,
            vec![
                "Declining revenue trend",
                "Declining profitability",
                "Low return on equity",
                "Declining retained earnings",
                "High debt levels may limit growth",
            ]
        );
    }

    #[test]
    fn test_readings_never_move_the_composite() {
        let plain = score_compounding(&compounder(), &CompoundingConfig::default());
        let mut record = compounder();
        record.debt_to_equity = Metric::new(5.0);
        record.profit_margin = Metric::new(0.40);
        let annotated = score_compounding(&record, &CompoundingConfig::default());

        assert_eq!(plain.composite, annotated.composite);
        assert_eq!(plain.verdict, annotated.verdict);
        assert_ne!(plain.warnings, annotated.warnings);
    }

    #[test]
    fn test_zero_debt_to_equity_reads_as_unreported() {
        let mut record = compounder();
        record.debt_to_equity = Metric::new(0.0);
        let score = score_compounding(&record, &CompoundingConfig::default());
        assert!(!score.factors.contains(&"Conservative debt management".to_string()));
    }

    #[test]
    fn test_insufficient_data_warning() {
        let score = score_compounding(&FinancialRecord::new("NEW", 10.0), &CompoundingConfig::default());
        assert_eq!(score.verdict, CompoundingVerdict::InsufficientData);
        assert_eq!(
            score.warnings,
            vec!["Insufficient financial data for compounding analysis"]
        );
    }
}
