use analysis_core::{
    AbsentReason, Confidence, DcfAssumptions, EngineConfig, FinancialRecord, MethodValuation,
    Metric, PeConfig, ValuationMethod, ValuationResult, MAX_PROJECTION_YEARS,
};

/// Median sector P/E used as the comparison multiple when no peer multiple
/// is supplied.
const SECTOR_BENCHMARK_PE: &[(&str, f64)] = &[
    ("Technology", 25.0),
    ("Healthcare", 20.0),
    ("Financial Services", 12.0),
    ("Consumer Cyclical", 18.0),
    ("Consumer Defensive", 22.0),
    ("Energy", 15.0),
    ("Utilities", 16.0),
    ("Real Estate", 20.0),
    ("Materials", 16.0),
    ("Industrials", 18.0),
    ("Communication Services", 20.0),
];

pub fn sector_benchmark_pe(sector: &str) -> Option<f64> {
    SECTOR_BENCHMARK_PE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(sector.trim()))
        .map(|(_, pe)| *pe)
}

/// Present value of `base_fcf` grown for `projection_years` plus a Gordon
/// terminal value, both discounted to today. Undefined when the discount
/// rate does not exceed terminal growth, when any rate is at or below -100%,
/// or when the horizon is outside `1..=MAX_PROJECTION_YEARS`.
pub fn discounted_cash_flow(base_fcf: f64, a: &DcfAssumptions) -> Metric {
    if a.discount_rate <= a.terminal_growth {
        return Metric::undefined(format!(
            "discount rate {:.4} must exceed terminal growth {:.4}",
            a.discount_rate, a.terminal_growth
        ));
    }
    if [a.near_term_growth, a.terminal_growth, a.discount_rate]
        .iter()
        .any(|r| !r.is_finite() || *r <= -1.0)
    {
        return Metric::undefined("growth and discount rates must be finite and above -100%");
    }
    let years = match i32::try_from(a.projection_years) {
        Ok(y) if y >= 1 && a.projection_years <= MAX_PROJECTION_YEARS => y,
        _ => {
            return Metric::undefined(format!(
                "projection horizon must be within 1..={} years",
                MAX_PROJECTION_YEARS
            ))
        }
    };
    if base_fcf <= 0.0 {
        return Metric::Absent(AbsentReason::NonPositive);
    }

    let projected_pv: f64 = (1..=years)
        .map(|i| base_fcf * (1.0 + a.near_term_growth).powi(i) / (1.0 + a.discount_rate).powi(i))
        .sum();
    let final_fcf = base_fcf * (1.0 + a.near_term_growth).powi(years);
    let terminal_value =
        final_fcf * (1.0 + a.terminal_growth) / (a.discount_rate - a.terminal_growth);
    let terminal_pv = terminal_value / (1.0 + a.discount_rate).powi(years);

    Metric::new(projected_pv + terminal_pv)
}

/// DCF fair value per share.
///
/// Uses the latest reported free cash flow, which must be positive. Only when
/// free cash flow is not reported at all is it estimated as operating cash
/// flow less capex at `capex_to_revenue` of latest revenue, and the result
/// marked Partial.
pub fn value_dcf(record: &FinancialRecord, assumptions: &DcfAssumptions) -> MethodValuation {
    let method = ValuationMethod::Dcf;

    if assumptions.discount_rate <= assumptions.terminal_growth {
        return MethodValuation::unavailable(
            method,
            AbsentReason::Undefined {
                detail: "discount rate does not exceed terminal growth".to_string(),
            },
            format!(
                "terminal value undefined: discount {:.2}% <= terminal growth {:.2}%",
                assumptions.discount_rate * 100.0,
                assumptions.terminal_growth * 100.0
            ),
        );
    }

    let mut notes = Vec::new();
    let mut confidence = Confidence::Full;

    let base_fcf = match record.latest_free_cash_flow() {
        Metric::Value(fcf) if fcf > 0.0 => {
            notes.push(format!("latest free cash flow {:.0}", fcf));
            fcf
        }
        Metric::Value(fcf) => {
            return MethodValuation::unavailable(
                method,
                AbsentReason::NonPositive,
                format!("latest free cash flow {:.0} is not positive", fcf),
            )
        }
        // only an unreported FCF may be estimated; a reported loss stands
        Metric::Absent(fcf_reason @ (AbsentReason::Missing | AbsentReason::NonNumeric)) => {
            match estimated_fcf(record, assumptions) {
                Some(fcf) => {
                    confidence = Confidence::Partial;
                    notes.push(format!(
                        "free cash flow {}; estimated {:.0} from operating cash flow less {:.0}% of revenue",
                        fcf_reason,
                        fcf,
                        assumptions.capex_to_revenue * 100.0
                    ));
                    fcf
                }
                None => {
                    return MethodValuation::unavailable(
                        method,
                        fcf_reason.clone(),
                        format!("free cash flow {}; no usable operating cash flow", fcf_reason),
                    )
                }
            }
        }
        Metric::Absent(fcf_reason) => {
            return MethodValuation::unavailable(
                method,
                fcf_reason.clone(),
                format!("free cash flow {}", fcf_reason),
            )
        }
    };

    let shares = match record.shares_outstanding.clone().positive() {
        Metric::Value(s) => s,
        Metric::Absent(reason) => {
            return MethodValuation::unavailable(
                method,
                reason.clone(),
                format!("shares outstanding {}", reason),
            )
        }
    };

    let fair_value = discounted_cash_flow(base_fcf, assumptions).map(|ev| ev / shares);
    if let Metric::Absent(reason) = &fair_value {
        return MethodValuation::unavailable(method, reason.clone(), format!("DCF {}", reason));
    }

    notes.push(format!(
        "{} years at {:.1}% growth, {:.1}% discount, {:.1}% terminal growth",
        assumptions.projection_years,
        assumptions.near_term_growth * 100.0,
        assumptions.discount_rate * 100.0,
        assumptions.terminal_growth * 100.0
    ));
    tracing::debug!("{} DCF fair value {} ({:?})", record.symbol, fair_value, confidence);

    MethodValuation {
        method,
        fair_value,
        confidence,
        notes,
    }
}

fn estimated_fcf(record: &FinancialRecord, assumptions: &DcfAssumptions) -> Option<f64> {
    let ocf = record.operating_cash_flow.value()?;
    let revenue = record.latest_revenue().value()?;
    let fcf = ocf - revenue.max(0.0) * assumptions.capex_to_revenue;
    (fcf > 0.0).then_some(fcf)
}

/// Relative P/E fair value per share: EPS × comparison multiple.
///
/// EPS is trailing, or forward when trailing is absent. The multiple is the
/// supplied peer multiple, else the sector benchmark, else the configured
/// fallback. Falling back on either input lowers confidence to Partial.
pub fn value_pe(
    record: &FinancialRecord,
    peer_multiple: Option<f64>,
    config: &PeConfig,
) -> MethodValuation {
    let method = ValuationMethod::PriceEarnings;
    let mut notes = Vec::new();
    let mut confidence = Confidence::Full;

    let eps = match (&record.trailing_eps, &record.forward_eps) {
        (Metric::Value(eps), _) => {
            notes.push(format!("trailing EPS {:.2}", eps));
            *eps
        }
        (Metric::Absent(_), Metric::Value(eps)) => {
            confidence = Confidence::Partial;
            notes.push(format!("trailing EPS unavailable; forward EPS {:.2}", eps));
            *eps
        }
        (Metric::Absent(reason), Metric::Absent(_)) => {
            return MethodValuation::unavailable(method, reason.clone(), format!("EPS {}", reason))
        }
    };
    if eps <= 0.0 {
        return MethodValuation::unavailable(
            method,
            AbsentReason::NonPositive,
            format!("EPS {:.2} is not positive", eps),
        );
    }

    let sector_pe = record.sector.as_deref().and_then(sector_benchmark_pe);
    let multiple = match (peer_multiple.filter(|m| m.is_finite() && *m > 0.0), sector_pe) {
        (Some(peer), _) => {
            notes.push(format!("peer multiple {:.1}", peer));
            peer
        }
        (None, Some(sector)) => {
            notes.push(format!(
                "{} sector benchmark multiple {:.1}",
                record.sector.as_deref().unwrap_or_default(),
                sector
            ));
            sector
        }
        (None, None) => match config.fallback_multiple {
            Some(fallback) if fallback > 0.0 => {
                confidence = Confidence::Partial;
                notes.push(format!("no peer or sector multiple; fallback {:.1}", fallback));
                fallback
            }
            _ => {
                return MethodValuation::unavailable(
                    method,
                    AbsentReason::Missing,
                    "no comparison multiple available",
                )
            }
        },
    };

    let fair_value = Metric::new(eps * multiple);
    tracing::debug!("{} P/E fair value {} ({:?})", record.symbol, fair_value, confidence);

    MethodValuation {
        method,
        fair_value,
        confidence,
        notes,
    }
}

/// Benjamin Graham's `sqrt(22.5 × EPS × book value per share)`.
pub fn graham_number(record: &FinancialRecord) -> Metric {
    let eps = record.trailing_eps.clone().positive();
    let bvps = record.book_value_per_share.clone().positive();
    eps.and_then(|e| bvps.map(|b| (22.5 * e * b).sqrt()))
}

/// Trailing P/E divided by earnings growth in percent.
pub fn peg_ratio(record: &FinancialRecord) -> Metric {
    let pe = record.trailing_pe.clone().positive();
    let growth = record.earnings_growth.clone().positive();
    pe.and_then(|pe| growth.map(|g| pe / (g * 100.0)))
}

/// Run both valuation methods independently. The methods are never averaged.
pub fn value(
    record: &FinancialRecord,
    peer_multiple: Option<f64>,
    config: &EngineConfig,
) -> ValuationResult {
    let dcf = value_dcf(record, &config.dcf);
    let pe = value_pe(record, peer_multiple, &config.pe);
    let methods_used = [&dcf, &pe]
        .iter()
        .filter(|m| m.is_available())
        .map(|m| m.method)
        .collect();

    ValuationResult {
        dcf,
        pe,
        methods_used,
        graham_number: graham_number(record),
        peg_ratio: peg_ratio(record),
    }
}
