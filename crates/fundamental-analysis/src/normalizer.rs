use analysis_core::{AbsentReason, AnalysisError, FinancialRecord, Metric, RawRecord};
use chrono::NaiveDate;
use serde_json::Value;

/// Provider field names accepted for each record field, preferred name first.
const PRICE_KEYS: &[&str] = &["currentPrice", "regularMarketPrice"];
const SHARES_KEYS: &[&str] = &["sharesOutstanding"];
const TRAILING_EPS_KEYS: &[&str] = &["trailingEps"];
const FORWARD_EPS_KEYS: &[&str] = &["forwardEps"];
const TRAILING_PE_KEYS: &[&str] = &["trailingPE", "trailingPe"];
const FCF_KEYS: &[&str] = &["freeCashflow", "freeCashFlow"];
const OCF_KEYS: &[&str] = &["operatingCashflow", "operatingCashFlow"];
const DEBT_KEYS: &[&str] = &["totalDebt"];
const RETAINED_KEYS: &[&str] = &["retainedEarnings"];
const REVENUE_KEYS: &[&str] = &["totalRevenue", "revenue"];
const NET_INCOME_KEYS: &[&str] = &["netIncome", "netIncomeToCommon"];
const ROE_KEYS: &[&str] = &["returnOnEquity"];
const BOOK_VALUE_KEYS: &[&str] = &["bookValue"];
const EARNINGS_GROWTH_KEYS: &[&str] = &["earningsGrowth"];
const REVENUE_GROWTH_KEYS: &[&str] = &["revenueGrowth"];
const DEBT_TO_EQUITY_KEYS: &[&str] = &["debtToEquity"];
const DIVIDEND_YIELD_KEYS: &[&str] = &["dividendYield"];
const PROFIT_MARGIN_KEYS: &[&str] = &["profitMargins", "profitMargin"];
const PRICE_HISTORY_KEYS: &[&str] = &["priceHistory", "closes"];

/// Convert a raw provider response into a [`FinancialRecord`].
///
/// Only the identity fields are mandatory: a missing or empty `symbol`, or a
/// missing / non-numeric / non-positive current price, is a `DataError`.
/// Every other field that is missing or unreadable becomes an explicit
/// absent marker and its provider name is listed in `missing_fields`.
pub fn normalize(raw: &RawRecord) -> Result<FinancialRecord, AnalysisError> {
    let symbol = raw
        .get("symbol")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AnalysisError::DataError("missing symbol".to_string()))?;

    let current_price = match scalar(raw, PRICE_KEYS) {
        Metric::Value(p) if p > 0.0 => p,
        Metric::Value(p) => {
            return Err(AnalysisError::DataError(format!(
                "{}: current price must be positive, got {}",
                symbol, p
            )))
        }
        Metric::Absent(reason) => {
            return Err(AnalysisError::DataError(format!(
                "{}: current price {}",
                symbol, reason
            )))
        }
    };

    let mut missing = Vec::new();
    let mut track_scalar = |keys: &[&str]| -> Metric {
        let m = scalar(raw, keys);
        if m.is_absent() {
            missing.push(keys[0].to_string());
        }
        m
    };

    let shares_outstanding = track_scalar(SHARES_KEYS);
    let trailing_eps = track_scalar(TRAILING_EPS_KEYS);
    let forward_eps = track_scalar(FORWARD_EPS_KEYS);
    let trailing_pe = track_scalar(TRAILING_PE_KEYS);
    let book_value_per_share = track_scalar(BOOK_VALUE_KEYS);
    let earnings_growth = track_scalar(EARNINGS_GROWTH_KEYS);
    let revenue_growth = track_scalar(REVENUE_GROWTH_KEYS);
    let debt_to_equity = track_scalar(DEBT_TO_EQUITY_KEYS);
    let dividend_yield = track_scalar(DIVIDEND_YIELD_KEYS);
    let profit_margin = track_scalar(PROFIT_MARGIN_KEYS);

    let mut track_series = |keys: &[&str]| -> Vec<Metric> {
        let s = series(raw, keys);
        if s.iter().all(Metric::is_absent) {
            missing.push(keys[0].to_string());
        }
        s
    };

    let free_cash_flow = track_series(FCF_KEYS);
    let operating_cash_flow = analysis_core::latest(&track_series(OCF_KEYS));
    let total_debt_history = track_series(DEBT_KEYS);
    let retained_earnings = track_series(RETAINED_KEYS);
    let revenue = track_series(REVENUE_KEYS);
    let net_income = track_series(NET_INCOME_KEYS);
    let return_on_equity = track_series(ROE_KEYS);

    let total_debt = analysis_core::latest(&total_debt_history);

    let sector = raw
        .get("sector")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if sector.is_none() {
        missing.push("sector".to_string());
    }

    let (price_history, dropped_price_points) = price_history(raw);
    if price_history.is_empty() {
        missing.push(PRICE_HISTORY_KEYS[0].to_string());
    }

    let as_of = raw
        .get("asOf")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

    tracing::debug!(
        "Normalized {}: {} missing fields, {} price points ({} dropped)",
        symbol,
        missing.len(),
        price_history.len(),
        dropped_price_points
    );

    Ok(FinancialRecord {
        symbol,
        current_price,
        shares_outstanding,
        trailing_eps,
        forward_eps,
        trailing_pe,
        free_cash_flow,
        operating_cash_flow,
        total_debt,
        total_debt_history,
        retained_earnings,
        revenue,
        net_income,
        return_on_equity,
        book_value_per_share,
        earnings_growth,
        revenue_growth,
        debt_to_equity,
        dividend_yield,
        profit_margin,
        sector,
        price_history,
        dropped_price_points,
        as_of,
        missing_fields: missing,
    })
}

fn lookup<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

/// Read one JSON value as a number.
fn to_metric(value: &Value) -> Metric {
    match value {
        Value::Null => Metric::missing(),
        Value::Number(n) => match n.as_f64() {
            Some(v) => Metric::new(v),
            None => Metric::Absent(AbsentReason::NonNumeric),
        },
        Value::String(s) => match strip_thousands(s.trim()).parse::<f64>() {
            Ok(v) => Metric::new(v),
            Err(_) => Metric::Absent(AbsentReason::NonNumeric),
        },
        _ => Metric::Absent(AbsentReason::NonNumeric),
    }
}

/// Drop thousands separators from `"1,234,567.8"`. Anything else with a
/// comma (`"1,5"`, `"12,34"`) is returned unchanged and fails to parse.
fn strip_thousands(s: &str) -> String {
    if !s.contains(',') {
        return s.to_string();
    }
    let unsigned = s.trim_start_matches(['-', '+']);
    let integer = unsigned.split('.').next().unwrap_or_default();
    let mut groups = integer.split(',');
    let lead_ok = groups
        .next()
        .map_or(false, |g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    let rest_ok = groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    if lead_ok && rest_ok && !unsigned[integer.len()..].contains(',') {
        s.replace(',', "")
    } else {
        s.to_string()
    }
}

/// A single-valued field. A series supplied where a scalar is expected
/// contributes its latest entry.
fn scalar(raw: &RawRecord, keys: &[&str]) -> Metric {
    match lookup(raw, keys) {
        None => Metric::missing(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => analysis_core::latest(&series(raw, keys)),
        Some(v) => to_metric(v),
    }
}

/// A multi-year field, chronological.
///
/// Accepts an array (already oldest-first), an object keyed by period
/// (sorted by key, so `"2021"`, `"2022"`, ... or ISO dates), or a scalar
/// treated as a one-year series. Missing yields an empty series.
fn series(raw: &RawRecord, keys: &[&str]) -> Vec<Metric> {
    match lookup(raw, keys) {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(to_metric).collect(),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, v)| to_metric(v)).collect()
        }
        Some(v) => vec![to_metric(v)],
    }
}

/// Daily closes. Entries may be numbers or objects with a `close` field;
/// unusable or non-positive closes are dropped and counted.
fn price_history(raw: &RawRecord) -> (Vec<f64>, usize) {
    let items = match lookup(raw, PRICE_HISTORY_KEYS) {
        Some(Value::Array(items)) => items,
        _ => return (Vec::new(), 0),
    };

    let mut closes = Vec::with_capacity(items.len());
    let mut dropped = 0;
    for item in items {
        let metric = match item {
            Value::Object(bar) => bar.get("close").map(to_metric).unwrap_or_default(),
            other => to_metric(other),
        };
        match metric.positive() {
            Metric::Value(close) => closes.push(close),
            Metric::Absent(_) => dropped += 1,
        }
    }
    (closes, dropped)
}
