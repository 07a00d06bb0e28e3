use analysis_core::{AbsentReason, Metric};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Relative Strength Index (Wilder).
///
/// The first value uses simple averages of the first `period` changes, so
/// `period + 1` closes produce exactly one RSI. Later values use Wilder's
/// smoothing. A window with no losses reads 100, and a flat window reads 50.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(gains.len() - period + 1);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Latest SMA over the trailing `period` closes, absent with too little history.
pub fn latest_sma(data: &[f64], period: usize) -> Metric {
    match sma(data, period).last() {
        Some(&v) => Metric::new(v),
        None => Metric::Absent(AbsentReason::InsufficientHistory {
            required: period,
            available: data.len(),
        }),
    }
}

/// Latest RSI, absent below `period + 1` closes.
pub fn latest_rsi(data: &[f64], period: usize) -> Metric {
    match rsi(data, period).last() {
        Some(&v) => Metric::new(v),
        None => Metric::Absent(AbsentReason::InsufficientHistory {
            required: period + 1,
            available: data.len(),
        }),
    }
}

/// Simple close-to-close returns. Non-positive closes break the chain and
/// are skipped.
pub fn daily_returns(data: &[f64]) -> Vec<f64> {
    data.windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Sample standard deviation of daily returns scaled by `sqrt(periods_per_year)`.
pub fn annualized_volatility(data: &[f64], periods_per_year: f64) -> Metric {
    let returns = daily_returns(data);
    analysis_core::stats::std_dev(&returns).map(|sd| sd * periods_per_year.sqrt())
}
