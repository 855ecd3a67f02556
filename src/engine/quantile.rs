// Linear-interpolation quantiles over sorted samples.

/// Interpolated quantile of an ascending-sorted slice.
///
/// Empty input yields 0 and a single sample yields that sample. Otherwise the
/// rank `(n - 1) * q` is split into its floor and ceiling and the two samples
/// are blended by the fractional part. `q` is clamped to `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
            let idx = (sorted.len() - 1) as f64 * q;
            let lo = idx.floor() as usize;
            let hi = idx.ceil() as usize;
            if lo == hi {
                return sorted[lo];
            }
            let ratio = idx - lo as f64;
            sorted[lo] * (1.0 - ratio) + sorted[hi] * ratio
        }
    }
}

/// Ascending copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Rounds half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// p75 / p90 / p99 of an unsorted sample set, each rounded to 4 places.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Percentile3 {
    pub p75: f64,
    pub p90: f64,
    pub p99: f64,
}

pub fn percentile3(values: &[f64]) -> Percentile3 {
    let s = sorted(values);
    Percentile3 {
        p75: round_to(quantile(&s, 0.75), 4),
        p90: round_to(quantile(&s, 0.90), 4),
        p99: round_to(quantile(&s, 0.99), 4),
    }
}
