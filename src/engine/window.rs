// Aligned time windows spanning a query range.
// Short ranges get hourly windows, ranges over 48h get daily windows.

use chrono::{DateTime, NaiveTime, SecondsFormat, TimeZone, Timelike, Utc};

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;
const DAY_WINDOW_THRESHOLD_MS: i64 = 48 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    pub fn step_ms(self) -> i64 {
        match self {
            Granularity::Hour => HOUR_MS,
            Granularity::Day => DAY_MS,
        }
    }
}

/// Daily windows when the range is strictly longer than 48h, hourly otherwise.
pub fn resolve_granularity(from: DateTime<Utc>, to: DateTime<Utc>) -> Granularity {
    let duration_ms = (to - from).num_milliseconds().max(0);
    if duration_ms > DAY_WINDOW_THRESHOLD_MS {
        Granularity::Day
    } else {
        Granularity::Hour
    }
}

/// One window's accumulated samples. Durations are milliseconds,
/// FCP/LCP seconds, CLS unitless.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBucket {
    pub label: String,
    /// Window start, epoch milliseconds.
    pub start: i64,
    pub request_count: u64,
    pub error_count: u64,
    pub durations: Vec<f64>,
    pub resource_durations: Vec<f64>,
    pub fcp_seconds: Vec<f64>,
    pub lcp_seconds: Vec<f64>,
    pub cls_values: Vec<f64>,
}

impl WindowBucket {
    fn empty(start: i64) -> Self {
        Self {
            label: iso_label(start),
            start,
            request_count: 0,
            error_count: 0,
            durations: Vec::new(),
            resource_durations: Vec::new(),
            fcp_seconds: Vec::new(),
            lcp_seconds: Vec::new(),
            cls_values: Vec::new(),
        }
    }
}

/// Builds the contiguous, ascending list of empty windows for `[from, to]`.
///
/// Both ends are floored to the window boundary in `tz` (start of hour, or
/// local midnight for daily windows) and one window is emitted per step from
/// the aligned start through the aligned end inclusive, so the result is never
/// empty. Rows later than the last window's start still land in the last
/// window; see [`window_index`].
pub fn build_windows<Tz: TimeZone>(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    tz: &Tz,
) -> Vec<WindowBucket> {
    debug_assert!(from <= to, "window range must satisfy from <= to");
    let granularity = resolve_granularity(from, to);
    let step = granularity.step_ms();
    let start = align(from, granularity, tz);
    let end = align(to, granularity, tz).max(start);

    let mut windows = Vec::with_capacity(((end - start) / step + 1) as usize);
    let mut ts = start;
    while ts <= end {
        windows.push(WindowBucket::empty(ts));
        ts += step;
    }
    windows
}

/// Index of the last window whose start is `<= ts_ms`. There is no upper
/// bound: anything past the final start belongs to the final window.
/// `None` when `ts_ms` precedes the first window.
pub fn window_index(windows: &[WindowBucket], ts_ms: i64) -> Option<usize> {
    let after = windows.partition_point(|w| w.start <= ts_ms);
    after.checked_sub(1)
}

fn align<Tz: TimeZone>(ts: DateTime<Utc>, granularity: Granularity, tz: &Tz) -> i64 {
    let local = ts.with_timezone(tz);
    let aligned = match granularity {
        Granularity::Hour => local
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0)),
        Granularity::Day => tz
            .from_local_datetime(&local.date_naive().and_time(NaiveTime::MIN))
            .earliest(),
    };
    match aligned {
        Some(t) => t.timestamp_millis(),
        // Local boundary falls into a DST gap: fall back to the UTC boundary.
        None => ts
            .timestamp_millis()
            .div_euclid(granularity.step_ms())
            .saturating_mul(granularity.step_ms()),
    }
}

/// `2024-01-01T10:00:00.000Z`
fn iso_label(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}
