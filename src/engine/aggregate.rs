// Single pass over a row batch: windows, global latency pool, and keyed
// accumulators for route/resource rankings.

use chrono::TimeZone;
use indexmap::IndexMap;
use tracing::debug;

use super::classify::{ClassifiedEvent, ResourceSample, classify, parse_occurred_at};
use super::window::{WindowBucket, build_windows, window_index};
use crate::models::{DashboardQuery, RawEventRow};

/// Hit counts per path, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteCounter {
    counts: IndexMap<String, u64>,
}

impl RouteCounter {
    pub fn increment(&mut self, path: &str) {
        match self.counts.get_mut(path) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(path.to_string(), 1);
            }
        }
    }

    pub fn get(&self, path: &str) -> u64 {
        self.counts.get(path).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Duration samples for one route key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedDurationStats {
    pub key: String,
    pub durations: Vec<f64>,
}

/// Keyed duration samples, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedDurations {
    entries: IndexMap<String, KeyedDurationStats>,
}

impl KeyedDurations {
    pub fn record(&mut self, key: &str, duration_ms: f64) {
        match self.entries.get_mut(key) {
            Some(stats) => stats.durations.push(duration_ms),
            None => {
                self.entries.insert(
                    key.to_string(),
                    KeyedDurationStats {
                        key: key.to_string(),
                        durations: vec![duration_ms],
                    },
                );
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyedDurationStats> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Duration samples for one `initiatorType|name` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDurationStats {
    pub name: String,
    pub initiator_type: String,
    pub durations: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDurations {
    entries: IndexMap<String, ResourceDurationStats>,
}

impl ResourceDurations {
    pub fn record(&mut self, sample: &ResourceSample) {
        self.entries
            .entry(sample.key())
            .or_insert_with(|| ResourceDurationStats {
                name: sample.name.clone(),
                initiator_type: sample.initiator_type.clone(),
                durations: Vec::new(),
            })
            .durations
            .push(sample.duration_ms);
    }

    pub fn get(&self, initiator_type: &str, name: &str) -> Option<&ResourceDurationStats> {
        self.entries.get(&format!("{}|{}", initiator_type, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDurationStats> {
        self.entries.values()
    }
}

/// Everything one aggregation pass produces. Lives for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub windows: Vec<WindowBucket>,
    /// Every accepted request duration across the whole range (ms).
    pub global_durations: Vec<f64>,
    pub api_routes: RouteCounter,
    pub page_routes: RouteCounter,
    /// Keyed by `"METHOD path"`.
    pub request_durations: KeyedDurations,
    /// Keyed by `/api...` path.
    pub api_durations: KeyedDurations,
    pub resource_durations: ResourceDurations,
    /// Rows with an unparseable timestamp or one before the first window.
    pub dropped_rows: usize,
}

impl Aggregate {
    fn empty(windows: Vec<WindowBucket>) -> Self {
        Self {
            windows,
            global_durations: Vec::new(),
            api_routes: RouteCounter::default(),
            page_routes: RouteCounter::default(),
            request_durations: KeyedDurations::default(),
            api_durations: KeyedDurations::default(),
            resource_durations: ResourceDurations::default(),
            dropped_rows: 0,
        }
    }

    fn apply(&mut self, idx: usize, event: ClassifiedEvent) {
        let bucket = &mut self.windows[idx];
        match event {
            ClassifiedEvent::Request(req) => {
                bucket.request_count += 1;
                if req.is_error {
                    bucket.error_count += 1;
                }
                if let Some(d) = req.duration_ms {
                    bucket.durations.push(d);
                    self.global_durations.push(d);
                    self.request_durations.record(&req.key(), d);
                }
                if let Some(api_path) = req.api_path() {
                    self.api_routes.increment(api_path);
                    if let Some(d) = req.duration_ms {
                        self.api_durations.record(api_path, d);
                    }
                }
            }
            ClassifiedEvent::PageView { path } => {
                if let Some(path) = path {
                    self.page_routes.increment(&path);
                }
            }
            ClassifiedEvent::Paint { fcp_seconds } => {
                bucket.fcp_seconds.extend(fcp_seconds);
            }
            ClassifiedEvent::Resource(samples) => {
                for sample in &samples {
                    bucket.resource_durations.push(sample.duration_ms);
                    self.resource_durations.record(sample);
                }
            }
            ClassifiedEvent::Listening { lcp_seconds, cls } => {
                bucket.lcp_seconds.extend(lcp_seconds);
                bucket.cls_values.extend(cls);
            }
        }
    }
}

/// Aggregates `rows` over the query's windows, aligning days to server local time.
pub fn aggregate_rows(rows: &[RawEventRow], query: &DashboardQuery) -> Aggregate {
    aggregate_rows_in(rows, query, &chrono::Local)
}

/// Aggregates `rows` over the query's windows aligned in `tz`.
///
/// Rows are assigned to the last window starting at or before their
/// timestamp; rows with an unparseable timestamp or one earlier than the
/// first window are dropped. Unknown event names are ignored.
pub fn aggregate_rows_in<Tz: TimeZone>(
    rows: &[RawEventRow],
    query: &DashboardQuery,
    tz: &Tz,
) -> Aggregate {
    let mut agg = Aggregate::empty(build_windows(query.from(), query.to(), tz));

    for row in rows {
        let Some(idx) =
            parse_occurred_at(&row.occurred_at).and_then(|ts| window_index(&agg.windows, ts))
        else {
            agg.dropped_rows += 1;
            continue;
        };
        if let Some(event) = classify(row) {
            agg.apply(idx, event);
        }
    }

    debug!(
        rows = rows.len(),
        dropped = agg.dropped_rows,
        windows = agg.windows.len(),
        samples = agg.global_durations.len(),
        "aggregated event rows"
    );
    agg
}
