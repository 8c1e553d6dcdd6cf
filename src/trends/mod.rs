//! # Metric Trends
//! Chart-ready reduction of a reading history.
//!
//! Readings are filtered to a trailing window of days, summarized
//! (average/min/max/latest), and given a coarse trend verdict by comparing
//! the mean of the first half of the window against the second half.
//! Everything here is pure: the caller's slice is never mutated and nothing
//! is carried between calls.

pub mod history;
pub mod reading;
pub mod sample;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use history::HealthHistory;
pub use reading::{MetricKind, Reading, ReadingValues};

/// Half-over-half changes below this (in percent) count as stable.
pub const STABLE_THRESHOLD_PCT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Worsening,
    Stable,
    /// Fewer than two points, or a half with no usable values.
    Insufficient,
}

impl TrendDirection {
    /// UI copy for the trend badge.
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Improving => "Improving Trend",
            TrendDirection::Worsening => "Needs Attention",
            TrendDirection::Stable => "Stable",
            TrendDirection::Insufficient => "Insufficient Data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// `None` exactly when `direction` is `Insufficient`.
    pub percentage_change: Option<f64>,
}

impl TrendResult {
    pub fn insufficient() -> Self {
        Self {
            direction: TrendDirection::Insufficient,
            percentage_change: None,
        }
    }
}

/// Aggregate over one numeric series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
    pub count: usize,
}

impl Summary {
    /// `None` for an empty series.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut it = values.into_iter();
        let first = it.next()?;
        let mut s = Summary {
            average: first,
            min: first,
            max: first,
            latest: first,
            count: 1,
        };
        let mut sum = first;
        for v in it {
            sum += v;
            s.min = s.min.min(v);
            s.max = s.max.max(v);
            s.latest = v;
            s.count += 1;
        }
        s.average = sum / s.count as f64;
        Some(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Statistics {
    BloodPressure { systolic: Summary, diastolic: Summary },
    Single(Summary),
}

/// One point on a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Short axis label, e.g. `Oct 19`.
    pub label: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Everything a chart widget needs for one metric and window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub metric: MetricKind,
    pub window_days: u32,
    pub series: Vec<ChartPoint>,
    /// `None` means "no data yet", which is distinct from an insufficient trend.
    pub statistics: Option<Statistics>,
    pub trend: TrendResult,
}

/// Readings dated within the last `days` days of now, oldest first.
pub fn filter_by_window(readings: &[Reading], days: u32) -> Vec<Reading> {
    filter_by_window_at(readings, days, Utc::now())
}

/// Same as [`filter_by_window`] against an explicit `now`. The boundary
/// (exactly `days` before `now`) is kept. A window reaching past the
/// representable range keeps everything.
pub fn filter_by_window_at(readings: &[Reading], days: u32, now: DateTime<Utc>) -> Vec<Reading> {
    let cutoff = Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut out: Vec<Reading> = readings
        .iter()
        .filter(|r| r.date >= cutoff)
        .cloned()
        .collect();
    out.sort_by_key(|r| r.date);
    out
}

/// `latest` is the value of the newest reading by date, whatever the slice order.
pub fn compute_statistics(readings: &[Reading], kind: MetricKind) -> Option<Statistics> {
    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.date);

    match kind {
        MetricKind::BloodPressure => {
            let pairs: Vec<(f64, f64)> = ordered.iter().filter_map(|r| r.bp()).collect();
            Some(Statistics::BloodPressure {
                systolic: Summary::from_values(pairs.iter().map(|p| p.0))?,
                diastolic: Summary::from_values(pairs.iter().map(|p| p.1))?,
            })
        }
        _ => Summary::from_values(ordered.iter().filter_map(|r| r.value())).map(Statistics::Single),
    }
}

fn half_mean(half: &[Reading], kind: MetricKind) -> Option<f64> {
    let vals: Vec<f64> = half.iter().filter_map(|r| r.primary(kind)).collect();
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().sum::<f64>() / vals.len() as f64)
}

/// Map a signed change onto a direction. Rises are bad for blood pressure
/// and glucose and good for everything else.
pub fn classify(percentage_change: f64, kind: MetricKind) -> TrendDirection {
    if percentage_change.abs() < STABLE_THRESHOLD_PCT {
        return TrendDirection::Stable;
    }
    let rising = percentage_change > 0.0;
    match (rising, kind.higher_is_worse()) {
        (true, true) | (false, false) => TrendDirection::Worsening,
        (true, false) | (false, true) => TrendDirection::Improving,
    }
}

/// First-half vs second-half mean over an already filtered, date-ascending series.
pub fn compute_trend(readings: &[Reading], kind: MetricKind) -> TrendResult {
    if readings.len() < 2 {
        return TrendResult::insufficient();
    }
    let (first, second) = readings.split_at(readings.len() / 2);
    let (Some(a), Some(b)) = (half_mean(first, kind), half_mean(second, kind)) else {
        return TrendResult::insufficient();
    };
    if a == 0.0 {
        return TrendResult::insufficient();
    }

    let pc = (b - a) / a * 100.0;
    TrendResult {
        direction: classify(pc, kind),
        percentage_change: Some(pc),
    }
}

pub fn chart_series(readings: &[Reading], kind: MetricKind) -> Vec<ChartPoint> {
    readings
        .iter()
        .map(|r| {
            let mut p = ChartPoint {
                label: r.date.format("%b %-d").to_string(),
                timestamp: r.date,
                systolic: None,
                diastolic: None,
                pulse: None,
                value: None,
                unit: None,
                context: r.context.clone(),
            };
            match &r.values {
                ReadingValues::BloodPressure {
                    systolic,
                    diastolic,
                    pulse,
                } => {
                    p.systolic = Some(*systolic);
                    p.diastolic = Some(*diastolic);
                    p.pulse = *pulse;
                }
                ReadingValues::Single { value, unit } => {
                    p.value = *value;
                    p.unit = Some(unit.clone().unwrap_or_else(|| kind.unit().to_string()));
                }
            }
            if kind == MetricKind::BloodGlucose && p.context.is_none() {
                p.context = Some("General".to_string());
            }
            p
        })
        .collect()
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Latest reading as shown on a metric card: `120/80` or the bare value.
pub fn latest_display(readings: &[Reading], kind: MetricKind) -> Option<String> {
    let last = readings.iter().max_by_key(|r| r.date)?;
    match kind {
        MetricKind::BloodPressure => last.bp().map(|(s, d)| format!("{}/{}", fmt_num(s), fmt_num(d))),
        _ => last.value().map(fmt_num),
    }
}

pub fn analyze(readings: &[Reading], kind: MetricKind, days: u32) -> TrendReport {
    analyze_at(readings, kind, days, Utc::now())
}

pub fn analyze_at(readings: &[Reading], kind: MetricKind, days: u32, now: DateTime<Utc>) -> TrendReport {
    let window = filter_by_window_at(readings, days, now);
    TrendReport {
        metric: kind,
        window_days: days,
        series: chart_series(&window, kind),
        statistics: compute_statistics(&window, kind),
        trend: compute_trend(&window, kind),
    }
}
