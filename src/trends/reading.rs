// src/trends/reading.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tracked health metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    BloodPressure,
    BloodGlucose,
    HeartRate,
    Weight,
    OxygenSaturation,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::BloodPressure,
        MetricKind::BloodGlucose,
        MetricKind::HeartRate,
        MetricKind::Weight,
        MetricKind::OxygenSaturation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::BloodPressure => "blood_pressure",
            MetricKind::BloodGlucose => "blood_glucose",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::Weight => "weight",
            MetricKind::OxygenSaturation => "oxygen_saturation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MetricKind::BloodPressure => "Blood Pressure",
            MetricKind::BloodGlucose => "Blood Glucose",
            MetricKind::HeartRate => "Heart Rate",
            MetricKind::Weight => "Weight",
            MetricKind::OxygenSaturation => "SpO₂",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::BloodPressure => "mmHg",
            MetricKind::BloodGlucose => "mg/dL",
            MetricKind::HeartRate => "bpm",
            MetricKind::Weight => "kg",
            MetricKind::OxygenSaturation => "%",
        }
    }

    /// Clinically, a rise is bad for these metrics. Flips the trend label.
    pub fn higher_is_worse(self) -> bool {
        matches!(self, MetricKind::BloodPressure | MetricKind::BloodGlucose)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.key() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("unknown metric kind '{s}'"))
    }
}

/// Metric-specific payload of a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValues {
    BloodPressure {
        systolic: f64,
        diastolic: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pulse: Option<f64>,
    },
    Single {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

/// One timestamped observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub values: ReadingValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Reading {
    pub fn blood_pressure(date: DateTime<Utc>, systolic: f64, diastolic: f64, pulse: Option<f64>) -> Self {
        Self {
            date,
            values: ReadingValues::BloodPressure {
                systolic,
                diastolic,
                pulse,
            },
            context: None,
            notes: None,
        }
    }

    pub fn single(date: DateTime<Utc>, value: Option<f64>, unit: Option<&str>) -> Self {
        Self {
            date,
            values: ReadingValues::Single {
                value,
                unit: unit.map(str::to_string),
            },
            context: None,
            notes: None,
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// `(systolic, diastolic)` when this is a blood-pressure reading.
    pub fn bp(&self) -> Option<(f64, f64)> {
        match self.values {
            ReadingValues::BloodPressure {
                systolic,
                diastolic,
                ..
            } => Some((systolic, diastolic)),
            ReadingValues::Single { .. } => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self.values {
            ReadingValues::Single { value, .. } => value.filter(|v| v.is_finite()),
            ReadingValues::BloodPressure { .. } => None,
        }
    }

    /// Value the trend is computed on: systolic for blood pressure, `value` otherwise.
    pub fn primary(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::BloodPressure => self.bp().map(|(s, _)| s).filter(|v| v.is_finite()),
            _ => self.value(),
        }
    }
}
