// src/trends/history.rs
use serde::{Deserialize, Serialize};

use crate::trends::reading::{MetricKind, Reading};

/// Per-metric reading histories, each kept in ascending date order.
///
/// This is the caller-side store; the analyzer functions only borrow from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthHistory {
    #[serde(default)]
    pub blood_pressure: Vec<Reading>,
    #[serde(default)]
    pub blood_glucose: Vec<Reading>,
    #[serde(default)]
    pub heart_rate: Vec<Reading>,
    #[serde(default)]
    pub weight: Vec<Reading>,
    #[serde(default)]
    pub oxygen_saturation: Vec<Reading>,
}

impl HealthHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: MetricKind) -> &[Reading] {
        match kind {
            MetricKind::BloodPressure => &self.blood_pressure,
            MetricKind::BloodGlucose => &self.blood_glucose,
            MetricKind::HeartRate => &self.heart_rate,
            MetricKind::Weight => &self.weight,
            MetricKind::OxygenSaturation => &self.oxygen_saturation,
        }
    }

    fn get_mut(&mut self, kind: MetricKind) -> &mut Vec<Reading> {
        match kind {
            MetricKind::BloodPressure => &mut self.blood_pressure,
            MetricKind::BloodGlucose => &mut self.blood_glucose,
            MetricKind::HeartRate => &mut self.heart_rate,
            MetricKind::Weight => &mut self.weight,
            MetricKind::OxygenSaturation => &mut self.oxygen_saturation,
        }
    }

    /// Insert after any readings with the same or earlier date.
    pub fn add_reading(&mut self, kind: MetricKind, reading: Reading) {
        let list = self.get_mut(kind);
        let at = list.partition_point(|r| r.date <= reading.date);
        list.insert(at, reading);
    }

    pub fn len(&self, kind: MetricKind) -> usize {
        self.get(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }
}
