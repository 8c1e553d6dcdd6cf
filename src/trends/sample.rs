// src/trends/sample.rs
//! Demo data for the tracker dashboard: a month of plausible readings.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::trends::history::HealthHistory;
use crate::trends::reading::{MetricKind, Reading};

const SAMPLE_DAYS: i64 = 30;
const GLUCOSE_CONTEXTS: [&str; 3] = ["Fasting", "Pre-meal", "Post-meal"];

pub fn sample_history(now: DateTime<Utc>) -> HealthHistory {
    sample_history_with(&mut rand::rng(), now)
}

/// 31 daily blood-pressure and heart-rate readings ending at `now`,
/// glucose every other day. Weight and SpO₂ stay empty.
pub fn sample_history_with<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> HealthHistory {
    let mut h = HealthHistory::new();
    for i in (0..=SAMPLE_DAYS).rev() {
        let date = now - Duration::days(i);

        h.add_reading(
            MetricKind::BloodPressure,
            Reading::blood_pressure(
                date,
                f64::from(120 + rng.random_range(0..20_u32)),
                f64::from(75 + rng.random_range(0..15_u32)),
                Some(f64::from(70 + rng.random_range(0..20_u32))),
            )
            .with_context(if i % 2 == 0 { "Morning" } else { "Evening" }),
        );

        if i % 2 == 0 {
            let ctx = GLUCOSE_CONTEXTS[rng.random_range(0..GLUCOSE_CONTEXTS.len())];
            h.add_reading(
                MetricKind::BloodGlucose,
                Reading::single(
                    date,
                    Some(f64::from(90 + rng.random_range(0..30_u32))),
                    Some(MetricKind::BloodGlucose.unit()),
                )
                .with_context(ctx),
            );
        }

        h.add_reading(
            MetricKind::HeartRate,
            Reading::single(
                date,
                Some(f64::from(65 + rng.random_range(0..25_u32))),
                Some(MetricKind::HeartRate.unit()),
            )
            .with_context("Resting"),
        );
    }
    h
}
