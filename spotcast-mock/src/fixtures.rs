//! Deterministic synthetic hourly signals.
//!
//! Values depend only on the UTC hour index, so two fetches of overlapping
//! ranges agree on every shared hour.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};

fn hour_index(ts: DateTime<Utc>) -> f64 {
    (ts.timestamp() / 3600) as f64
}

fn wave(h: f64, period: f64, phase: f64) -> f64 {
    (TAU * (h - phase) / period).sin()
}

pub(crate) fn price(ts: DateTime<Utc>) -> Vec<f64> {
    let h = hour_index(ts);
    let drift = (h % 7.0) * 0.3;
    vec![40.0 + 10.0 * wave(h, 24.0, 6.0) + 5.0 * wave(h, 168.0, 0.0) + drift]
}

pub(crate) fn grid(ts: DateTime<Utc>) -> Vec<f64> {
    let h = hour_index(ts);
    let load = 5000.0 + 800.0 * wave(h, 24.0, 7.0) + 150.0 * wave(h, 168.0, 24.0);
    let solar = (900.0 * wave(h, 24.0, 6.0)).max(0.0);
    let wind = 1200.0 + 400.0 * wave(h, 97.0, 0.0);
    vec![load, solar, wind]
}

pub(crate) fn weather(ts: DateTime<Utc>) -> Vec<f64> {
    let h = hour_index(ts);
    vec![5.0 + 8.0 * wave(h, 24.0, 9.0), 6.0 + 2.0 * wave(h, 53.0, 11.0)]
}
