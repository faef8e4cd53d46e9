use std::collections::HashMap;

use serde_json::value::RawValue;

use super::{Metric, TelemetryError};

/// A decoded ingestion payload, before the store stamps it with a time.
///
/// Device firmware is not trusted to send well-formed numbers: a field that
/// is missing or cannot be read as a finite number becomes `0.0` instead of
/// failing the whole request. Only a body that is not a JSON object at all
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature: finite_or_zero(temperature),
            humidity: finite_or_zero(humidity),
            pressure: finite_or_zero(pressure),
        }
    }

    /// Decode a raw request body.
    ///
    /// Field values are kept as raw JSON text until coercion, so a number
    /// literal too large for `f64` only zeroes its own field.
    pub fn decode(body: &[u8]) -> Result<Self, TelemetryError> {
        let fields: HashMap<String, Box<RawValue>> = serde_json::from_slice(body)
            .map_err(|e| TelemetryError::InvalidPayload(e.to_string()))?;

        let field = |m: Metric| fields.get(m.key()).map(|raw| coerce(raw)).unwrap_or(0.0);
        Ok(Self {
            temperature: field(Metric::Temperature),
            humidity: field(Metric::Humidity),
            pressure: field(Metric::Pressure),
        })
    }
}

/// Lenient number coercion: numbers and numeric strings pass, the rest is 0.
fn coerce(raw: &RawValue) -> f64 {
    let text = raw.get().trim();
    let parsed = match text.as_bytes().first() {
        Some(b'"') => serde_json::from_str::<String>(text)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok()),
        // Out-of-range literals parse to +-inf here and are zeroed below
        Some(b'-' | b'0'..=b'9') => text.parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(finite_or_zero).unwrap_or(0.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
