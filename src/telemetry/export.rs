use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use super::{Metric, Sample};

/// Time format shared by every feed: sortable and locale independent.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ─── Options ─────────────────────────────────────────────────────

/// CSV field separator. Spreadsheets set to a comma-decimal locale
/// only split on semicolons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
        }
    }
}

/// Language of the CSV header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderLocale {
    #[default]
    En,
    Uk,
}

impl HeaderLocale {
    pub fn headers(self) -> [&'static str; 4] {
        match self {
            Self::En => ["Time", "Temperature (°C)", "Humidity (%)", "Pressure (hPa)"],
            Self::Uk => ["Час", "Температура (°C)", "Вологість (%)", "Тиск (hPa)"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// The one clock every rendered time is shown in
    pub offset: FixedOffset,
    pub delimiter: Delimiter,
    /// Prefix the CSV with a UTF-8 byte-order mark
    pub bom: bool,
    /// Emit Excel's `sep=` line before the header
    pub separator_hint: bool,
    pub locale: HeaderLocale,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            delimiter: Delimiter::Comma,
            bom: false,
            separator_hint: false,
            locale: HeaderLocale::En,
        }
    }
}

impl ExportOptions {
    pub fn format_time(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset).format(TIME_FORMAT).to_string()
    }
}

// ─── Chart feed ──────────────────────────────────────────────────

/// Parallel arrays, index-aligned with the snapshot, ready for a chart widget.
/// `last_update` is the newest sample's time in the same format as `times`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFeed {
    pub times: Vec<String>,
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
    pub pressures: Vec<f64>,
    pub count: usize,
    pub last_update: Option<String>,
}

pub fn to_chart_feed(samples: &[Sample], opts: &ExportOptions) -> ChartFeed {
    let column = |m: Metric| samples.iter().map(|s| m.value_of(s)).collect();

    ChartFeed {
        times: samples.iter().map(|s| opts.format_time(s.timestamp)).collect(),
        temperatures: column(Metric::Temperature),
        humidities: column(Metric::Humidity),
        pressures: column(Metric::Pressure),
        count: samples.len(),
        last_update: samples.last().map(|s| opts.format_time(s.timestamp)),
    }
}

// ─── CSV ─────────────────────────────────────────────────────────

/// Render the snapshot as CSV bytes, one row per sample in store order.
pub fn to_csv(samples: &[Sample], opts: &ExportOptions) -> Vec<u8> {
    let sep = opts.delimiter.as_char();
    let mut text = String::with_capacity(64 * (samples.len() + 2));

    if opts.separator_hint {
        // Writing into a String cannot fail
        let _ = writeln!(text, "sep={sep}");
    }
    push_row(&mut text, sep, opts.locale.headers());

    for s in samples {
        push_row(
            &mut text,
            sep,
            [
                opts.format_time(s.timestamp),
                s.temperature.to_string(),
                s.humidity.to_string(),
                s.pressure.to_string(),
            ],
        );
    }

    let mut out = Vec::with_capacity(UTF8_BOM.len() + text.len());
    if opts.bom {
        out.extend_from_slice(UTF8_BOM);
    }
    out.extend_from_slice(text.as_bytes());
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, sep: char, fields: [S; 4]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        push_field(out, sep, field.as_ref());
    }
    out.push('\n');
}

fn push_field(out: &mut String, sep: char, field: &str) {
    let needs_quotes = field.contains(|c: char| c == sep || c == '"' || c == '\n' || c == '\r');
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    for c in field.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}
