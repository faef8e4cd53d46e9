use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use clap::{Parser, ValueEnum};

use crate::telemetry::stats::DEFAULT_TREND_THRESHOLD;
use crate::telemetry::{Delimiter, ExportOptions, HeaderLocale};

/// Command-line configuration for the station server.
#[derive(Debug, Clone, Parser)]
#[command(name = "meteo-station")]
#[command(about = "Collects sensor telemetry and serves stats, charts and CSV exports")]
#[command(version)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Maximum number of samples retained (oldest are evicted first)
    #[arg(long, default_value_t = 10_000)]
    pub capacity: usize,

    /// Change across the last 5 samples that counts as an up/down trend
    #[arg(long, default_value_t = DEFAULT_TREND_THRESHOLD, value_parser = parse_threshold)]
    pub trend_threshold: f64,

    /// UTC offset used to render times, e.g. +02:00
    #[arg(long, default_value = "+00:00", allow_hyphen_values = true, value_parser = parse_offset)]
    pub utc_offset: FixedOffset,

    /// CSV field separator
    #[arg(long, value_enum, default_value_t = CsvDelimiter::Comma)]
    pub csv_delimiter: CsvDelimiter,

    /// Language of the CSV header row
    #[arg(long, value_enum, default_value_t = CsvLocale::En)]
    pub csv_locale: CsvLocale,

    /// Prefix CSV exports with a UTF-8 byte-order mark
    #[arg(long)]
    pub csv_bom: bool,

    /// Emit a `sep=` line so spreadsheets pick the right separator
    #[arg(long)]
    pub csv_sep_hint: bool,

    /// Mirror the history to this JSON file (in-memory only when omitted)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Directory served for the dashboard
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Push interval of the live SSE feed, in milliseconds
    #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(100..))]
    pub stream_interval_ms: u64,

    /// Feed simulated readings every N milliseconds (development only)
    #[arg(long, value_parser = clap::value_parser!(u64).range(10..))]
    pub simulate_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CsvDelimiter {
    Comma,
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CsvLocale {
    En,
    Uk,
}

impl Config {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            offset: self.utc_offset,
            delimiter: match self.csv_delimiter {
                CsvDelimiter::Comma => Delimiter::Comma,
                CsvDelimiter::Semicolon => Delimiter::Semicolon,
            },
            bom: self.csv_bom,
            separator_hint: self.csv_sep_hint,
            locale: match self.csv_locale {
                CsvLocale::En => HeaderLocale::En,
                CsvLocale::Uk => HeaderLocale::Uk,
            },
        }
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }

    pub fn simulate_every(&self) -> Option<Duration> {
        self.simulate_ms.map(Duration::from_millis)
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err("trend threshold must be a positive number".into())
    }
}

/// `+HH:MM`, `-HH:MM` or `+HH`.
fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let bad = || format!("invalid UTC offset `{s}` (expected e.g. +02:00)");
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(bad()),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().map_err(|_| bad())?;
    let minutes: i32 = minutes.parse().map_err(|_| bad())?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(bad());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(bad)
}
