use serde::Serialize;

use super::{Metric, Sample};

/// Number of most recent samples the trend looks at.
pub const TREND_WINDOW: usize = 5;

/// Default swing (in the metric's own unit) that counts as a trend.
pub const DEFAULT_TREND_THRESHOLD: f64 = 1.0;

/// Direction of the last `TREND_WINDOW` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// current / average / min / max / trend for one metric.
/// Serialized straight into the stats JSON and the SSE payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub current: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
}

impl Aggregate {
    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            current: 0.0,
            average: 0.0,
            min: 0.0,
            max: 0.0,
            trend: Trend::Stable,
        }
    }
}

/// Complete stats document for the whole retained window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub temperature: Aggregate,
    pub humidity: Aggregate,
    pub pressure: Aggregate,
    pub count: usize,
    /// RFC 3339 time of the newest sample; `null` while the store is empty
    pub last_update: Option<String>,
}

/// Pure aggregation over a snapshot. Holds only the trend threshold,
/// so it is `Copy` and can be handed to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsEngine {
    threshold: f64,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_THRESHOLD)
    }
}

impl StatsEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn compute(&self, samples: &[Sample]) -> Stats {
        let last_update = samples.last().map(|s| s.timestamp.to_rfc3339());
        let agg = |m: Metric| self.aggregate(samples.iter().map(|s| m.value_of(s)));

        Stats {
            temperature: agg(Metric::Temperature),
            humidity: agg(Metric::Humidity),
            pressure: agg(Metric::Pressure),
            count: samples.len(),
            last_update,
        }
    }

    /// Aggregate a single series given oldest-first.
    pub fn aggregate<I>(&self, values: I) -> Aggregate
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        let Some(&current) = values.last() else {
            return Aggregate::empty();
        };

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Aggregate {
            current,
            average: mean(&values, min, max),
            min,
            max,
            trend: self.trend(&values),
        }
    }

    /// Compare first and last of the trailing window against the threshold.
    pub fn trend(&self, values: &[f64]) -> Trend {
        if values.len() < TREND_WINDOW {
            return Trend::Stable;
        }
        let window = &values[values.len() - TREND_WINDOW..];
        let diff = window[TREND_WINDOW - 1] - window[0];

        if diff > self.threshold {
            Trend::Up
        } else if diff < -self.threshold {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

/// Plain `sum / n` while the sum stays finite; near `f64::MAX` the terms are
/// scaled first. The mean always lies within `[min, max]`.
fn mean(values: &[f64], min: f64, max: f64) -> f64 {
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let avg = if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    };
    if min <= max {
        avg.clamp(min, max)
    } else {
        avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn samples(temps: &[f64]) -> Vec<Sample> {
        temps
            .iter()
            .enumerate()
            .map(|(i, &t)| Sample {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                temperature: t,
                humidity: 40.0 + i as f64,
                pressure: 1013.0 - i as f64,
            })
            .collect()
    }

    #[test]
    fn empty_snapshot_is_all_zero_and_stable() {
        let stats = StatsEngine::default().compute(&[]);
        for agg in [stats.temperature, stats.humidity, stats.pressure] {
            assert_eq!(agg, Aggregate::empty());
        }
        assert_eq!(stats.count, 0);
        assert!(stats.last_update.is_none());
    }

    #[test]
    fn trend_boundaries_at_default_threshold() {
        let engine = StatsEngine::new(1.0);
        let up = engine.compute(&samples(&[20.0, 20.0, 20.0, 20.0, 21.2]));
        let flat = engine.compute(&samples(&[20.0, 20.0, 20.0, 20.0, 20.3]));
        let down = engine.compute(&samples(&[20.0, 20.0, 20.0, 20.0, 18.5]));

        assert_eq!(up.temperature.trend, Trend::Up);
        assert_eq!(flat.temperature.trend, Trend::Stable);
        assert_eq!(down.temperature.trend, Trend::Down);
    }

    #[test]
    fn trend_needs_a_full_window() {
        let engine = StatsEngine::new(1.0);
        let stats = engine.compute(&samples(&[10.0, 20.0, 30.0, 40.0]));
        assert_eq!(stats.temperature.trend, Trend::Stable);
    }

    #[test]
    fn trend_only_looks_at_the_last_window() {
        let engine = StatsEngine::new(1.0);
        // Big rise early on, flat tail
        let stats = engine.compute(&samples(&[0.0, 50.0, 50.0, 50.0, 50.0, 50.0]));
        assert_eq!(stats.temperature.trend, Trend::Stable);
        // Interior spike is ignored; only first and last of the window count
        let stats = engine.compute(&samples(&[20.0, 99.0, -99.0, 5.0, 20.5]));
        assert_eq!(stats.temperature.trend, Trend::Stable);
    }

    #[test]
    fn threshold_is_exclusive_and_configurable() {
        assert_eq!(StatsEngine::new(1.0).trend(&[0.0, 0.0, 0.0, 0.0, 1.0]), Trend::Stable);
        assert_eq!(StatsEngine::new(0.5).trend(&[20.0, 20.0, 20.0, 20.0, 20.6]), Trend::Up);
        assert_eq!(StatsEngine::new(0.5).trend(&[20.0, 20.0, 20.0, 20.0, 19.4]), Trend::Down);
        assert_eq!(StatsEngine::new(-0.5).threshold(), 0.5);
    }

    #[test]
    fn aggregates_cover_the_whole_window() {
        let stats = StatsEngine::default().compute(&samples(&[18.0, 22.0, 19.0, 25.0]));
        let t = stats.temperature;
        assert_eq!(t.current, 25.0);
        assert_eq!(t.min, 18.0);
        assert_eq!(t.max, 25.0);
        assert_eq!(t.average, 21.0);

        assert_eq!(stats.humidity.current, 43.0);
        assert_eq!(stats.pressure.min, 1010.0);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn average_is_not_rounded() {
        let stats = StatsEngine::default().compute(&samples(&[1.0, 2.0, 2.0]));
        assert_eq!(stats.temperature.average, 5.0 / 3.0);
    }

    #[test]
    fn average_survives_values_near_f64_max() {
        let engine = StatsEngine::default();
        let agg = engine.aggregate([1e308, 1e308]);
        assert_eq!(agg.average, 1e308);

        let agg = engine.aggregate([f64::MAX, f64::MAX, f64::MAX]);
        assert!(agg.average.is_finite());

        let stats = engine.compute(&samples(&[1e308, 1e308]));
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["temperature"]["average"].is_number());
    }

    #[test]
    fn compute_is_idempotent() {
        let snap = samples(&[20.1, 20.7, 19.9, 21.4, 22.8, 23.3]);
        let engine = StatsEngine::default();
        let a = engine.compute(&snap);
        let b = engine.compute(&snap);
        assert_eq!(a, b);
        for (x, y) in [
            (a.temperature, b.temperature),
            (a.humidity, b.humidity),
            (a.pressure, b.pressure),
        ] {
            assert_eq!(x.average.to_bits(), y.average.to_bits());
        }
    }

    #[test]
    fn serializes_to_stats_document() {
        let stats = StatsEngine::default().compute(&samples(&[20.0]));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["temperature"]["trend"], "stable");
        assert_eq!(json["count"], 1);
        assert_eq!(json["lastUpdate"], "2023-11-14T22:13:20+00:00");
        assert!(json["pressure"]["average"].is_number());
    }
}
