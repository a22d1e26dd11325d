//! Query time window computation
//!
//! The monitoring API takes a `<start>/<end>` window of RFC 3339 UTC
//! timestamps. Without an explicit `H:M:S` interval the window covers the
//! last five minutes.

use crate::error::{Result, ScalerError};
use crate::models::IntervalComponent;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

/// Window used when no aggregation interval is configured
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// A `[start, end]` query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timespan {
    /// Window ending now
    pub fn from_interval(interval: Option<&str>) -> Result<Self> {
        Self::ending_at(interval, Utc::now())
    }

    /// Window ending at `end`, sized by an optional `H:M:S` interval
    pub fn ending_at(interval: Option<&str>, end: DateTime<Utc>) -> Result<Self> {
        let window = match interval.map(str::trim) {
            None | Some("") => DEFAULT_WINDOW,
            Some(interval) => parse_interval(interval)?,
        };

        let start = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| end.checked_sub_signed(window))
            .ok_or_else(|| ScalerError::TimespanParse {
                interval: interval.unwrap_or_default().to_string(),
                failed: Vec::new(),
                reason: "interval exceeds the representable time range".to_string(),
            })?;

        Ok(Self { start, end })
    }

    /// Length of the window
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Parse an `H:M:S` interval. Hours may exceed 24.
///
/// Every component is checked before failing so the error names all
/// invalid components at once.
pub fn parse_interval(interval: &str) -> Result<Duration> {
    let mut parts = interval.splitn(3, ':');
    let components = [
        IntervalComponent::Hours,
        IntervalComponent::Minutes,
        IntervalComponent::Seconds,
    ];

    let mut values = [0u64; 3];
    let mut failed = Vec::new();
    let mut reasons = Vec::new();

    for (slot, component) in values.iter_mut().zip(components) {
        match parts.next().map(|p| p.trim().parse::<u64>()) {
            Some(Ok(value)) => *slot = value,
            Some(Err(e)) => {
                failed.push(component);
                reasons.push(format!("{component}: {e}"));
            }
            None => {
                failed.push(component);
                reasons.push(format!("{component}: missing"));
            }
        }
    }

    if !failed.is_empty() {
        return Err(ScalerError::TimespanParse {
            interval: interval.to_string(),
            failed,
            reason: reasons.join(", "),
        });
    }

    let [hours, minutes, seconds] = values;
    hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|hm| hm.checked_add(seconds))
        .map(Duration::from_secs)
        .ok_or_else(|| ScalerError::TimespanParse {
            interval: interval.to_string(),
            failed: Vec::new(),
            reason: "interval exceeds the representable time range".to_string(),
        })
}
