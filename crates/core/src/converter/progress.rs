//! Conversion progress derived from the engine log.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

static DURATION_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").ok());
static TIME_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").ok());
static OUT_TIME_MS_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"out_time_ms=(\d+)").ok());

/// Progress update during conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Name of the file being converted.
    pub file_name: String,
    /// Progress percentage (0.0 - 100.0).
    pub percent: f32,
}

/// Follows one command's log and tracks how far it got.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    duration_secs: Option<f64>,
    position_secs: f64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one log line. Returns the new percentage when the line moved
    /// the position and the total duration is known.
    pub fn observe(&mut self, line: &str) -> Option<f32> {
        if self.duration_secs.is_none() {
            if let Some(total) = capture_timestamp(&DURATION_RE, line) {
                self.duration_secs = Some(total);
                return None;
            }
        }

        let position = capture_micros(line).or_else(|| capture_timestamp(&TIME_RE, line))?;
        self.position_secs = position;
        self.percent()
    }

    /// Current percentage, if the total duration is known.
    pub fn percent(&self) -> Option<f32> {
        match self.duration_secs {
            Some(total) if total > 0.0 => Some((self.position_secs / total * 100.0).min(100.0) as f32),
            _ => None,
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }
}

fn capture_timestamp(re: &Lazy<Option<Regex>>, line: &str) -> Option<f64> {
    let caps = re.as_ref()?.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn capture_micros(line: &str) -> Option<f64> {
    let caps = OUT_TIME_MS_RE.as_ref()?.captures(line)?;
    let micros: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(micros / 1_000_000.0)
}
