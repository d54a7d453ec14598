//! Core data types for the navigation engine
//!
//! This module contains the shared vocabulary used by every component:
//! sample ranges, capture metadata and the constants that bound the
//! channel and cursor index domains.
//!
//! # Main Types
//!
//! - [`SampleRange`] - Half-open range of absolute sample indices
//! - [`CaptureInfo`] - Length, sample rate and trigger position of a capture
//!
//! # Time Model
//!
//! Every position in this crate is an absolute sample index (`i64`). A
//! capture of `N` samples covers `[0, N)`. Conversion to seconds only
//! happens for display, relative to the trigger position when one is set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cursor slots (cursor index domain is `[0, MAX_CURSORS)`)
pub const MAX_CURSORS: usize = 32;

/// Number of annotation channels (channel domain is `[0, MAX_CHANNELS)`)
pub const MAX_CHANNELS: usize = 32;

/// Half-open range of absolute sample indices `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRange {
    /// First sample in the range
    pub start: i64,
    /// One past the last sample in the range
    pub end: i64,
}

impl SampleRange {
    /// Create a new range, normalizing an inverted range to an empty one
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of samples covered
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    /// Check if the range covers no samples
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if a sample lies inside the range
    pub fn contains(&self, sample: i64) -> bool {
        sample >= self.start && sample < self.end
    }

    /// Check if two ranges share at least one sample
    pub fn intersects(&self, other: &SampleRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Clamp a sample into the range (the last valid sample for values past the end)
    pub fn clamp(&self, sample: i64) -> i64 {
        if self.is_empty() {
            return self.start;
        }
        sample.clamp(self.start, self.end - 1)
    }

    /// Middle sample of the range
    pub fn center(&self) -> i64 {
        self.start + (self.len() / 2) as i64
    }
}

impl fmt::Display for SampleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Metadata of a loaded capture, supplied by the acquisition layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureInfo {
    /// Total number of samples in the capture
    pub sample_count: u64,
    /// Sample rate in Hz
    pub sample_rate_hz: u32,
    /// Sample index of the trigger, if the capture was triggered
    pub trigger_position: Option<i64>,
}

impl CaptureInfo {
    /// Create capture metadata without a trigger position
    pub fn new(sample_count: u64, sample_rate_hz: u32) -> Self {
        Self {
            sample_count,
            sample_rate_hz,
            trigger_position: None,
        }
    }

    /// Set the trigger position
    pub fn with_trigger(mut self, trigger_position: i64) -> Self {
        self.trigger_position = Some(trigger_position);
        self
    }

    /// Valid sample range of the capture
    pub fn range(&self) -> SampleRange {
        SampleRange::new(0, self.sample_count.min(i64::MAX as u64) as i64)
    }

    /// Check if a timestamp lies within the capture
    pub fn contains(&self, timestamp: i64) -> bool {
        self.range().contains(timestamp)
    }

    /// Seconds between the trigger (or capture start) and a timestamp
    pub fn timestamp_to_seconds(&self, timestamp: i64) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        let reference = self.trigger_position.unwrap_or(0);
        (timestamp - reference) as f64 / self.sample_rate_hz as f64
    }

    /// Human-readable time of a timestamp, e.g. `"1.500 ms"`
    pub fn format_timestamp(&self, timestamp: i64) -> String {
        format_seconds(self.timestamp_to_seconds(timestamp))
    }
}

/// Format a time in seconds with an engineering unit suffix
pub fn format_seconds(seconds: f64) -> String {
    let abs = seconds.abs();
    if abs >= 1.0 || abs == 0.0 {
        format!("{:.3} s", seconds)
    } else if abs >= 1e-3 {
        format!("{:.3} ms", seconds * 1e3)
    } else if abs >= 1e-6 {
        format!("{:.3} μs", seconds * 1e6)
    } else {
        format!("{:.3} ns", seconds * 1e9)
    }
}
