//! Cursor set for marking points in time
//!
//! A capture has a fixed number of cursor slots ([`MAX_CURSORS`]). Every slot
//! always exists; it is either undefined or holds a placed marker at an
//! absolute timestamp. Slot indices never change, so UI actions can be bound
//! to a slot ("go to cursor 3") regardless of whether it is currently placed.
//!
//! # Features
//!
//! - Bounds-checked access by slot index
//! - Placement validated against the capture's sample range
//! - Optional per-cursor labels
//! - Picking the cursor nearest to a timestamp (for dragging)

use crate::error::{NavError, Result};
use crate::types::{SampleRange, MAX_CURSORS};

/// A single cursor slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    timestamp: i64,
    defined: bool,
    label: Option<String>,
}

impl Cursor {
    fn new(index: usize) -> Self {
        Self {
            index,
            timestamp: 0,
            defined: false,
            label: None,
        }
    }

    /// Slot index, `0 <= index < MAX_CURSORS`
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if the cursor is placed
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Timestamp of a placed cursor
    pub fn timestamp(&self) -> Option<i64> {
        self.defined.then_some(self.timestamp)
    }

    /// User-assigned label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label to show, falling back to "Cursor N" (1-based)
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("Cursor {}", self.index + 1),
        }
    }
}

/// Fixed-capacity arena of cursor slots
#[derive(Debug, Clone)]
pub struct CursorSet {
    cursors: [Cursor; MAX_CURSORS],
    /// Sample range cursors may be placed in; `None` until a capture is loaded
    valid_range: Option<SampleRange>,
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorSet {
    /// Create a cursor set with all slots undefined and no capture range
    pub fn new() -> Self {
        Self {
            cursors: std::array::from_fn(Cursor::new),
            valid_range: None,
        }
    }

    /// Create a cursor set accepting timestamps within `range`
    pub fn with_range(range: SampleRange) -> Self {
        Self {
            valid_range: Some(range),
            ..Self::new()
        }
    }

    fn check_index(index: usize) -> Result<()> {
        if index >= MAX_CURSORS {
            return Err(NavError::InvalidIndex {
                index,
                max: MAX_CURSORS,
            });
        }
        Ok(())
    }

    /// Range cursors may currently be placed in
    pub fn valid_range(&self) -> Option<SampleRange> {
        self.valid_range
    }

    /// Update the valid range after a new capture was loaded
    ///
    /// Cursors outside the new range become undefined. Returns how many were removed.
    pub fn set_capture_range(&mut self, range: SampleRange) -> usize {
        self.valid_range = Some(range);
        let mut removed = 0;
        for cursor in self.cursors.iter_mut() {
            if cursor.defined && !range.contains(cursor.timestamp) {
                cursor.defined = false;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!("Removed {} cursors outside capture range {}", removed, range);
        }
        removed
    }

    /// Get the cursor in a slot, defined or not
    pub fn get_cursor(&self, index: usize) -> Result<&Cursor> {
        Self::check_index(index)?;
        Ok(&self.cursors[index])
    }

    /// All placed cursors, in index order
    pub fn defined_cursors(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter().filter(|c| c.defined)
    }

    /// Number of placed cursors
    pub fn defined_count(&self) -> usize {
        self.defined_cursors().count()
    }

    /// Place a cursor at a timestamp
    ///
    /// Timestamps outside the capture are rejected with
    /// [`NavError::OutOfRange`] and leave the slot unchanged.
    pub fn set_cursor(&mut self, index: usize, timestamp: i64) -> Result<()> {
        Self::check_index(index)?;
        let range = self.valid_range.ok_or(NavError::NoCapture)?;
        if !range.contains(timestamp) {
            tracing::warn!(
                "Rejected cursor {} at {}: outside capture {}",
                index,
                timestamp,
                range
            );
            return Err(NavError::OutOfRange {
                value: timestamp,
                range,
            });
        }

        let cursor = &mut self.cursors[index];
        cursor.timestamp = timestamp;
        cursor.defined = true;
        tracing::debug!("Cursor {} set to {}", index, timestamp);
        Ok(())
    }

    /// Remove a cursor; returns whether it was placed
    pub fn clear_cursor(&mut self, index: usize) -> Result<bool> {
        Self::check_index(index)?;
        let cursor = &mut self.cursors[index];
        let was_defined = cursor.defined;
        cursor.defined = false;
        if was_defined {
            tracing::debug!("Cursor {} removed", index);
        }
        Ok(was_defined)
    }

    /// Remove all cursors
    pub fn clear_all(&mut self) {
        for cursor in self.cursors.iter_mut() {
            cursor.defined = false;
        }
    }

    /// Set or remove the label of a slot
    pub fn set_label(&mut self, index: usize, label: Option<String>) -> Result<()> {
        Self::check_index(index)?;
        self.cursors[index].label = label;
        Ok(())
    }

    /// The placed cursor closest to `timestamp`, within `tolerance` samples
    ///
    /// On equal distance the lower index wins.
    pub fn nearest_defined(&self, timestamp: i64, tolerance: u64) -> Option<&Cursor> {
        self.defined_cursors()
            .map(|c| (c.timestamp.abs_diff(timestamp), c))
            .filter(|(distance, _)| *distance <= tolerance)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, c)| c)
    }
}

/// English ordinal of a 1-based cursor number, e.g. `"1st"`, `"22nd"`
///
/// Only 1/21/31, 2/22 and 3/23 get a special suffix; every other value,
/// including 11, 12, 13 and anything from 40 up, falls through to `"th"`.
pub fn ordinal_number(value: u32) -> String {
    let suffix = match value {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    };
    format!("{}{}", value, suffix)
}
