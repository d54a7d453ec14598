//! Navigation controller
//!
//! Composes the cursor set, the zoom model and the annotation store into the
//! single object UI commands are issued against. The controller is created
//! once and handed to whatever layer issues commands; nothing here relies on
//! process-wide state.
//!
//! # Threading
//!
//! The controller lives on the interaction thread and is not `Sync`. Only
//! the annotation store it shares (via `Arc`) may be written from decoder
//! workers.
//!
//! # Silent no-ops
//!
//! Scrolling to a timestamp outside the capture or to an undefined cursor is
//! routine (e.g. a shortcut bound to an empty cursor slot) and does nothing.
//! These operations return `false` instead of an error.

pub mod actions;

pub use actions::{goto_cursor_id, NavAction};

use crate::annotation::{AnnotationPayload, AnnotationRange, AnnotationStore};
use crate::config::NavigatorConfig;
use crate::cursor::{Cursor, CursorSet};
use crate::error::{NavError, Result};
use crate::types::{CaptureInfo, SampleRange};
use crate::zoom::{ViewState, ZoomModel};
use std::cell::Cell;
use std::sync::Arc;

/// Observer of navigation changes (e.g. the signal diagram repainting)
#[cfg_attr(test, mockall::automock)]
pub trait NavigationListener {
    /// The visible window or the scale changed
    fn view_changed(&mut self, view: &ViewState);

    /// A cursor was placed (`Some(timestamp)`) or removed (`None`)
    fn cursor_changed(&mut self, index: usize, timestamp: Option<i64>);
}

/// Orchestrates cursor, zoom and scroll requests into consistent view state
pub struct NavigationController<T> {
    config: NavigatorConfig,
    capture: Option<CaptureInfo>,
    cursors: CursorSet,
    zoom: ZoomModel,
    annotations: Arc<AnnotationStore<T>>,
    listeners: Vec<Box<dyn NavigationListener>>,
    view_cache: Cell<Option<ViewState>>,
}

impl<T: AnnotationPayload> NavigationController<T> {
    /// Create a controller with its own annotation store
    pub fn new(config: NavigatorConfig) -> Self {
        let store = Arc::new(AnnotationStore::new(config.channel_count));
        Self::with_store(config, store)
    }

    /// Create a controller sharing an existing annotation store
    pub fn with_store(config: NavigatorConfig, annotations: Arc<AnnotationStore<T>>) -> Self {
        let mut zoom = ZoomModel::new(config.default_scale, config.max_scale);
        zoom.set_viewport_width(config.viewport_width_px);
        Self {
            config,
            capture: None,
            cursors: CursorSet::new(),
            zoom,
            annotations,
            listeners: Vec::new(),
            view_cache: Cell::new(None),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// The loaded capture, if any
    pub fn capture(&self) -> Option<&CaptureInfo> {
        self.capture.as_ref()
    }

    /// The cursor slots
    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    /// The zoom model
    pub fn zoom(&self) -> &ZoomModel {
        &self.zoom
    }

    /// The shared annotation store
    pub fn annotations(&self) -> &Arc<AnnotationStore<T>> {
        &self.annotations
    }

    /// Register a listener for view and cursor changes
    pub fn add_listener(&mut self, listener: Box<dyn NavigationListener>) {
        self.listeners.push(listener);
    }

    // ==================== View State ====================

    /// Current view state, recomputed only when one of its inputs changed
    pub fn view_state(&self) -> ViewState {
        if let Some(cached) = self.view_cache.get() {
            if cached.scale == self.zoom.scale()
                && cached.origin == self.zoom.origin()
                && cached.viewport_width == self.zoom.viewport_width()
            {
                return cached;
            }
        }
        let view = self.zoom.view_state();
        self.view_cache.set(Some(view));
        view
    }

    /// Samples covered by the viewport
    pub fn visible_range(&self) -> SampleRange {
        self.view_state().visible
    }

    /// Pixel offset of a sample in the viewport
    pub fn sample_to_pixel(&self, sample: i64) -> i64 {
        self.zoom.sample_to_pixel(sample)
    }

    /// Sample at a pixel offset in the viewport
    pub fn pixel_to_sample(&self, pixel: i64) -> i64 {
        self.zoom.pixel_to_sample(pixel)
    }

    /// Run a view mutation and notify listeners if the view changed
    fn update_view<R>(&mut self, f: impl FnOnce(&mut ZoomModel) -> R) -> R {
        let before = self.view_state();
        let result = f(&mut self.zoom);
        let after = self.view_state();
        if after != before {
            tracing::debug!(
                "View changed: scale {} px/sample, visible {}",
                after.scale,
                after.visible
            );
            for listener in self.listeners.iter_mut() {
                listener.view_changed(&after);
            }
        }
        result
    }

    fn notify_cursor(&mut self, index: usize, timestamp: Option<i64>) {
        for listener in self.listeners.iter_mut() {
            listener.cursor_changed(index, timestamp);
        }
    }

    // ==================== Capture ====================

    /// Load a new capture
    ///
    /// Resets the zoom to the original level at the start of the capture,
    /// drops all annotations of the previous capture (including decoder runs
    /// still in flight for it) and removes cursors that fall outside the new one.
    pub fn load_capture(&mut self, capture: CaptureInfo) {
        tracing::info!(
            "Loading capture: {} samples at {} Hz",
            capture.sample_count,
            capture.sample_rate_hz
        );
        self.capture = Some(capture);
        self.annotations.reset_for_capture();

        let removed: Vec<usize> = self
            .cursors
            .defined_cursors()
            .filter(|c| c.timestamp().is_some_and(|ts| !capture.contains(ts)))
            .map(Cursor::index)
            .collect();
        self.cursors.set_capture_range(capture.range());
        for index in removed {
            self.notify_cursor(index, None);
        }

        self.update_view(|zoom| {
            let width = zoom.viewport_width();
            zoom.reset_for_capture(capture.sample_count, width)
        });
    }

    /// Report a new viewport width from the rendering layer
    pub fn set_viewport_width(&mut self, viewport_width: u32) {
        self.update_view(|zoom| zoom.set_viewport_width(viewport_width));
    }

    // ==================== Zoom ====================

    /// Zoom to the original level
    pub fn zoom_default(&mut self) -> bool {
        self.update_view(ZoomModel::zoom_default)
    }

    /// Zoom in one step around the view center
    pub fn zoom_in(&mut self) -> bool {
        self.update_view(ZoomModel::zoom_in)
    }

    /// Zoom out one step around the view center
    pub fn zoom_out(&mut self) -> bool {
        self.update_view(ZoomModel::zoom_out)
    }

    /// Zoom in one step, keeping the sample under the pointer in place
    pub fn zoom_in_at(&mut self, pixel: i64) -> bool {
        self.update_view(|zoom| zoom.zoom_in_at(pixel))
    }

    /// Zoom out one step, keeping the sample under the pointer in place
    pub fn zoom_out_at(&mut self, pixel: i64) -> bool {
        self.update_view(|zoom| zoom.zoom_out_at(pixel))
    }

    /// Fit the whole capture into the viewport
    pub fn zoom_to_fit(&mut self) -> bool {
        let Some(capture) = self.capture else {
            return false;
        };
        self.update_view(|zoom| {
            let width = zoom.viewport_width();
            zoom.zoom_to_fit(width, capture.sample_count)
        })
    }

    /// Zoom so that `[start, end)` fills the viewport
    ///
    /// Both ends must lie within the capture (`end` may be one past the last sample).
    pub fn zoom_to_region(&mut self, start: i64, end: i64) -> Result<bool> {
        let capture = self.capture.ok_or(NavError::NoCapture)?;
        let range = capture.range();
        for value in [start, end] {
            if value < range.start || value > range.end {
                tracing::warn!("Rejected zoom region [{}, {}): outside {}", start, end, range);
                return Err(NavError::OutOfRange { value, range });
            }
        }
        Ok(self.update_view(|zoom| {
            let width = zoom.viewport_width();
            zoom.zoom_to_region(start, end, width)
        }))
    }

    // ==================== Scrolling ====================

    /// Center the view on a timestamp, clamped to the capture bounds
    ///
    /// Returns whether the view moved: `false` if no capture is loaded, the
    /// timestamp lies outside it, or the view already shows it at that position.
    pub fn scroll_to_timestamp(&mut self, timestamp: i64) -> bool {
        match self.capture {
            Some(capture) if capture.contains(timestamp) => {}
            _ => {
                tracing::trace!("Ignoring scroll to {} outside the capture", timestamp);
                return false;
            }
        }
        self.update_view(|zoom| {
            let half = (zoom.visible_samples() / 2).min(i64::MAX as u64) as i64;
            zoom.set_origin(timestamp.saturating_sub(half))
        })
    }

    /// Scroll the view by a number of pixels (positive moves right)
    pub fn scroll_by_pixels(&mut self, dx: i64) -> bool {
        self.update_view(|zoom| {
            let delta = (dx as f64 / zoom.scale()).round() as i64;
            zoom.set_origin(zoom.origin().saturating_add(delta))
        })
    }

    /// Scroll to the cursor in a slot
    ///
    /// An undefined cursor is a no-op returning `Ok(false)`.
    pub fn scroll_to_cursor(&mut self, index: usize) -> Result<bool> {
        let cursor = self.cursors.get_cursor(index)?;
        match cursor.timestamp() {
            Some(timestamp) => Ok(self.scroll_to_timestamp(timestamp)),
            None => Ok(false),
        }
    }

    /// "Go to cursor N": search the placed cursors for slot `index` and scroll to it
    ///
    /// Only placed cursors take part in the search, so a valid but empty
    /// slot, like an index outside the slot range, simply finds nothing.
    pub fn goto_nth_cursor(&mut self, index: usize) -> bool {
        let target = self
            .cursors
            .defined_cursors()
            .find(|c| c.index() == index)
            .and_then(Cursor::timestamp);
        match target {
            Some(timestamp) => self.scroll_to_timestamp(timestamp),
            None => false,
        }
    }

    // ==================== Cursors ====================

    /// Place a cursor at a timestamp
    pub fn set_cursor(&mut self, index: usize, timestamp: i64) -> Result<()> {
        self.cursors.set_cursor(index, timestamp)?;
        self.notify_cursor(index, Some(timestamp));
        Ok(())
    }

    /// Place a cursor at the sample under a pixel
    pub fn set_cursor_at_pixel(&mut self, index: usize, pixel: i64) -> Result<()> {
        let timestamp = self.pixel_to_sample(pixel);
        self.set_cursor(index, timestamp)
    }

    /// Remove a cursor; returns whether it was placed
    pub fn clear_cursor(&mut self, index: usize) -> Result<bool> {
        let removed = self.cursors.clear_cursor(index)?;
        if removed {
            self.notify_cursor(index, None);
        }
        Ok(removed)
    }

    /// Set or remove a cursor label
    pub fn set_cursor_label(&mut self, index: usize, label: Option<String>) -> Result<()> {
        self.cursors.set_label(index, label)
    }

    /// Get a cursor slot
    pub fn get_cursor(&self, index: usize) -> Result<&Cursor> {
        self.cursors.get_cursor(index)
    }

    /// All placed cursors, in index order
    pub fn defined_cursors(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.defined_cursors()
    }

    /// Placed cursor within the snap tolerance of a pixel, for dragging
    pub fn cursor_at_pixel(&self, pixel: i64) -> Option<&Cursor> {
        let timestamp = self.pixel_to_sample(pixel);
        let tolerance =
            (self.config.cursor_snap_tolerance_px as f64 / self.zoom.scale()).ceil() as u64;
        self.cursors.nearest_defined(timestamp, tolerance)
    }

    /// Whether the "go to cursor" action for a slot is selectable
    pub fn enabled_state(&self, index: usize) -> Result<bool> {
        Ok(self.cursors.get_cursor(index)?.is_defined())
    }

    // ==================== Annotations ====================

    /// Annotations of a channel intersecting the visible window
    pub fn annotations_in_view(&self, channel: usize) -> Result<AnnotationRange<T>> {
        let visible = self.visible_range();
        self.annotations
            .annotations_in_range(channel, visible.start, visible.end)
    }

    // ==================== Actions ====================

    /// Execute a UI action
    pub fn perform(&mut self, action: NavAction) -> Result<bool> {
        tracing::debug!("Performing action {:?}", action);
        match action {
            NavAction::ZoomDefault => Ok(self.zoom_default()),
            NavAction::ZoomIn => Ok(self.zoom_in()),
            NavAction::ZoomOut => Ok(self.zoom_out()),
            NavAction::ZoomAll => Ok(self.zoom_to_fit()),
            NavAction::GotoCursor(index) => {
                goto_cursor_id(index)?;
                Ok(self.goto_nth_cursor(index))
            }
        }
    }

    /// Whether a UI action is currently selectable
    pub fn is_enabled(&self, action: NavAction) -> Result<bool> {
        let loaded = self.capture.is_some();
        Ok(match action {
            NavAction::ZoomDefault | NavAction::ZoomAll => loaded,
            NavAction::ZoomIn => loaded && !self.zoom.is_zoomed_in_max(),
            NavAction::ZoomOut => loaded && !self.zoom.is_zoomed_out_min(),
            NavAction::GotoCursor(index) => self.enabled_state(index)?,
        })
    }
}
