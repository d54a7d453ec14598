//! # LogicNav: Signal Navigation Engine
//!
//! The navigation core of a logic-analyzer viewer. It keeps track of where
//! the user is looking in a captured sample stream and what is annotated
//! there, independent of any rendering toolkit.
//!
//! ## Architecture
//!
//! - **Annotations**: Per-channel, sorted annotation containers with
//!   logarithmic range and nearest-neighbour queries, written by decoder
//!   worker threads through a crossbeam channel and read by the UI thread
//!   from consistent snapshots
//! - **Cursors**: A fixed set of numbered markers placed at absolute sample
//!   timestamps
//! - **Zoom**: The pixels-per-sample scale and the sample/pixel conversion
//! - **Navigation**: The controller that turns UI actions (zoom in, go to
//!   cursor 3, ...) into a consistent view state
//!
//! ## Configuration
//!
//! Tunables are read from `navigator.toml` in the platform configuration
//! directory under `logicnav/`. See [`config`].
//!
//! ## Example
//!
//! ```ignore
//! use logicnav::{CaptureInfo, NavAction, NavigationController, NavigatorConfig};
//! use logicnav::annotation::{AnnotationValue, DecoderFeed};
//!
//! let mut nav = NavigationController::<AnnotationValue>::new(NavigatorConfig::load_or_default());
//! nav.load_capture(CaptureInfo::new(1_000_000, 24_000_000));
//!
//! // Decoder output arrives on a worker thread
//! let mut feed = DecoderFeed::new(nav.annotations().clone());
//! let sender = feed.sender();
//! std::thread::spawn(move || {
//!     sender.start();
//!     sender.annotate(3, AnnotationValue::Data(0x55), 1200, 1280);
//!     sender.finish();
//! });
//!
//! // The UI thread commits finished runs and navigates
//! feed.pump()?;
//! nav.set_cursor(0, 1200)?;
//! nav.perform(NavAction::GotoCursor(0))?;
//! for annotation in &nav.annotations_in_view(3)? {
//!     println!("{}", annotation);
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod cursor;
pub mod error;
pub mod navigation;
pub mod types;
pub mod zoom;

// Re-export commonly used types
pub use annotation::{Annotation, AnnotationRange, AnnotationStore, AnnotationValue};
pub use config::NavigatorConfig;
pub use cursor::{Cursor, CursorSet};
pub use error::{NavError, Result};
pub use navigation::{NavAction, NavigationController, NavigationListener};
pub use types::{CaptureInfo, SampleRange, MAX_CHANNELS, MAX_CURSORS};
pub use zoom::{ViewState, ZoomModel};
