//! Embeddable date-picker for the browser: a read-only text field that, on
//! activation, reveals a floating month grid anchored to it and reports the
//! picked day back to the page.
//!
//! The crate exposes two surfaces over the same instance controller:
//! - a Rust API ([`mount`], [`unmount`], [`open`], [`close`], [`set_date`],
//!   [`get_date`]) for Zoon applications embedding the widget directly;
//! - `window.CalendarWidget` with the equivalent camelCase methods,
//!   installed at module start for plain-JS host pages.
//!
//! Selection changes — user picks and programmatic `set_date` — are
//! announced as a bubbling `calendar:change` CustomEvent on the host
//! element, so page code can observe the widget without holding any handle
//! to it.

pub mod date_model;
pub mod dom;
pub mod error;
pub mod instance;
pub mod js_api;
pub mod picker;
pub mod placement;

pub use zoon;

pub use error::WidgetError;
pub use instance::{close, get_date, mount, open, set_date, unmount};
pub use picker::PickerOptions;
