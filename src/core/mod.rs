//! Core layer - document-wide conventions.
//!
//! This module provides:
//! - [`TimeBase`] / [`TimeMode`] - Tick conversion and frame rates
//! - [`GlobalSettings`] - Axis, unit and time settings of a document
//! - [`CoordinateSystem`] - Conversion into the output axis convention
//! - [`ImportOptions`] - Host options consumed by the pipeline

mod options;
mod settings;
mod time;

pub use options::{AnimationType, ImportOptions, PivotMode};
pub use settings::{CoordinateSystem, GlobalSettings};
pub use time::{
    TimeBase, TimeMode, LEGACY_TC_DEFINITION, NEW_TIME_CODE_VERSION, TICKS_PER_SECOND_LEGACY,
    TICKS_PER_SECOND_NEW,
};
