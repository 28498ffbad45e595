//! Kiru shot transition post-processing library.
//!
//! Anchor-based temporal detectors regress interval offsets relative to a set
//! of fixed reference intervals ("default bars") and emit a confidence score
//! per anchor and class. This crate turns that raw network output into usable
//! detections: it decodes the offsets into absolute frame intervals
//! ([`detection::coder`]), measures interval overlap ([`detection::overlap`]),
//! optionally removes duplicates ([`detection::nms`]), and assembles a
//! fixed-shape result tensor per batch item and class ([`detection`]).
//!
//! All of this operates on plain numeric arrays. Inference, video decoding and
//! training are out of scope and live in the host application.

use log::LevelFilter;

pub mod detection;
pub mod interval;
pub mod iter;
pub mod num;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and Kiru will log
/// at *trace* level. Otherwise, they will log at *debug* level.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
