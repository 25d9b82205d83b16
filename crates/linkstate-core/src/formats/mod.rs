//! # Formats Module
//!
//! Document formats read by the core. File I/O lives in the app layer.

mod topology;

pub use topology::*;
