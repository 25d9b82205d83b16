//! # linkstate
//!
//! Library half of the linkstate binary: HTTP control surface, TOML
//! configuration and the clock/ticker glue around `linkstate-core`.

pub mod api;
pub mod config;
pub mod ticker;
