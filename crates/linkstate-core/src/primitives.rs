//! # Primitives
//!
//! Compiled-in constants for the linkstate core: format identifiers, defaults
//! used when input omits a value, and bounds on imported topologies.

/// Version string written to `meta.version` of every route export.
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

/// Weight assigned to an imported link that does not specify one.
pub const DEFAULT_LINK_WEIGHT: f64 = 1.0;

/// First id handed out by a fresh graph.
pub const FIRST_NODE_ID: u64 = 1;

// =============================================================================
// HYSTERESIS DEFAULTS
// =============================================================================

/// EMA smoothing factor: weight of the newest sample.
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Filtered cost at or above which an UP link is declared DOWN.
pub const DEFAULT_THETA_UP: f64 = 1.6;

/// Filtered cost at or below which a DOWN link is declared UP again.
pub const DEFAULT_THETA_DOWN: f64 = 1.3;

/// Minimum time between two accepted status flips of the same link.
pub const DEFAULT_HOLD_MS: u64 = 1000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of nodes accepted from one topology document.
///
/// Every recompute is O(N·(N+E) log N); topologies beyond this are outside
/// what the full-rebuild model is meant for.
pub const MAX_IMPORT_NODE_COUNT: usize = 10_000;

/// Maximum number of links accepted from one topology document.
pub const MAX_IMPORT_LINK_COUNT: usize = 100_000;
