//! # Link Hysteresis
//!
//! Flap damping for link costs, in the style of OLSR link hysteresis.
//!
//! Each link gets an exponential moving average of its cost. The smoothed
//! status flips UP→DOWN when the average reaches `theta_up` and DOWN→UP when
//! it falls to `theta_down`; the gap between the two thresholds is the
//! hysteresis band. A hold-down timer additionally limits how often a single
//! link may flip.
//!
//! ## Coupling with routing
//!
//! `apply` writes the filtered cost and smoothed status back into the graph.
//! The filtered value becomes the link's current weight, so it is both the
//! input to the next `apply` and the cost routing sees after the next
//! recompute.
//!
//! ## Clock
//!
//! The controller never reads a clock. Callers pass `now_ms` from whatever
//! monotonic source they use, which keeps tests on a synthetic timeline.
//!
//! ## State lifetime
//!
//! Per-link state is created lazily on the first `apply` that sees the link
//! and is never pruned implicitly. Use [`HysteresisController::forget`] or
//! [`HysteresisController::retain_links`] when links go away.

use crate::graph::NetworkGraph;
use crate::primitives::{DEFAULT_ALPHA, DEFAULT_HOLD_MS, DEFAULT_THETA_DOWN, DEFAULT_THETA_UP};
use crate::{LinkKey, LinkStateError, LinkStatus, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Filter and threshold parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisConfig {
    /// EMA smoothing factor in (0, 1): weight given to the newest sample.
    pub alpha: f64,
    /// Filtered cost at or above which an UP link goes DOWN.
    pub theta_up: f64,
    /// Filtered cost at or below which a DOWN link comes back UP.
    pub theta_down: f64,
    /// Minimum milliseconds between two accepted flips of one link.
    pub hold_ms: u64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            theta_up: DEFAULT_THETA_UP,
            theta_down: DEFAULT_THETA_DOWN,
            hold_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl HysteresisConfig {
    /// Check that alpha is inside (0, 1) and that the thresholds form a band.
    ///
    /// The controller itself accepts any configuration; this is for callers
    /// that load parameters from outside.
    pub fn validate(&self) -> Result<(), LinkStateError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(LinkStateError::InvalidConfig(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !self.theta_up.is_finite() || !self.theta_down.is_finite() {
            return Err(LinkStateError::InvalidConfig(
                "thresholds must be finite".to_string(),
            ));
        }
        if self.theta_down >= self.theta_up {
            return Err(LinkStateError::InvalidConfig(format!(
                "theta_down ({}) must be below theta_up ({})",
                self.theta_down, self.theta_up
            )));
        }
        Ok(())
    }
}

// =============================================================================
// PER-LINK STATE
// =============================================================================

/// Filter state of one link, keyed by its canonical pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisState {
    /// Current EMA of the link cost.
    pub filtered: f64,
    /// Smoothed status.
    pub status: LinkStatus,
    /// Time of the last accepted flip; `None` until the first one.
    pub last_change_ms: Option<u64>,
}

impl HysteresisState {
    fn seeded(weight: f64) -> Self {
        Self {
            filtered: weight,
            status: LinkStatus::Up,
            last_change_ms: None,
        }
    }

    fn may_flip(&self, now_ms: u64, hold_ms: u64) -> bool {
        match self.last_change_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= hold_ms,
        }
    }
}

/// One accepted status flip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub link: LinkKey,
    pub from: LinkStatus,
    pub to: LinkStatus,
    pub filtered: f64,
    pub at_ms: u64,
}

/// What one `apply` pass did.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    pub now_ms: u64,
    pub dt_ms: u64,
    /// Links visited (every link in the graph).
    pub observed: usize,
    /// Links skipped because an operator forced them DOWN.
    pub manually_jammed: usize,
    pub transitions: Vec<StatusTransition>,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Owns per-link filter state and rewrites link weight/status on each pass.
#[derive(Debug, Clone, Default)]
pub struct HysteresisController {
    config: HysteresisConfig,
    states: BTreeMap<LinkKey, HysteresisState>,
}

impl HysteresisController {
    /// Create a controller. The configuration is not validated.
    #[must_use]
    pub fn new(config: HysteresisConfig) -> Self {
        Self {
            config,
            states: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Replace the parameters. Existing per-link state is kept.
    pub fn set_config(&mut self, config: HysteresisConfig) {
        self.config = config;
    }

    /// Run one filter pass over every link in `graph`.
    ///
    /// `dt_ms` is recorded in the report; the filter itself is sample-based
    /// and only uses `now_ms` for the hold-down gate.
    pub fn apply(&mut self, graph: &mut NetworkGraph, now_ms: u64, dt_ms: u64) -> ApplyReport {
        let config = self.config;
        let mut report = ApplyReport {
            now_ms,
            dt_ms,
            ..ApplyReport::default()
        };

        for link in graph.links_mut() {
            let key = link.key();
            let state = self
                .states
                .entry(key)
                .or_insert_with(|| HysteresisState::seeded(link.weight));
            report.observed += 1;

            // Operator override: mirror the last filtered cost, touch nothing else.
            if link.manually_jammed {
                link.weight = state.filtered;
                report.manually_jammed += 1;
                continue;
            }

            state.filtered = config.alpha * link.weight + (1.0 - config.alpha) * state.filtered;

            let crossed = match state.status {
                LinkStatus::Up if state.filtered >= config.theta_up => Some(LinkStatus::Down),
                LinkStatus::Down if state.filtered <= config.theta_down => Some(LinkStatus::Up),
                _ => None,
            };
            if let Some(to) = crossed.filter(|_| state.may_flip(now_ms, config.hold_ms)) {
                report.transitions.push(StatusTransition {
                    link: key,
                    from: state.status,
                    to,
                    filtered: state.filtered,
                    at_ms: now_ms,
                });
                state.status = to;
                state.last_change_ms = Some(now_ms);
            }

            link.status = state.status;
            link.weight = state.filtered;
        }

        report
    }

    /// Filter state of the link between `u` and `v`, in either orientation.
    #[must_use]
    pub fn state(&self, u: NodeId, v: NodeId) -> Option<&HysteresisState> {
        self.states.get(&LinkKey::new(u, v))
    }

    /// Drop the state of one link. `false` if none was tracked.
    pub fn forget(&mut self, u: NodeId, v: NodeId) -> bool {
        self.states.remove(&LinkKey::new(u, v)).is_some()
    }

    /// Drop state for links that no longer exist in `graph`; returns how many.
    pub fn retain_links(&mut self, graph: &NetworkGraph) -> usize {
        let before = self.states.len();
        self.states.retain(|key, _| graph.contains_link(*key));
        before - self.states.len()
    }

    /// Drop all per-link state.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    #[must_use]
    pub fn tracked_links(&self) -> usize {
        self.states.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
