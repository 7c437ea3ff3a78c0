//! Validation state machine
//!
//! ```text
//! [TRUSTED] ──invalid──→ [SUSPECT] ──count >= flag──→ [FLAGGED] ──count >= kick──→ [KICKED]
//!     ↑                     │  ↺ invalid (count += 1)      │                          │
//!     │                     └──────── count >= kick ───────┴──────────────────────────┘
//!     │                                                                               │
//!     └──────────────────────────── reset_validation_state ──────────────────────────┘
//! ```
//!
//! Failures are counted in a rolling window opened by the first failure. A
//! failure arriving more than `kick_time_window` after the window opened
//! starts a fresh window. Severity never decreases except through an
//! explicit reset; KICKED is terminal.

use crate::config::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-player validation lifecycle, ordered by severity
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ValidationState {
    #[default]
    Trusted,
    Suspect,
    Flagged,
    Kicked,
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationState::Kicked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Trusted => "trusted",
            ValidationState::Suspect => "suspect",
            ValidationState::Flagged => "flagged",
            ValidationState::Kicked => "kicked",
        }
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure counter for the rolling kick window
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureAccounting {
    pub failure_count: u32,
    /// When the current window opened
    pub first_failure_at: Option<f64>,
    pub last_failure_at: Option<f64>,
}

impl FailureAccounting {
    fn window_expired(&self, now: f64, window: f64) -> bool {
        self.first_failure_at
            .is_some_and(|first| now - first > window)
    }
}

/// Thresholds lifted from the configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscalationPolicy {
    pub flag_threshold: u32,
    pub kick_threshold: u32,
    pub kick_time_window: f64,
}

impl From<&ValidationConfig> for EscalationPolicy {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            flag_threshold: config.flag_threshold,
            kick_threshold: config.kick_threshold,
            kick_time_window: config.kick_time_window,
        }
    }
}

/// State change produced by one event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub previous: ValidationState,
    pub current: ValidationState,
    pub failure_count: u32,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    pub fn kicked(&self) -> bool {
        self.changed() && self.current.is_terminal()
    }
}

/// State machine instance for one player
#[derive(Clone, Debug, Default)]
pub struct PlayerValidation {
    state: ValidationState,
    accounting: FailureAccounting,
    successes: u64,
}

impl PlayerValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn accounting(&self) -> FailureAccounting {
        self.accounting
    }

    /// Verdicts the player has passed since the last reset
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Apply a consensus-invalid verdict at time `now`
    pub fn record_failure(&mut self, now: f64, policy: &EscalationPolicy) -> Transition {
        let previous = self.state;
        if previous.is_terminal() {
            return self.transition(previous);
        }

        if self.accounting.window_expired(now, policy.kick_time_window) {
            self.accounting = FailureAccounting::default();
        }
        if self.accounting.first_failure_at.is_none() {
            self.accounting.first_failure_at = Some(now);
        }
        self.accounting.failure_count += 1;
        self.accounting.last_failure_at = Some(now);

        let count = self.accounting.failure_count;
        let target = if count >= policy.kick_threshold {
            ValidationState::Kicked
        } else if count >= policy.flag_threshold {
            ValidationState::Flagged
        } else {
            ValidationState::Suspect
        };

        // Severity never drops outside an explicit reset
        self.state = previous.max(target);
        self.transition(previous)
    }

    /// Apply a consensus-valid verdict; expired windows are cleared
    pub fn record_success(&mut self, now: f64, policy: &EscalationPolicy) -> Transition {
        let previous = self.state;
        self.successes += 1;
        if self.accounting.window_expired(now, policy.kick_time_window) {
            self.accounting = FailureAccounting::default();
        }
        self.transition(previous)
    }

    /// Back to TRUSTED with a clean slate
    pub fn reset(&mut self) -> Transition {
        let previous = self.state;
        *self = Self::default();
        self.transition(previous)
    }

    fn transition(&self, previous: ValidationState) -> Transition {
        Transition {
            previous,
            current: self.state,
            failure_count: self.accounting.failure_count,
        }
    }
}
