// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Discovery state machine with typed phase transitions.
//!
//! One machine tracks a single discovery call:
//! Idle → LocatingFile → {Decoding → Done | Done | Probing} and
//! Idle → Probing → {Decoding → Done | Failed}.
//! Invalid transitions result in StateTransitionError.

use std::time::{Duration, Instant};

use crate::error::StateTransitionError;

/// Phases of one discovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// Nothing attempted yet.
    Idle,

    /// Reading the manifest file from the source directory.
    LocatingFile,

    /// Polling the introspection endpoint.
    Probing,

    /// Turning a manifest document into a backend.
    Decoding,

    /// Finished, with or without a backend.
    Done,

    /// Finished with an error.
    Failed,
}

impl DiscoveryPhase {
    /// Get the phase name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::LocatingFile => "LocatingFile",
            Self::Probing => "Probing",
            Self::Decoding => "Decoding",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check if transition to the target phase is valid.
    pub fn can_transition_to(&self, target: DiscoveryPhase) -> bool {
        matches!(
            (self, target),
            // From Idle
            (Self::Idle, Self::LocatingFile) |
            (Self::Idle, Self::Probing) |
            (Self::Idle, Self::Failed) |
            // From LocatingFile
            (Self::LocatingFile, Self::Decoding) |
            (Self::LocatingFile, Self::Probing) |
            (Self::LocatingFile, Self::Done) |
            (Self::LocatingFile, Self::Failed) |
            // From Probing
            (Self::Probing, Self::Decoding) |
            (Self::Probing, Self::Failed) |
            // From Decoding
            (Self::Decoding, Self::Done) |
            (Self::Decoding, Self::Failed)
        )
    }
}

impl std::fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one discovery call.
/// Records every phase visited so failures can be traced.
#[derive(Debug)]
pub struct DiscoveryStateMachine {
    current: DiscoveryPhase,
    started: Instant,
    history: Vec<DiscoveryPhase>,
}

impl DiscoveryStateMachine {
    pub fn new() -> Self {
        Self {
            current: DiscoveryPhase::Idle,
            started: Instant::now(),
            history: vec![DiscoveryPhase::Idle],
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> DiscoveryPhase {
        self.current
    }

    /// Phases visited so far, in order, starting with Idle.
    pub fn history(&self) -> &[DiscoveryPhase] {
        &self.history
    }

    /// Time since the machine was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Attempt to transition to a new phase.
    pub fn transition_to(&mut self, target: DiscoveryPhase) -> Result<(), StateTransitionError> {
        if self.current.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                state: self.current.name(),
            });
        }

        if !self.current.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.current.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            from = self.current.name(),
            to = target.name(),
            "Discovery phase transition"
        );

        self.current = target;
        self.history.push(target);

        Ok(())
    }

    /// Move to Failed from whatever non-terminal phase the error surfaced in.
    /// No-op when already terminal.
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            // Every non-terminal phase may move to Failed.
            let _ = self.transition_to(DiscoveryPhase::Failed);
        }
    }

    /// Visited phases joined with arrows, for logs.
    pub fn trace(&self) -> String {
        self.history
            .iter()
            .map(DiscoveryPhase::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for DiscoveryStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
