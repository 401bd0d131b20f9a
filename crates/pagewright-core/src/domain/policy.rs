//! Per-step failure policy for external calls.
//!
//! Each external step is tagged `Fatal` or `Tolerated`. Applying the policy
//! to a step's result either propagates the error or records it and moves on.

use std::fmt::Display;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure aborts the caller.
    Fatal,
    /// Failure is logged and the caller continues.
    Tolerated,
}

/// Result of a step that was allowed to run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Done(T),
    /// The step failed under `StepPolicy::Tolerated`; carries the error text.
    Tolerated(String),
}

impl<T> StepOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            StepOutcome::Done(value) => Some(value),
            StepOutcome::Tolerated(_) => None,
        }
    }
}

impl StepPolicy {
    pub fn apply<T, E: Display>(
        self,
        step: &'static str,
        result: Result<T, E>,
    ) -> Result<StepOutcome<T>, E> {
        match (self, result) {
            (_, Ok(value)) => Ok(StepOutcome::Done(value)),
            (StepPolicy::Fatal, Err(err)) => Err(err),
            (StepPolicy::Tolerated, Err(err)) => {
                warn!(step, error = %err, "tolerated step failure");
                Ok(StepOutcome::Tolerated(err.to_string()))
            }
        }
    }
}
