//! Phases of a refinement iteration.
//!
//! Each iteration moves `Generating -> Critiquing` and then either ends the
//! run (`Converged`, `Exhausted`) or goes around again via `Continue`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPhase {
    /// Waiting on the generator
    Generating,
    /// Waiting on the critic
    Critiquing,
    /// Critique contained the satisfaction token
    Converged,
    /// Critique was unsatisfied and budget remains
    Continue,
    /// Critique was unsatisfied on the last allowed iteration
    Exhausted,
}

impl LoopPhase {
    /// Returns true if the run stops in this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopPhase::Converged | LoopPhase::Exhausted)
    }

    /// Decide where an iteration goes after its critique.
    pub fn after_critique(satisfied: bool, iteration: u32, max_iterations: u32) -> Self {
        if satisfied {
            LoopPhase::Converged
        } else if iteration >= max_iterations {
            LoopPhase::Exhausted
        } else {
            LoopPhase::Continue
        }
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopPhase::Generating => "generating",
            LoopPhase::Critiquing => "critiquing",
            LoopPhase::Converged => "converged",
            LoopPhase::Continue => "continue",
            LoopPhase::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}
