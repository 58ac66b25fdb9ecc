//! Per-iteration records and the final loop result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::ConversationHistory;

/// One generate-then-critique round.
///
/// Fields are private; records are built by the refinement loop and only
/// read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    index: u32,
    artifact: String,
    critique: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl IterationRecord {
    pub(crate) fn new(index: u32, artifact: impl Into<String>, critique: Option<String>) -> Self {
        Self {
            index,
            artifact: artifact.into(),
            critique,
            recorded_at: Utc::now(),
        }
    }

    /// 1-based iteration number
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn critique(&self) -> Option<&str> {
        self.critique.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Whether this record's critique contains the satisfaction token
    pub fn is_satisfied(&self, satisfaction_token: &str) -> bool {
        self.critique
            .as_deref()
            .is_some_and(|critique| critique.contains(satisfaction_token))
    }
}

/// Outcome of a refinement run.
///
/// `converged` is true exactly when the last critique contained the
/// satisfaction token, so fields are read-only outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopResult {
    final_artifact: String,
    converged: bool,
    iterations: Vec<IterationRecord>,
    history: ConversationHistory,
}

impl LoopResult {
    pub(crate) fn new(
        final_artifact: impl Into<String>,
        converged: bool,
        iterations: Vec<IterationRecord>,
        history: ConversationHistory,
    ) -> Self {
        Self {
            final_artifact: final_artifact.into(),
            converged,
            iterations,
            history,
        }
    }

    /// Artifact from the last iteration run
    pub fn final_artifact(&self) -> &str {
        &self.final_artifact
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Number of iterations actually run
    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// The critique of the final iteration
    pub fn last_critique(&self) -> Option<&str> {
        self.iterations.last().and_then(|r| r.critique())
    }
}
