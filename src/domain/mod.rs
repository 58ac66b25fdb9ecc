//! Domain types for Reflector
//!
//! This module contains the data a refinement run produces:
//! - ConversationHistory: append-only, role-tagged messages
//! - IterationRecord: one generate-then-critique round
//! - LoopResult: final artifact, convergence flag and audit trail
//! - LoopPhase: where an iteration is in its lifecycle

pub mod history;
pub mod iteration;
pub mod phase;

pub use history::{ConversationHistory, Message, Role};
pub use iteration::{IterationRecord, LoopResult};
pub use phase::LoopPhase;
