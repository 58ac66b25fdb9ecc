//! Runner module - bounded reflection over a generator and a critic.
//!
//! This module provides:
//! - RefinementLoop for repeated generate/critique rounds
//! - RefinementConfig for the iteration budget and satisfaction token
//! - `run`, a one-call entry point with the built-in critique prompt

mod refinement;

pub use refinement::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_SATISFACTION_TOKEN, RefinementConfig, RefinementLoop, run,
};
