//! Error types for Reflector
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in Reflector
#[derive(Debug, Error)]
pub enum ReflectorError {
    /// A precondition was violated before any LLM call was made
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The generator failed while producing or refining the artifact
    #[error("Generation failed on iteration {iteration}: {source}")]
    Generation {
        iteration: u32,
        #[source]
        source: LlmError,
    },

    /// The critic failed while evaluating the artifact
    #[error("Critique failed on iteration {iteration}: {source}")]
    Critique {
        iteration: u32,
        #[source]
        source: LlmError,
    },

    /// A chain, route or fan-out step failed
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: LlmError,
    },

    /// Classifier reply matched no route and no fallback is configured
    #[error("No route for classifier reply: {0}")]
    NoRoute(String),

    /// Template registration or rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Reply post-processing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// LLM error outside of a loop iteration
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReflectorError {
    /// Iteration the error happened on, if it came from the refinement loop
    pub fn iteration(&self) -> Option<u32> {
        match self {
            ReflectorError::Generation { iteration, .. } | ReflectorError::Critique { iteration, .. } => {
                Some(*iteration)
            }
            _ => None,
        }
    }
}

/// Result type alias for Reflector operations
pub type Result<T> = std::result::Result<T, ReflectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_error() {
        let err = ReflectorError::InvalidConfig("max_iterations must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: max_iterations must be at least 1");
    }

    #[test]
    fn test_generation_error() {
        let err = ReflectorError::Generation {
            iteration: 2,
            source: LlmError::InvalidResponse("empty body".to_string()),
        };
        assert_eq!(err.to_string(), "Generation failed on iteration 2: Invalid response: empty body");
        assert_eq!(err.iteration(), Some(2));
    }

    #[test]
    fn test_critique_error() {
        let err = ReflectorError::Critique {
            iteration: 1,
            source: LlmError::Exhausted,
        };
        assert!(err.to_string().starts_with("Critique failed on iteration 1"));
        assert_eq!(err.iteration(), Some(1));
    }

    #[test]
    fn test_step_error() {
        let err = ReflectorError::Step {
            step: "extract".to_string(),
            source: LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Step 'extract' failed: API error 500: boom");
        assert_eq!(err.iteration(), None);
    }

    #[test]
    fn test_no_route_error() {
        let err = ReflectorError::NoRoute("weather".to_string());
        assert_eq!(err.to_string(), "No route for classifier reply: weather");
    }

    #[test]
    fn test_llm_error_conversion() {
        let err: ReflectorError = LlmError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY".to_string(),
        }
        .into();
        assert!(matches!(err, ReflectorError::Llm(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReflectorError = io_err.into();
        assert!(matches!(err, ReflectorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ReflectorError = json_err.into();
        assert!(matches!(err, ReflectorError::Json(_)));
    }
}
