//! Refinement loop - bounded generate/critique iteration.
//!
//! Each iteration asks the generator for an artifact given the whole history,
//! then asks the critic to evaluate it. The run stops as soon as a critique
//! contains the satisfaction token, or after `max_iterations` rounds.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{ConversationHistory, IterationRecord, LoopPhase, LoopResult};
use crate::error::{ReflectorError, Result};
use crate::llm::TextGenerator;
use crate::prompt::{PromptRenderer, REFLECT_CRITIQUE};

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;
pub const DEFAULT_SATISFACTION_TOKEN: &str = "CODE_IS_PERFECT";

/// Settings for one refinement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementConfig {
    /// Upper bound on generate/critique rounds
    pub max_iterations: u32,
    /// Marker whose presence in a critique ends the run.
    ///
    /// Matching is a case-sensitive substring test, so a critique such as
    /// "this is NOT CODE_IS_PERFECT" also counts as converged.
    pub satisfaction_token: String,
    /// Template id of the evaluation instruction sent to the critic
    pub critique_template: String,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            satisfaction_token: DEFAULT_SATISFACTION_TOKEN.to_string(),
            critique_template: REFLECT_CRITIQUE.to_string(),
        }
    }
}

impl RefinementConfig {
    pub fn new(max_iterations: u32, satisfaction_token: impl Into<String>) -> Self {
        Self {
            max_iterations,
            satisfaction_token: satisfaction_token.into(),
            ..Default::default()
        }
    }

    /// Check the settings and the task before any call is made
    pub fn validate(&self, task: &str) -> Result<()> {
        if self.max_iterations < 1 {
            return Err(ReflectorError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.satisfaction_token.is_empty() {
            return Err(ReflectorError::InvalidConfig(
                "satisfaction_token must not be empty".to_string(),
            ));
        }
        if task.is_empty() {
            return Err(ReflectorError::InvalidConfig("task must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Drives a generator and a critic until the critic is satisfied or the
/// iteration budget runs out.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct RefinementLoop<G, C>
where
    G: TextGenerator + ?Sized,
    C: TextGenerator + ?Sized,
{
    generator: Arc<G>,
    critic: Arc<C>,
    renderer: PromptRenderer,
    config: RefinementConfig,
}

impl<G, C> RefinementLoop<G, C>
where
    G: TextGenerator + ?Sized,
    C: TextGenerator + ?Sized,
{
    /// Create a loop with default settings and built-in prompts
    pub fn new(generator: Arc<G>, critic: Arc<C>) -> Self {
        Self::with_config(generator, critic, PromptRenderer::new(), RefinementConfig::default())
    }

    pub fn with_config(generator: Arc<G>, critic: Arc<C>, renderer: PromptRenderer, config: RefinementConfig) -> Self {
        Self {
            generator,
            critic,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Run the loop for one task.
    pub async fn run(&self, task: &str) -> Result<LoopResult> {
        refine(
            task,
            self.generator.as_ref(),
            self.critic.as_ref(),
            &self.renderer,
            &self.config,
        )
        .await
    }
}

/// Run a refinement loop with the built-in critique prompt.
pub async fn run<G, C>(
    task: &str,
    max_iterations: u32,
    generator: &G,
    critic: &C,
    satisfaction_token: &str,
) -> Result<LoopResult>
where
    G: TextGenerator + ?Sized,
    C: TextGenerator + ?Sized,
{
    let config = RefinementConfig::new(max_iterations, satisfaction_token);
    refine(task, generator, critic, &PromptRenderer::new(), &config).await
}

async fn refine<G, C>(
    task: &str,
    generator: &G,
    critic: &C,
    renderer: &PromptRenderer,
    config: &RefinementConfig,
) -> Result<LoopResult>
where
    G: TextGenerator + ?Sized,
    C: TextGenerator + ?Sized,
{
    config.validate(task)?;

    let mut history = ConversationHistory::with_task(task);
    let mut iterations: Vec<IterationRecord> = Vec::new();
    let mut iteration: u32 = 0;

    loop {
        iteration += 1;

        tracing::debug!(iteration, phase = %LoopPhase::Generating, generator = generator.name(), "Generating");
        let artifact = generator
            .generate(&history)
            .await
            .map_err(|source| ReflectorError::Generation { iteration, source })?;
        history.push_generation(artifact.clone());

        tracing::debug!(iteration, phase = %LoopPhase::Critiquing, critic = critic.name(), "Critiquing");
        let instruction = critique_prompt(renderer, config, task, &artifact)?;
        let critique = critic
            .generate(&ConversationHistory::with_task(instruction))
            .await
            .map_err(|source| ReflectorError::Critique { iteration, source })?;

        let record = IterationRecord::new(iteration, artifact.clone(), Some(critique.clone()));
        let satisfied = record.is_satisfied(&config.satisfaction_token);
        iterations.push(record);

        let phase = LoopPhase::after_critique(satisfied, iteration, config.max_iterations);
        tracing::info!(iteration, phase = %phase, critique_len = critique.len(), "Iteration finished");

        // The satisfying critique ends the run and is not fed back
        if !satisfied {
            history.push_critique(critique);
        }

        if phase.is_terminal() {
            if !satisfied {
                log::info!(
                    "Refinement exhausted {} iterations without '{}'",
                    config.max_iterations,
                    config.satisfaction_token
                );
            }
            return Ok(LoopResult::new(artifact, satisfied, iterations, history));
        }
    }
}

fn critique_prompt(renderer: &PromptRenderer, config: &RefinementConfig, task: &str, artifact: &str) -> Result<String> {
    let params: HashMap<String, String> = [
        ("task", task),
        ("artifact", artifact),
        ("sentinel", config.satisfaction_token.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    renderer.render(&config.critique_template, &params)
}
