//! Sequential prompt chaining.
//!
//! A chain is an ordered list of templated steps. Each step renders its
//! template against every parameter gathered so far, sends it to the
//! generator as a fresh single-message task, and stores the reply under its
//! output key for the steps that follow.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::ConversationHistory;
use crate::error::{ReflectorError, Result};
use crate::llm::TextGenerator;
use crate::prompt::{CHAIN_EXTRACT, CHAIN_TRANSFORM, PromptRenderer};

/// One templated call in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub template_id: String,
    pub output_key: String,
}

impl ChainStep {
    pub fn new(template_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            output_key: output_key.into(),
        }
    }
}

/// What a chain produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainOutput {
    /// Reply of the last step
    pub final_output: String,
    /// `(output_key, reply)` for every step, in order
    pub outputs: Vec<(String, String)>,
}

impl ChainOutput {
    /// Reply stored under a given output key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptChain {
    steps: Vec<ChainStep>,
}

impl PromptChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn then(mut self, template_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        self.steps.push(ChainStep::new(template_id, output_key));
        self
    }

    /// Two-step chain: pull technical specifications out of `text_input`,
    /// then turn them into a JSON object with `cpu`, `memory` and `storage`.
    pub fn spec_extraction() -> Self {
        Self::new().then(CHAIN_EXTRACT, "specifications").then(CHAIN_TRANSFORM, "json")
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order against one generator.
    pub async fn run<G>(
        &self,
        generator: &G,
        renderer: &PromptRenderer,
        initial: HashMap<String, String>,
    ) -> Result<ChainOutput>
    where
        G: TextGenerator + ?Sized,
    {
        if self.steps.is_empty() {
            return Err(ReflectorError::InvalidConfig("prompt chain has no steps".to_string()));
        }

        let mut params = initial;
        let mut outputs = Vec::with_capacity(self.steps.len());

        for (i, step) in self.steps.iter().enumerate() {
            let prompt = renderer.render(&step.template_id, &params)?;
            log::debug!("Chain step {} ({}) -> '{}'", i + 1, step.template_id, step.output_key);

            let reply = generator
                .generate(&ConversationHistory::with_task(prompt))
                .await
                .map_err(|source| ReflectorError::Step {
                    step: step.template_id.clone(),
                    source,
                })?;

            params.insert(step.output_key.clone(), reply.clone());
            outputs.push((step.output_key.clone(), reply));
        }

        let final_output = outputs.last().map(|(_, v)| v.clone()).unwrap_or_default();
        Ok(ChainOutput { final_output, outputs })
    }
}
