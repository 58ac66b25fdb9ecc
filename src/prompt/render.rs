//! Prompt Renderer - Render named templates with parameters using Handlebars
//!
//! Every prompt the crate sends is addressed by a template id. The built-in
//! set covers the reflection critique, the spec-extraction chain and the
//! router; files loaded through [`PromptLoader`] replace built-ins with the
//! same id.

use std::collections::HashMap;

use handlebars::Handlebars;

use super::loader::PromptLoader;
use crate::error::{ReflectorError, Result};

/// Evaluation instruction sent to the critic on every iteration
pub const REFLECT_CRITIQUE: &str = "reflect.critique";
/// Chain step 1: pull technical specifications out of free text
pub const CHAIN_EXTRACT: &str = "chain.extract";
/// Chain step 2: reshape specifications into JSON
pub const CHAIN_TRANSFORM: &str = "chain.transform";
/// Router classification prompt
pub const ROUTE_CLASSIFY: &str = "route.classify";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        REFLECT_CRITIQUE,
        "You are a senior software engineer and an expert in writing clean, correct code. \
Your role is to perform a meticulous code review.\n\
Critically evaluate the provided code against the original task requirements. \
Look for bugs, style issues, missing edge cases, and areas for improvement.\n\
If the code is perfect and meets all requirements, respond with the single phrase '{{sentinel}}'.\n\
Otherwise, provide a bulleted list of your critiques.\n\n\
Original Task:\n{{task}}\n\n\
Code to Review:\n{{artifact}}",
    ),
    (
        CHAIN_EXTRACT,
        "Extract the technical specifications from the following text:\n\n{{text_input}}",
    ),
    (
        CHAIN_TRANSFORM,
        "Transform the following specifications into a JSON object with 'cpu', 'memory', and 'storage' as keys:\n\n{{specifications}}",
    ),
    (
        ROUTE_CLASSIFY,
        "Analyze the user's request and determine which handler should process it.\n\
Reply with exactly one word, one of: {{labels}}.\n\
If the request does not clearly fit, reply '{{fallback}}'.\n\n\
Request:\n{{request}}",
    ),
];

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a renderer with the built-in templates registered
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        for (id, template) in BUILTIN_TEMPLATES {
            if let Err(e) = handlebars.register_template_string(id, *template) {
                log::error!("Built-in template '{}' failed to register: {}", id, e);
            }
        }

        Self { handlebars }
    }

    /// Create a renderer whose built-ins are overridden by files from `loader`
    pub fn with_overrides(loader: &PromptLoader) -> Result<Self> {
        let mut renderer = Self::new();
        for id in loader.list_available()? {
            let template = loader.load(&id)?;
            renderer.register_template(&id, &template)?;
            log::debug!("Registered prompt template '{}' from disk", id);
        }
        Ok(renderer)
    }

    /// Render a registered template by id
    pub fn render(&self, template_id: &str, params: &HashMap<String, String>) -> Result<String> {
        if !self.has_template(template_id) {
            return Err(ReflectorError::Template(format!("Unknown template id '{}'", template_id)));
        }
        self.handlebars
            .render(template_id, params)
            .map_err(|e| ReflectorError::Template(format!("Failed to render '{}': {}", template_id, e)))
    }

    /// Render an ad-hoc template string
    pub fn render_template(&self, template: &str, params: &HashMap<String, String>) -> Result<String> {
        self.handlebars
            .render_template(template, params)
            .map_err(|e| ReflectorError::Template(format!("Failed to render template: {}", e)))
    }

    /// Register (or replace) a named template
    pub fn register_template(&mut self, id: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(id, template)
            .map_err(|e| ReflectorError::Template(format!("Failed to register template '{}': {}", id, e)))
    }

    /// Check if a named template is registered
    pub fn has_template(&self, id: &str) -> bool {
        self.handlebars.get_template(id).is_some()
    }
}

/// Build a parameter map from string pairs
pub fn params<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let renderer = PromptRenderer::new();
        for id in [REFLECT_CRITIQUE, CHAIN_EXTRACT, CHAIN_TRANSFORM, ROUTE_CLASSIFY] {
            assert!(renderer.has_template(id), "missing {}", id);
        }
        assert!(!renderer.has_template("nonexistent"));
    }

    #[test]
    fn test_render_critique() {
        let renderer = PromptRenderer::new();
        let rendered = renderer
            .render(
                REFLECT_CRITIQUE,
                &params([
                    ("task", "Write factorial"),
                    ("artifact", "def factorial(n): ..."),
                    ("sentinel", "CODE_IS_PERFECT"),
                ]),
            )
            .unwrap();

        assert!(rendered.contains("Original Task:\nWrite factorial"));
        assert!(rendered.contains("def factorial(n): ..."));
        assert!(rendered.contains("'CODE_IS_PERFECT'"));
    }

    #[test]
    fn test_render_unknown_id() {
        let renderer = PromptRenderer::new();
        let result = renderer.render("nope", &HashMap::new());
        assert!(matches!(result, Err(ReflectorError::Template(_))));
    }

    #[test]
    fn test_render_missing_param_is_empty() {
        let renderer = PromptRenderer::new();
        let rendered = renderer.render(CHAIN_EXTRACT, &HashMap::new()).unwrap();
        assert!(rendered.ends_with("following text:\n\n"));
    }

    #[test]
    fn test_render_no_escape_html() {
        let renderer = PromptRenderer::new();
        let rendered = renderer
            .render_template("Code: {{code}}", &params([("code", "if a < b && c > d {}")]))
            .unwrap();
        assert_eq!(rendered, "Code: if a < b && c > d {}");
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut renderer = PromptRenderer::new();
        renderer.register_template(CHAIN_EXTRACT, "Specs please: {{text_input}}").unwrap();
        let rendered = renderer.render(CHAIN_EXTRACT, &params([("text_input", "x")])).unwrap();
        assert_eq!(rendered, "Specs please: x");
    }

    #[test]
    fn test_register_invalid_template() {
        let mut renderer = PromptRenderer::new();
        let result = renderer.register_template("broken", "{{#if}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_preserves_whitespace() {
        let renderer = PromptRenderer::new();
        let rendered = renderer.render_template("Line 1\n\nLine 3", &HashMap::new()).unwrap();
        assert_eq!(rendered, "Line 1\n\nLine 3");
    }
}
