//! Prompt System - Template loading and rendering
//!
//! Prompts are addressed by template id and rendered with a parameter map
//! using Handlebars. Built-in templates can be overridden from a directory.

mod loader;
mod render;

pub use loader::PromptLoader;
pub use render::{CHAIN_EXTRACT, CHAIN_TRANSFORM, PromptRenderer, REFLECT_CRITIQUE, ROUTE_CLASSIFY, params};
