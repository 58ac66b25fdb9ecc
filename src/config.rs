use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::AnthropicConfig;
use crate::prompt::REFLECT_CRITIQUE;
use crate::runner::{DEFAULT_MAX_ITERATIONS, DEFAULT_SATISFACTION_TOKEN, RefinementConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default env_logger filter when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub reflection: ReflectionConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout_ms: 300000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    pub max_iterations: u32,
    pub satisfaction_token: String,
    /// System prompt for the generator
    pub generator_system: String,
    /// System prompt for the critic
    pub critic_system: String,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            satisfaction_token: DEFAULT_SATISFACTION_TOKEN.to_string(),
            generator_system: "You are a careful software engineer. Write the requested code. \
When given review feedback, return a complete, refined version that addresses every point."
                .to_string(),
            critic_system: "You are a precise, demanding code reviewer.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory of `<template_id>.md` files overriding built-in prompts
    pub dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            reflection: ReflectionConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn anthropic_config(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            timeout: Duration::from_millis(self.llm.timeout_ms),
        }
    }

    pub fn refinement_config(&self) -> RefinementConfig {
        RefinementConfig {
            max_iterations: self.reflection.max_iterations,
            satisfaction_token: self.reflection.satisfaction_token.clone(),
            critique_template: REFLECT_CRITIQUE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.reflection.max_iterations, 3);
        assert_eq!(config.reflection.satisfaction_token, "CODE_IS_PERFECT");
        assert!(config.prompts.dir.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reflector.yml");
        fs::write(&path, "reflection:\n  max_iterations: 5\nllm:\n  model: claude-3-haiku-20240307\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.reflection.max_iterations, 5);
        assert_eq!(config.reflection.satisfaction_token, "CODE_IS_PERFECT");
        assert_eq!(config.llm.model, "claude-3-haiku-20240307");
        assert_eq!(config.llm.max_tokens, 4096);
    }

    #[test]
    fn test_log_level_from_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reflector.yml");
        fs::write(&path, "log_level: debug\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.reflection.max_iterations, 3);
    }

    #[test]
    fn test_explicit_path_missing_is_error() {
        let path = PathBuf::from("/no/such/reflector.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yml");
        fs::write(&path, "reflection: [not, a, map").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }

    #[test]
    fn test_anthropic_config_mapping() {
        let mut config = Config::default();
        config.llm.timeout_ms = 1500;
        config.llm.temperature = 0.5;

        let anthropic = config.anthropic_config();
        assert_eq!(anthropic.timeout, Duration::from_millis(1500));
        assert_eq!(anthropic.temperature, 0.5);
        assert_eq!(anthropic.model, config.llm.model);
    }

    #[test]
    fn test_refinement_config_mapping() {
        let mut config = Config::default();
        config.reflection.max_iterations = 7;
        config.reflection.satisfaction_token = "LGTM".to_string();

        let refinement = config.refinement_config();
        assert_eq!(refinement.max_iterations, 7);
        assert_eq!(refinement.satisfaction_token, "LGTM");
        assert_eq!(refinement.critique_template, REFLECT_CRITIQUE);
    }
}
