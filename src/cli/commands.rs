//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and one subcommand per pattern:
//! - reflect: generate/critique loop until the critic is satisfied
//! - chain: two-step specification extraction
//! - route: classify a request and hand it to a handler
//! - fan-out: three prompts about one topic, run concurrently

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reflector - prompt-orchestration patterns over hosted LLMs
#[derive(Parser, Debug)]
#[command(name = "reflector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refine an artifact with a generator and a critic
    Reflect {
        /// What the generator should produce
        task: String,

        /// Maximum generate/critique rounds (overrides config)
        #[arg(short = 'n', long)]
        max_iterations: Option<u32>,

        /// Critique text that ends the loop (overrides config)
        #[arg(short, long)]
        sentinel: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract technical specifications from text and reshape them as JSON
    Chain {
        /// Free text describing a product
        text: String,

        /// Print the parsed JSON object only
        #[arg(long)]
        json: bool,
    },

    /// Route a request to the booking, info or fallback handler
    Route {
        /// The user request
        request: String,
    },

    /// Summarize, question and extract key terms for a topic in parallel
    FanOut {
        /// Topic to analyze
        topic: String,
    },
}
