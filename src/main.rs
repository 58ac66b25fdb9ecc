use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};
use reflector::config::Config;
use reflector::llm::{AnthropicGenerator, TextGenerator};
use reflector::patterns::{PromptChain, Router, extract_json, fan_out, topic_tasks};
use reflector::prompt::{PromptLoader, PromptRenderer, params};
use reflector::runner::RefinementLoop;

fn setup_logging(config: &Config) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reflector")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("reflector.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_renderer(config: &Config) -> Result<PromptRenderer> {
    match &config.prompts.dir {
        Some(dir) => {
            info!("Loading prompt overrides from {}", dir.display());
            PromptRenderer::with_overrides(&PromptLoader::new(dir))
                .context(format!("Failed to load prompts from {}", dir.display()))
        }
        None => Ok(PromptRenderer::new()),
    }
}

fn generator(name: &str, system: &str, config: &Config) -> Result<Arc<AnthropicGenerator>> {
    let generator = AnthropicGenerator::new(name, system, config.anthropic_config())
        .context(format!("Failed to create '{}' generator", name))?;
    Ok(Arc::new(generator))
}

/// Log token usage and estimated cost per generator
fn report_usage(generators: &[&AnthropicGenerator]) {
    for generator in generators {
        let usage = generator.total_usage();
        info!(
            "{} ({}): {} input + {} output tokens, ~${:.4}",
            generator.name(),
            generator.model(),
            usage.input_tokens,
            usage.output_tokens,
            usage.cost_usd(generator.model())
        );
    }
}

async fn handle_reflect(
    task: &str,
    max_iterations: Option<u32>,
    sentinel: Option<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let mut refinement_config = config.refinement_config();
    if let Some(n) = max_iterations {
        refinement_config.max_iterations = n;
    }
    if let Some(token) = sentinel {
        refinement_config.satisfaction_token = token;
    }
    info!(
        "Reflecting on task with max_iterations={} sentinel={}",
        refinement_config.max_iterations, refinement_config.satisfaction_token
    );

    let producer = generator("generator", &config.reflection.generator_system, config)?;
    let critic = generator("critic", &config.reflection.critic_system, config)?;
    let refinement = RefinementLoop::with_config(
        producer.clone(),
        critic.clone(),
        build_renderer(config)?,
        refinement_config,
    );

    let result = refinement.run(task).await.context("Refinement failed")?;
    report_usage(&[producer.as_ref(), critic.as_ref()]);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for record in result.iterations() {
        println!("{} {}", "Iteration".cyan(), record.index());
        println!("{}", record.artifact());
        if let Some(critique) = record.critique() {
            println!("{}\n{}\n", "Critique:".yellow(), critique);
        }
    }

    if result.converged() {
        println!("{} after {} iteration(s)", "Converged".green(), result.iteration_count());
    } else {
        println!("{} after {} iteration(s)", "Not converged".red(), result.iteration_count());
    }
    println!("\n{}\n{}", "Final artifact:".green(), result.final_artifact());
    Ok(())
}

async fn handle_chain(text: &str, json: bool, config: &Config) -> Result<()> {
    info!("Running specification extraction chain");
    let llm = generator("chain", "", config)?;
    let renderer = build_renderer(config)?;

    let output = PromptChain::spec_extraction()
        .run(llm.as_ref(), &renderer, params([("text_input", text)]))
        .await
        .context("Chain failed")?;
    report_usage(&[llm.as_ref()]);

    if json {
        let value = extract_json(&output.final_output).context("Chain output was not JSON")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for (key, value) in &output.outputs {
            println!("{}\n{}\n", format!("{}:", key).cyan(), value);
        }
    }
    Ok(())
}

async fn handle_route(request: &str, config: &Config) -> Result<()> {
    info!("Routing request");
    let router = Router::new(generator(
        "classifier",
        "You are a request router. Reply with a single route name.",
        config,
    )?)
    .route(
        "booking",
        generator(
            "booking",
            "You are a booking agent. Confirm the requested flight or hotel booking concisely.",
            config,
        )?,
    )
    .route(
        "info",
        generator("info", "You answer general questions concisely and accurately.", config)?,
    )
    .fallback(
        "unclear",
        generator(
            "unclear",
            "The request was ambiguous. Ask the user one short clarifying question.",
            config,
        )?,
    );

    let decision = router
        .dispatch(request, &build_renderer(config)?)
        .await
        .context("Routing failed")?;

    println!("{} {}", "Route:".cyan(), decision.label);
    println!("{}", decision.output);
    Ok(())
}

async fn handle_fan_out(topic: &str, config: &Config) -> Result<()> {
    info!("Fanning out topic analysis");
    let llm = generator("fan-out", "", config)?;
    let results = fan_out(llm.as_ref(), &topic_tasks(topic))
        .await
        .context("Fan-out failed")?;

    for result in results {
        println!("{}\n{}\n", format!("{}:", result.name).cyan(), result.output);
    }
    Ok(())
}

async fn run_application(cli: Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        Commands::Reflect {
            task,
            max_iterations,
            sentinel,
            json,
        } => handle_reflect(&task, max_iterations, sentinel, json, config).await,
        Commands::Chain { text, json } => handle_chain(&text, json, config).await,
        Commands::Route { request } => handle_route(&request, config).await,
        Commands::FanOut { topic } => handle_fan_out(&topic, config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(cli, &config).await.context("Application failed")?;

    Ok(())
}
