use anyhow::Result;
use clap::{Parser, Subcommand};
use legocore::{ComponentCategory, ExecutionEvent};
use legoruntime::{load_flow, ExecutionMode, FlowRuntime, RuntimeConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lego")]
#[command(about = "LEGO Flow Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a flow file
    Run {
        /// Path to flow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Run independent steps concurrently
        #[arg(short, long)]
        concurrent: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a flow file
    Validate {
        /// Path to flow JSON file
        file: PathBuf,
    },

    /// List available components
    Components {
        /// Only show this category (auth, data, payment, ...)
        #[arg(long)]
        category: Option<ComponentCategory>,

        /// Filter by name, description or tag
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List registered API providers
    Providers,

    /// Create a flow file from a template
    Init {
        /// Output file path
        #[arg(short, long, default_value = "flow.json")]
        output: PathBuf,

        /// traffic-fine, company-verification or document-signing
        #[arg(short, long, default_value = "traffic-fine")]
        template: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            concurrent,
            verbose,
        } => {
            let default_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .init();

            let mode = if concurrent {
                ExecutionMode::Concurrent
            } else {
                ExecutionMode::Sequential
            };
            run_flow(file, mode).await?;
        }

        Commands::Validate { file } => {
            validate_flow(file)?;
        }

        Commands::Components { category, search } => {
            list_components(category, search);
        }

        Commands::Providers => {
            list_providers()?;
        }

        Commands::Init { output, template } => {
            create_example_flow(&template, output)?;
        }
    }

    Ok(())
}

fn build_runtime(config: RuntimeConfig) -> Result<FlowRuntime> {
    let components = legoproviders::default_component_registry();
    let providers = legoproviders::default_provider_registry()?;
    Ok(FlowRuntime::new(
        Arc::new(components),
        Arc::new(providers),
        config,
    ))
}

async fn run_flow(file: PathBuf, mode: ExecutionMode) -> Result<()> {
    println!("🚀 Loading flow from: {}", file.display());

    let flow = load_flow(&file)?;

    println!("📋 Flow: {}", flow.name);
    println!("   Steps: {}", flow.steps.len());
    println!("   Connections: {}", flow.connections.len());
    println!();

    let runtime = build_runtime(RuntimeConfig {
        execution_mode: mode,
        ..RuntimeConfig::default()
    })?;

    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::FlowStarted { step_count, .. } => {
                    println!("▶️  Flow started ({} steps)", step_count);
                }
                ExecutionEvent::StepStarted {
                    step_id,
                    component_id,
                    ..
                } => {
                    println!("  ⚡ Starting step: {} ({})", step_id, component_id);
                }
                ExecutionEvent::StepCompleted {
                    step_id,
                    duration_ms,
                    ..
                } => {
                    println!("  ✅ Step {} completed in {}ms", step_id, duration_ms);
                }
                ExecutionEvent::StepFailed { step_id, error, .. } => {
                    println!("  ❌ Step {} failed: {}", step_id, error);
                }
                ExecutionEvent::Warning {
                    step_id, message, ..
                } => match step_id {
                    Some(step_id) => println!("     ⚠️  [{}] {}", step_id, message),
                    None => println!("     ⚠️  {}", message),
                },
                ExecutionEvent::FlowCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Flow completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Flow failed after {}ms", duration_ms);
                    }
                }
            }
        }
    });

    let result = runtime.execute(flow).await;

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id);
    println!("   Time: {}ms", result.execution_time_ms);
    println!();
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(error) = result.error {
        anyhow::bail!(error);
    }

    Ok(())
}

fn validate_flow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating flow: {}", file.display());

    let flow = load_flow(&file)?;
    let runtime = build_runtime(RuntimeConfig::default())?;
    let order = runtime.validate(&flow)?;

    println!("✅ Flow is valid:");
    println!("   Name: {}", flow.name);
    println!("   Steps: {}", flow.steps.len());
    println!("   Connections: {}", flow.connections.len());
    println!("   Order: {}", order.join(" → "));

    Ok(())
}

fn list_components(category: Option<ComponentCategory>, search: Option<String>) {
    println!("📦 Available Components:");
    println!();

    let registry = legoproviders::default_component_registry();
    let components = match &search {
        Some(query) => registry.search(query),
        None => registry.all(),
    };

    for component in components
        .iter()
        .filter(|c| category.map_or(true, |category| c.category == category))
    {
        match &component.api_provider {
            Some(provider) => println!("  • {} ({:?}, {})", component.id, component.category, provider),
            None => println!("  • {} ({:?})", component.id, component.category),
        }
        println!("    {}", component.description);
        let required: Vec<_> = component.required_props().collect();
        if !required.is_empty() {
            println!("    required: {}", required.join(", "));
        }
    }
}

fn list_providers() -> Result<()> {
    println!("🔌 Registered API Providers:");
    println!();

    let registry = legoproviders::default_provider_registry()?;
    for provider in registry.all() {
        println!("  • {} → {}", provider.name(), provider.base_url());
    }

    Ok(())
}

fn create_example_flow(template: &str, output: PathBuf) -> Result<()> {
    let Some(flow) = legoproviders::example_flow(template) else {
        anyhow::bail!(
            "Unknown template '{}'. Available: {}",
            template,
            legoproviders::TEMPLATE_NAMES.join(", ")
        );
    };

    let json = serde_json::to_string_pretty(&flow)?;
    std::fs::write(&output, json)?;

    println!("✨ Created {} flow: {}", flow.name, output.display());
    println!();
    println!("Run it with:");
    println!("  lego run --file {}", output.display());

    Ok(())
}
