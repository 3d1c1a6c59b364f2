use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fleetform_cloud::{Engine, Plan, StackState};
use fleetform_config::Project;
use fleetform_core::{ChangeSummary, OpType, StackRef, evaluate};
use random_number::{PROJECT_NAME, engine, program};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "random-number")]
#[command(about = "Declares a random integer between 1 and 100 and exports it", long_about = None)]
struct Cli {
    /// Stack name (defaults to the project's stack, then "dev")
    #[arg(short, long, env = "FLEETFORM_STACK", global = true)]
    stack: Option<String>,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes an update would make
    Preview,
    /// Create or update the stack's resources
    Up,
    /// Reconcile state with the providers
    Refresh,
    /// Delete every resource of the stack
    Destroy,
    /// Show exported values
    Output {
        /// Print a single export as a raw value
        key: Option<String>,
    },
    /// Print the raw stack state as JSON
    Export,
    /// Replace the stack state with a previously exported file
    Import {
        /// State file written by `export`
        file: PathBuf,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries exports and state, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("random-number {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let project = Project::discover_or_default(&cwd, PROJECT_NAME)?;
    let stack = StackRef::new(project.name(), project.resolve_stack(cli.stack.as_deref()))?;
    let engine = engine(stack.clone(), &project.state_dir());
    tracing::debug!(state_dir = %project.state_dir().display(), "Using stack {}", stack);

    match cli.command {
        Commands::Preview => {
            let deployment = evaluate(stack.clone(), program)?;
            let plan = engine.preview(&deployment).await?;
            print_plan(&stack, &plan);
        }
        Commands::Up => {
            let deployment = evaluate(stack.clone(), program)?;
            let plan = engine.preview(&deployment).await?;
            print_plan(&stack, &plan);
            let result = engine.up(&deployment).await?;
            println!();
            print_summary("Resources", &result.summary);
            print_outputs(&result.exports);
        }
        Commands::Refresh => {
            let summary = engine.refresh().await?;
            print_summary("Refreshed", &summary);
        }
        Commands::Destroy => {
            let summary = engine.destroy().await?;
            print_summary("Destroyed", &summary);
        }
        Commands::Output { key } => handle_output(&engine, key.as_deref()).await?,
        Commands::Export => {
            let state = engine.export_stack().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let state: StackState = serde_json::from_str(&content)?;
            let count = state.resources.len();
            engine.import_stack(state).await?;
            println!("{} {} resource(s) into {}", "✓ Imported".green(), count, stack);
        }
        // handled before project discovery
        Commands::Version => {}
    }

    Ok(())
}

async fn handle_output(engine: &Engine, key: Option<&str>) -> anyhow::Result<()> {
    let outputs = engine.outputs().await?;
    match key {
        Some(key) => {
            let value = outputs
                .get(key)
                .with_context(|| format!("no export named {}", key))?;
            match value {
                serde_json::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&outputs)?),
    }
    Ok(())
}

fn print_plan(stack: &StackRef, plan: &Plan) {
    println!("{} {}", "Previewing".bold(), stack.to_string().cyan());
    for action in &plan.actions {
        let line = action.describe();
        let line = match action.op {
            OpType::Create => format!("  + {}", line).green(),
            OpType::Update => format!("  ~ {}", line).yellow(),
            OpType::Replace => format!("  +- {}", line).yellow(),
            OpType::Delete => format!("  - {}", line).red(),
            OpType::Same => format!("    {}", line).dimmed(),
        };
        println!("{}", line);
    }
    print_summary("Plan", &plan.summary());
}

fn print_summary(label: &str, summary: &ChangeSummary) {
    if summary.is_empty() {
        println!("{}: {}", label.bold(), "no resources");
    } else {
        println!("{}: {}", label.bold(), summary);
    }
}

fn print_outputs(exports: &BTreeMap<String, serde_json::Value>) {
    if exports.is_empty() {
        return;
    }
    println!("{}", "Outputs:".bold());
    for (key, value) in exports {
        println!("  {}: {}", key.cyan(), value);
    }
}
