mod config_commands;
mod store_commands;

use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    chmask_algorithms::Request,
    chmask_config::{ChMaskConfig, data_dir, discover_and_load, set_config_dir},
    chmask_host::{
        ChannelMaskService, Outcome, build_host, build_service,
        validate::check_decision,
        wire::{decision_to_json, parse_decision, request_from_value, request_to_json},
    },
    clap::{Parser, Subcommand},
    serde::Serialize,
    serde_json::Value,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chmask", about = "chmask: LoRaWAN channel-mask algorithm host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding chmask.{toml,yaml,json}.
    #[arg(long, global = true, env = "CHMASK_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered channel-mask algorithms.
    Algorithms,
    /// Decide the channel mask for one request, or an array of requests.
    Decide {
        /// JSON file with the request(s).
        #[arg(long)]
        request: PathBuf,
        /// Algorithm id; defaults to `network.chmask_algorithm`.
        #[arg(long)]
        algorithm: Option<String>,
    },
    /// Check a decision produced elsewhere against its request.
    Check {
        #[arg(long)]
        request: PathBuf,
        /// JSON file with an array of channel indices.
        #[arg(long)]
        decision: PathBuf,
    },
    /// Print the channel indices available to a device.
    Channels {
        #[arg(long)]
        request: PathBuf,
    },
    /// Validate a request and print it in canonical form.
    Normalize {
        #[arg(long)]
        request: PathBuf,
    },
    /// Manage per-device channel-mask overrides.
    Store {
        #[command(subcommand)]
        action: store_commands::StoreAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // stdout carries command output, so logs go to stderr.
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn read_request(path: &Path) -> Result<Request> {
    match read_json(path).await? {
        Value::Array(items) => {
            anyhow::bail!("{} holds {} requests, expected one", path.display(), items.len())
        },
        value => Ok(request_from_value(value)?),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn service(config: &ChMaskConfig) -> Result<ChannelMaskService> {
    build_service(config, &data_dir()).await
}

fn algorithms(config: &ChMaskConfig) {
    let host = build_host(&config.network);
    for info in host.algorithms() {
        let marker = if info.id == config.network.chmask_algorithm {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<20} {}", info.id, info.name);
    }
}

/// One element of a batch answer.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchEntry {
    Decided(Outcome),
    Rejected { index: usize, error: String },
}

/// Evaluate every valid request of a batch. Invalid ones are reported in
/// place and do not stop the others.
async fn decide_batch(
    svc: &ChannelMaskService,
    items: Vec<Value>,
    algorithm: Option<&str>,
) -> Vec<BatchEntry> {
    let parsed: Vec<_> = items.into_iter().map(request_from_value).collect();
    let jobs = parsed
        .iter()
        .flatten()
        .map(|req| (algorithm.map(str::to_string), req.clone()))
        .collect();
    let mut outcomes = svc.evaluate_many(jobs).await.into_iter();

    parsed
        .into_iter()
        .enumerate()
        .filter_map(|(index, parsed)| match parsed {
            Ok(_) => outcomes.next().map(BatchEntry::Decided),
            Err(e) => {
                warn!(index, error = %e, "skipping invalid request");
                Some(BatchEntry::Rejected {
                    index,
                    error: e.to_string(),
                })
            },
        })
        .collect()
}

/// An array in gives an array out, a single request gives a single outcome.
async fn decide_value(
    svc: &ChannelMaskService,
    input: Value,
    algorithm: Option<&str>,
) -> Result<Value> {
    let output = match input {
        Value::Array(items) => serde_json::to_value(decide_batch(svc, items, algorithm).await)?,
        single => {
            let req = request_from_value(single)?;
            serde_json::to_value(svc.evaluate(algorithm, req).await)?
        },
    };
    Ok(output)
}

async fn decide(config: &ChMaskConfig, request: &Path, algorithm: Option<String>) -> Result<()> {
    let input = read_json(request).await?;
    let svc = service(config).await?;
    print_json(&decide_value(&svc, input, algorithm.as_deref()).await?)
}

async fn check(request: &Path, decision: &Path) -> Result<()> {
    let req = read_request(request).await?;
    let indices = parse_decision("external", &read_json(decision).await?)?;
    let mask = check_decision("external", &req, indices)?;
    print_json(&decision_to_json(&mask))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(dir) = cli.config_dir.clone() {
        set_config_dir(dir);
    }
    let config = discover_and_load();

    info!(version = env!("CARGO_PKG_VERSION"), "chmask starting");

    match cli.command {
        Commands::Algorithms => {
            algorithms(&config);
            Ok(())
        },
        Commands::Decide { request, algorithm } => decide(&config, &request, algorithm).await,
        Commands::Check { request, decision } => check(&request, &decision).await,
        Commands::Channels { request } => {
            let req = read_request(&request).await?;
            print_json(&req.available_channel_indices())
        },
        Commands::Normalize { request } => {
            let req = read_request(&request).await?;
            println!("{}", request_to_json(&req)?);
            Ok(())
        },
        Commands::Store { action } => {
            let svc = service(&config).await?;
            store_commands::handle_store(action, svc.store()).await
        },
        Commands::Config { action } => config_commands::handle_config(action, &config),
    }
}
