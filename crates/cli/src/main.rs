mod check_command;

use std::path::PathBuf;

use {
    anyhow::{Context, bail},
    chatbridge_config::BridgeConfig,
    chatbridge_relay::Relay,
    clap::{Parser, Subcommand},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "chatbridge",
    about = "Relay messages between a OneBot chat bot and a MultiChat hub",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./chatbridge.{toml,yaml,yml,json}, then the user
    /// config directory).
    #[arg(long, global = true, env = "CHATBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Print a Prometheus snapshot of the relay metrics on shutdown. Needs the
    /// `prometheus` feature, which default builds include.
    #[arg(long, global = true, default_value_t = false)]
    print_metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay (default when no subcommand is provided).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load(cli: &Cli) -> anyhow::Result<(PathBuf, BridgeConfig)> {
    match &cli.config {
        Some(path) => {
            let config = chatbridge_config::load_config(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok((path.clone(), config))
        },
        None => Ok(chatbridge_config::discover_and_load()?),
    }
}

/// Resolves on `quit` from stdin or Ctrl-C, whichever comes first.
async fn wait_for_stop() {
    let console = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim() == "quit" => return,
                Ok(Some(line)) if line.trim().is_empty() => {},
                Ok(Some(line)) => eprintln!("unknown command {:?}; type `quit` to stop", line.trim()),
                // No console attached: only the signal can stop us.
                Ok(None) | Err(_) => std::future::pending::<()>().await,
            }
        }
    };
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = console => info!("quit requested from console"),
        () = interrupt => info!("interrupt received"),
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let (path, config) = load(cli)?;
    let result = check_command::report(&path, &config);
    if result.has_errors() {
        bail!("configuration has errors, refusing to start");
    }

    let metrics = chatbridge_metrics::init_metrics(cli.print_metrics)?;
    let relay = Relay::start(&config);
    info!("relay running; type `quit` or press Ctrl-C to stop");

    wait_for_stop().await;
    relay.stop_all().await?;

    if cli.print_metrics {
        print!("{}", metrics.render());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "chatbridge starting");

    match cli.command {
        None | Some(Commands::Run) => run(&cli).await,
        Some(Commands::Check) => {
            let (path, config) = load(&cli)?;
            if check_command::report(&path, &config).has_errors() {
                std::process::exit(1);
            }
            Ok(())
        },
    }
}
