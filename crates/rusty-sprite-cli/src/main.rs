use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use rusty_sprite_core::config::{Config, LoggingConfig};
use rusty_sprite_core::protocol::HostSessionStatus;
use rusty_sprite_relay::{ExecutionProxy, ProxySettings, bridge_script, serve_relay};
use rusty_sprite_scripts::Operation;
use rusty_sprite_tools::methods::{McpState, handle_message};
use rusty_sprite_tools::resources::ResourceStore;
use rusty_sprite_tools::{ToolRegistry, register_builtin_tools};

#[derive(Parser)]
#[command(
    name = "rusty-sprite",
    about = "MCP server that drives LibreSprite through generated scripts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay and serve MCP over stdio
    Serve {
        /// Relay port (default: 64823)
        #[arg(long)]
        port: Option<u16>,

        /// Relay bind address (default: 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the script generated for an operation, e.g. '{"op":"put_pixel","x":1,"y":2,"color":{"r":255,"g":0,"b":0,"a":255}}'
    Script {
        /// Operation as tagged JSON
        operation: String,
    },

    /// Print the script to load in LibreSprite so it polls this relay
    BridgeScript {
        /// Host session the editor serves (default: relay.default_session)
        #[arg(long)]
        session: Option<String>,

        /// Relay base URL (default: from relay.bind and relay.port)
        #[arg(long)]
        relay: Option<String>,
    },

    /// Query a running relay
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Check the configuration for problems
    Validate,
}

/// How long `serve` waits for the relay to drain after stdin closes.
const RELAY_DRAIN: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);

    let config = Config::load(&config_path)?;

    // stdout carries MCP frames while serving
    let serving = matches!(cli.command, Commands::Serve { .. });
    init_logging(config.logging.as_ref(), cli.verbose, serving);

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(&config, port, bind).await?,
        Commands::Script { operation } => {
            let op: Operation =
                serde_json::from_str(&operation).context("Invalid operation JSON")?;
            println!("{}", op.render());
        }
        Commands::BridgeScript { session, relay } => {
            let session = session.unwrap_or_else(|| config.default_session());
            let relay = relay.unwrap_or_else(|| relay_url(&config));
            println!("{}", bridge_script(&relay, &session));
        }
        Commands::Status => cmd_status(&config, &config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path.display());
                }
                println!("Config OK: {}", config_path.display());
            }
        },
    }

    Ok(())
}

fn init_logging(logging: Option<&LoggingConfig>, verbose: bool, serving: bool) {
    let level = if verbose {
        "debug"
    } else {
        logging.and_then(|l| l.level.as_deref()).unwrap_or("info")
    };

    let mut filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let mut rejected = Vec::new();
    for directive in logging.map(|l| l.filters.as_slice()).unwrap_or_default() {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => rejected.push(format!("{directive}: {e}")),
        }
    }

    let json = logging.is_some_and(|l| l.format == "json");
    let wants_stdout = logging.is_some_and(|l| l.output == "stdout");
    let to_stdout = wants_stdout && !serving;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match (json, to_stdout) {
        (true, true) => builder.json().with_writer(std::io::stdout).init(),
        (true, false) => builder.json().with_writer(std::io::stderr).init(),
        (false, true) => builder.with_writer(std::io::stdout).init(),
        (false, false) => builder.with_writer(std::io::stderr).init(),
    }

    for r in rejected {
        warn!("Ignoring invalid log filter {r}");
    }
    if wants_stdout && serving {
        warn!("Logging to stderr while serving; stdout is reserved for MCP");
    }
}

async fn cmd_serve(config: &Config, port: Option<u16>, bind: Option<String>) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for w in warnings {
        warn!("Config: {w}");
    }
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }

    let bind = bind.unwrap_or_else(|| config.relay_bind());
    let port = port.unwrap_or_else(|| config.relay_port());
    let addr = format!("{bind}:{port}");

    let proxy = Arc::new(ExecutionProxy::new(ProxySettings::from_config(config)));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind relay on {addr}"))?;
    info!("Relay listening on {addr}");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut relay = tokio::spawn(serve_relay(listener, proxy.clone(), async {
        let _ = stop_rx.await;
    }));

    let mut tools = ToolRegistry::new();
    register_builtin_tools(&mut tools);
    let resources = ResourceStore::new(config.resources_dir());
    let state = Arc::new(McpState::new(
        tools,
        resources,
        proxy,
        config.default_session(),
    ));

    info!(
        session = %state.default_session,
        tools = state.tools.list().len(),
        "Serving MCP on stdio"
    );

    tokio::select! {
        result = serve_stdio(state) => result?,
        result = &mut relay => {
            result??;
            anyhow::bail!("Relay stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    let _ = stop_tx.send(());
    // Parked host polls can hold connections open; don't wait them out.
    match tokio::time::timeout(RELAY_DRAIN, relay).await {
        Ok(Ok(Err(e))) => warn!("Relay exited with error: {e}"),
        Ok(Err(e)) => warn!("Relay task failed: {e}"),
        Ok(Ok(Ok(()))) | Err(_) => {}
    }
    Ok(())
}

/// Newline-delimited JSON-RPC over stdin/stdout. Each request runs on its
/// own task; a single writer keeps response lines whole.
async fn serve_stdio(state: Arc<McpState>) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(response) = handle_message(&state, &line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(text) => {
                    let _ = tx.send(text);
                }
                Err(e) => error!("Failed to serialize response: {e}"),
            }
        });
    }

    info!("stdin closed, finishing in-flight requests");
    drop(tx);
    writer.await??;
    Ok(())
}

/// Address local clients use to reach the relay.
fn relay_url(config: &Config) -> String {
    let bind = config.relay_bind();
    // A wildcard bind is reachable on loopback
    let host = if bind == "0.0.0.0" { "127.0.0.1".to_string() } else { bind };
    format!("http://{host}:{}", config.relay_port())
}

async fn cmd_status(config: &Config, config_path: &std::path::Path) -> anyhow::Result<()> {
    let url = format!("{}/health", relay_url(config));

    println!("Rusty Sprite v{}", env!("CARGO_PKG_VERSION"));
    println!("Config: {}", config_path.display());
    println!("Relay: {url}");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;
    let health: serde_json::Value = match client.get(&url).send().await {
        Ok(resp) => resp.error_for_status()?.json().await?,
        Err(e) => {
            println!("Status: not running ({e})");
            return Ok(());
        }
    };

    println!("Status: {}", health["status"].as_str().unwrap_or("unknown"));
    println!("Relay version: {}", health["version"].as_str().unwrap_or("?"));
    println!("Protocol: {}", health["protocol"]);
    println!(
        "Default session: {}",
        health["default_session"].as_str().unwrap_or("?")
    );

    let sessions: Vec<HostSessionStatus> =
        serde_json::from_value(health["sessions"].clone()).unwrap_or_default();
    if sessions.is_empty() {
        println!("Hosts: none have polled yet");
        return Ok(());
    }
    let now = chrono::Local::now();
    println!("Hosts:");
    for s in sessions {
        let seen = match s.last_poll_ms_ago {
            Some(ms) => {
                let at = now - chrono::Duration::milliseconds(ms as i64);
                format!("last poll {}", at.format("%H:%M:%S"))
            }
            None => "never polled".to_string(),
        };
        println!(
            "  {:<16} {:<12} {:<6} {seen}",
            s.session,
            if s.connected { "connected" } else { "stale" },
            if s.busy { "busy" } else { "idle" },
        );
    }

    Ok(())
}
