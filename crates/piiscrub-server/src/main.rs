//! piiscrub: PII sanitizer for tabular JSON data
//!
//! Usage:
//! ```bash
//! # Serve the HTTP API with a config file
//! piiscrub --config piiscrub.yaml
//!
//! # Or with environment variables (they override the config file)
//! PIISCRUB_HMAC_KEY=change-me piiscrub serve
//!
//! # Sanitize a file once and print the result
//! piiscrub sanitize --input rows.json --method mask --pretty
//! ```
//!
//! Test with:
//! ```bash
//! curl http://localhost:8080/api/sanitize \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "input_data": [{"email": "alice@example.com", "note": "Card 4111 1111 1111 1111"}],
//!     "query_params": {"method": "mask"}
//!   }'
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use piiscrub_pii::{Action, Sanitizer};
use piiscrub_server::{AppState, ServerConfig, router};
use serde_json::Value;
use std::io::Read;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// piiscrub - detect and transform personal data in table rows
#[derive(Parser)]
#[command(name = "piiscrub")]
#[command(about = "PII sanitizer for tabular JSON data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "PIISCRUB_CONFIG",
        global = true
    )]
    config: Option<String>,

    /// Force one action on every PII type (mask, tokenize, redact, scramble)
    #[arg(short, long, value_name = "ACTION", global = true)]
    method: Option<Action>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default if no command specified)
    Serve,
    /// Sanitize a JSON file and write the result to stdout
    Sanitize {
        /// JSON file holding an array of rows, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Include the audit trail in the output
        #[arg(long)]
        audit: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match cli.config.as_deref() {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    // Merge environment variables (they override config file)
    config.merge_env();

    init_tracing(&config.logging.level)?;
    if let Some(path) = cli.config.as_deref() {
        info!("📁 Loaded configuration from: {}", path);
    }

    match cli.command {
        Some(Commands::Sanitize {
            input,
            audit,
            pretty,
        }) => {
            let sanitizer = Sanitizer::new(config.policy, config.tokenization.secret);
            sanitize_once(&sanitizer, &input, cli.method, audit, pretty)
        }
        Some(Commands::Serve) | None => {
            if let Some(method) = cli.method {
                info!("Forcing '{}' on every request without a method", method);
                config.policy.per_request_override = Some(method);
            }
            serve(config).await
        }
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays JSON
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn sanitize_once(
    sanitizer: &Sanitizer,
    input: &str,
    method: Option<Action>,
    audit: bool,
    pretty: bool,
) -> anyhow::Result<()> {
    let contents = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?
    };

    let rows = match serde_json::from_str::<Value>(&contents).context("input is not valid JSON")? {
        Value::Array(rows) => rows,
        Value::Object(mut body) => match body.remove("input_data") {
            Some(Value::Array(rows)) => rows,
            Some(_) => bail!("input_data must be an array of rows"),
            None => vec![Value::Object(body)],
        },
        _ => bail!("input must be an array of rows"),
    };

    let output = sanitizer.sanitize(&rows, method, audit)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("🚀 Initializing piiscrub");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let sanitizer = Sanitizer::new(config.policy, config.tokenization.secret);
    if !sanitizer.has_secret() {
        if sanitizer.policy().may_tokenize() {
            warn!("⚠️  Policy tokenizes but no HMAC secret is set; requests will be rejected");
            warn!("   Set tokenization.secret or PIISCRUB_HMAC_KEY");
        } else {
            info!("No HMAC secret set; method=tokenize requests will be rejected");
        }
    }

    let state = AppState::new(sanitizer).with_audit_logging(config.logging.log_audit);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;

    info!("✅ piiscrub listening on http://{}", addr);
    info!("   - Sanitize:     http://{}/api/sanitize", addr);
    info!("   - Health check: http://{}/healthz", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
