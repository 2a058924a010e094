//! taf-launcher: Telegram Auto-Forwarder process launcher
//!
//! Entry point for every process role declared in the Procfile.
//!
//! Usage:
//!   taf-launcher            - Startup guard, then foreground bot hand-off
//!   taf-launcher web        - Keep-alive HTTP responder (web role)
//!   taf-launcher worker     - Direct bot worker launch
//!   taf-launcher release    - Pre-deploy environment check
//!   taf-launcher --help     - Show help

mod bootstrap;
mod release;
mod worker;

use taf_core::{Settings, WebTuning, WorkerClass};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Startup guard followed by the bot hand-off (default)
    Start,
    /// Keep-alive HTTP responder
    Web,
    /// Direct bot worker launch
    Worker,
    /// Pre-deploy environment check
    Release,
    /// Show help
    Help,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mode = parse_mode(&args);

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("taf-launcher {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    match mode {
        RunMode::Start => {
            let code = bootstrap::run(&settings)?;
            std::process::exit(code);
        }
        RunMode::Worker => {
            let code = worker::run(&settings)?;
            std::process::exit(code);
        }
        RunMode::Release => {
            release::run();
            Ok(())
        }
        RunMode::Web => {
            let flags = args.get(2..).unwrap_or(&[]);
            run_web(flags, settings)
        }
        RunMode::Help | RunMode::Version => Ok(()),
    }
}

/// Parse the subcommand into a run mode. Unknown input shows help.
fn parse_mode(args: &[String]) -> RunMode {
    match args.get(1).map(|s| s.as_str()) {
        None | Some("start") => RunMode::Start,
        Some("web") => RunMode::Web,
        Some("worker") => RunMode::Worker,
        Some("release") => RunMode::Release,
        Some("--version") | Some("-v") => RunMode::Version,
        Some(_) => RunMode::Help,
    }
}

/// Print help message
fn print_help() {
    println!("taf-launcher - Telegram Auto-Forwarder process launcher");
    println!();
    println!("Usage:");
    println!("  taf-launcher             Run the startup guard, then hand off to the bot");
    println!("  taf-launcher start       Same as the default mode");
    println!("  taf-launcher web         Start the keep-alive HTTP responder (web role)");
    println!("  taf-launcher worker      Launch the bot worker directly");
    println!("  taf-launcher release     Print the pre-deploy environment check");
    println!("  taf-launcher --help      Show this help message");
    println!("  taf-launcher --version   Show version");
    println!();
    println!("Environment Variables:");
    println!("  PORT                 Keep-alive HTTP port (default: 8080)");
    println!("  RAILWAY_ENVIRONMENT  Environment name shown in the banner (default: Local)");
    println!("  ENTRY_FILE           Bot entry file checked by the guard (default: main.py)");
    println!("  PYTHON_BIN           Interpreter used to launch the bot (default: python)");
    println!("  API_ID, API_HASH     Bot credentials; presence reported by `release`");
}

/// Run the keep-alive web role with optional tuning flag overrides.
fn run_web(flags: &[String], settings: Settings) -> anyhow::Result<()> {
    let (port, tuning) = apply_web_flags(flags, settings.port, settings.web)?;

    // threads-per-worker drives the runtime size; the web role is the
    // only async mode
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(tuning.threads)
        .enable_all()
        .build()?;
    runtime.block_on(taf_keepalive::start_server(port, &tuning))?;
    Ok(())
}

/// Parse prefork-style tuning flags over the configured defaults.
fn apply_web_flags(
    flags: &[String],
    mut port: u16,
    mut tuning: WebTuning,
) -> anyhow::Result<(u16, WebTuning)> {
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i].as_str();
        match flag {
            "--preload" => {
                tuning.preload = true;
                i += 1;
            }
            "--worker-class" => {
                let value = flag_value(flags, i, flag)?;
                if value != "sync" {
                    anyhow::bail!("unsupported worker class: {}", value);
                }
                tuning.worker_class = WorkerClass::Sync;
                i += 2;
            }
            "--port" => {
                port = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--workers" => {
                tuning.workers = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--threads" => {
                tuning.threads = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--timeout" => {
                tuning.timeout_secs = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--keep-alive" => {
                tuning.keep_alive_secs = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--max-requests" => {
                tuning.max_requests = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--max-requests-jitter" => {
                tuning.max_requests_jitter = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            "--backlog" => {
                tuning.backlog = flag_value(flags, i, flag)?.parse()?;
                i += 2;
            }
            _ => anyhow::bail!("unknown web flag: {}", flag),
        }
    }
    Ok((port, tuning))
}

fn flag_value<'a>(flags: &'a [String], i: usize, flag: &str) -> anyhow::Result<&'a str> {
    flags
        .get(i + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing value for {}", flag))
}
