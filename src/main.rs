//! TunFin client shell.
//!
//! # Usage
//!
//! ```bash
//! # interactive
//! tunfin --api-base http://127.0.0.1:8080
//!
//! # one command, JSON output, nothing persisted
//! tunfin --ephemeral --output json --command "login +21620000000 secret"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tunfin::app::App;
use tunfin::cli::{Shell, Step};
use tunfin::config::{ClientConfig, OutputMode};

/// TunFin banking client
#[derive(Parser, Debug)]
#[command(name = "tunfin")]
#[command(about = "TunFin consumer banking client")]
#[command(version)]
struct Args {
    /// Gateway base URL (overrides TUNFIN_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Directory holding the persisted session (overrides TUNFIN_STATE_DIR)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Request timeout in milliseconds, 0 for none (overrides TUNFIN_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format: table or json (overrides TUNFIN_OUTPUT)
    #[arg(long)]
    output: Option<String>,

    /// Keep the session in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Run a single command and exit
    #[arg(short, long)]
    command: Option<String>,

    /// View to open when the shell starts
    #[arg(long, default_value = "/")]
    start: String,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // logs go to stderr so command output stays clean on stdout
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut config = ClientConfig::from_env();
    if let Some(base) = args.api_base.clone() {
        config.api_base = base;
    }
    if let Some(dir) = args.state_dir.clone() {
        config.state_dir = dir;
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout = if ms == 0 { None } else { Some(Duration::from_millis(ms)) };
    }
    if let Some(out) = args.output.as_deref() {
        config.output = OutputMode::parse(out).with_context(|| format!("unknown output format '{}'", out))?;
    }
    config.ephemeral = args.ephemeral;

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "tunfin",
        "TunFin client starting: RUST_LOG='{}', api_base='{}', state_dir='{}', timeout_ms={}, output={:?}, ephemeral={}",
        rust_log,
        config.api_base,
        config.state_dir.display(),
        config.timeout.map(|t| t.as_millis().to_string()).unwrap_or_else(|| "none".to_string()),
        config.output,
        config.ephemeral
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let app = App::new(&config).context("Failed to initialise client")?;
    let mut shell = Shell::new(app, config.output);

    if let Some(cmd) = args.command.as_deref() {
        return match rt.block_on(shell.run_line(cmd)) {
            Ok(Step::Output(s)) => {
                if !s.is_empty() {
                    println!("{}", s);
                }
                Ok(())
            }
            Ok(Step::Quit) => Ok(()),
            Err(e) => {
                eprintln!("error: {}", e.message());
                std::process::exit(1);
            }
        };
    }

    run_repl(&rt, shell, &args.start)
}

/// Lines that carry a password never enter the history.
fn keep_in_history(line: &str) -> bool {
    let head = line.split_whitespace().next().unwrap_or("").to_ascii_lowercase();
    !matches!(head.as_str(), "login" | "register")
}

fn run_repl(rt: &tokio::runtime::Runtime, mut shell: Shell, start: &str) -> Result<()> {
    let mut rl = rustyline::DefaultEditor::new().context("Failed to start line editor")?;
    println!("tunfin shell. Type 'help' for commands.");
    match rt.block_on(shell.run_line(&format!("go {}", start))) {
        Ok(Step::Output(s)) if !s.is_empty() => println!("{}", s),
        Ok(_) => {}
        Err(e) => eprintln!("error: {}", e.message()),
    }
    loop {
        let prompt = format!("tunfin {}> ", shell.location());
        match rl.readline(&prompt) {
            Ok(line) => {
                if keep_in_history(&line) && !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match rt.block_on(shell.run_line(&line)) {
                    Ok(Step::Quit) => break,
                    Ok(Step::Output(s)) => {
                        if !s.is_empty() {
                            println!("{}", s);
                        }
                    }
                    Err(e) => eprintln!("error: {}", e.message()),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("reading input"),
        }
    }
    Ok(())
}
