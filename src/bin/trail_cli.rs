//!
//! trail CLI binary
//! ----------------
//! Logs in with a bearer token (or a development token for a chosen role) and
//! works with races and applications through the command and query services.

use std::env;

use anyhow::{Context, Result};

use trail_client::cli::{parse_args, split_program, usage, CliApp, Command};
use trail_client::config::ClientConfig;

fn main() -> Result<()> {
    // Warnings by default so decode and transport failures are visible
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let argv: Vec<String> = env::args().collect();
    let (program, args) = split_program(&argv);

    let cmd = match parse_args(args) {
        Ok(Command::Help) => {
            println!("{}", usage(&program));
            return Ok(());
        }
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", usage(&program));
            std::process::exit(2);
        }
    };

    let cfg = ClientConfig::from_env().context("invalid client configuration")?;
    let app = CliApp::from_config(&cfg).context("failed to set up client")?;

    // Single-threaded: the client core assumes one cooperative event loop
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    match rt.block_on(app.run(cmd)) {
        Ok(out) => {
            println!("{}", out);
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {}", e.notice_text());
            tracing::debug!(target: "trail::cli", "command failed: {}", e);
            std::process::exit(1);
        }
    }
}
