//! modhost — module host entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load host settings
//!   3. Resolve effective log level (CLI `-v` flags > env > settings)
//!   4. Init logger once
//!   5. Register built-in modules
//!   6. Start the application (load fragments, init, wire, post_init)
//!   7. Wait for Ctrl-C
//!   8. Stop every module

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

use modhost::error::AppError;
use modhost::modules::SystemModule;
use modhost::{Application, config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut settings = config::load(args.config_path.as_deref())?;
    if let Some(dir) = args.config_dir.as_deref() {
        settings.config_dir = config::expand_home(dir);
    }

    let effective_log_level = args.log_level.unwrap_or(settings.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level, args.log_file.as_deref())?;

    info!(
        name = %settings.name,
        config_dir = %settings.config_dir.display(),
        overlays = settings.overlay_dirs.len(),
        fragment_format = %settings.fragment_format,
        failure_policy = %settings.failure_policy,
        configured_log_level = %settings.log_level,
        effective_log_level = %effective_log_level,
        "settings loaded"
    );

    let shutdown = CancellationToken::new();

    // Ctrl-C handler — cancels the token so the host stops its modules.
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let mut app = Application::new(settings);
    app.register("system", SystemModule::new())?;

    if let Err(e) = app.start().await {
        // Modules that did come up still get their stop hook.
        let _ = app.stop().await;
        return Err(e);
    }

    info!(modules = ?app.module_names(), "host running — press Ctrl-C to stop");

    shutdown.cancelled().await;

    app.stop().await?;

    let _ = { use std::io::Write as _; std::io::stderr().flush() };

    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    config_dir: Option<String>,
    log_file: Option<PathBuf>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut config_dir = None;
    let mut log_file = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: modhost [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to host settings (default: modhost.toml)");
                println!("  -d, --config-dir <DIR>     Fragment directory (overrides settings and env)");
                println!("      --log-file <PATH>      Append logs to a file instead of stderr");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => config_path = Some(required_value(&mut iter, "-f/--config")),
            "-d" | "--config-dir" => config_dir = Some(required_value(&mut iter, "-d/--config-dir")),
            "--log-file" => log_file = Some(PathBuf::from(required_value(&mut iter, "--log-file"))),
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v picks a fixed tier, overriding settings and RUST_LOG:
    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug  (phase scheduling, per-hook spawns)
    //   -vvvv+  → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs {
        log_level,
        config_path,
        config_dir,
        log_file,
    }
}

fn required_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match iter.next() {
        Some(value) => value,
        None => {
            eprintln!("error: {flag} requires an argument");
            std::process::exit(1);
        }
    }
}
