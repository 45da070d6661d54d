//! debian-preflight CLI entry point
//!
//! Pre-installation validation for the Debian desktop installer.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use debian_preflight::cli::args::{Args, Command, OutputFormat};
use debian_preflight::cli::output::{exit_code, format_check_list, format_progress, get_formatter};
use debian_preflight::version::get_build_info;
use debian_preflight::{build_orchestrator, DetectorPorts, PreflightConfig, Runner};

const EXIT_RUNTIME_ERROR: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_RUNTIME_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(&args);

    match args.subcommand() {
        Command::Version => {
            println!("{}", get_build_info());
            ExitCode::SUCCESS
        }
        Command::List => {
            println!("{}", format_check_list());
            ExitCode::SUCCESS
        }
        Command::Check => match run_checks(&args).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(EXIT_RUNTIME_ERROR)
            }
        },
    }
}

/// Log to stderr so stdout carries only the report.
fn init_tracing(args: &Args) {
    let filter = if args.verbose {
        EnvFilter::new(args.log_directive())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_directive()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_checks(args: &Args) -> anyhow::Result<ExitCode> {
    let mut config =
        PreflightConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply_to(&mut config);
    debug!(?config, "configuration loaded");

    let ports = DetectorPorts::host(&config);
    let runner = Arc::new(Runner::new(
        build_orchestrator(&config, &ports),
        config.progress_capacity,
    ));
    let mut progress = runner
        .progress()
        .context("progress channel already taken")?;

    let ctx = CancellationToken::new();
    let watchdog = spawn_watchdog(ctx.clone(), Duration::from_millis(config.timeout_ms));

    let show_progress = args.format == OutputFormat::Text && !args.quiet;
    let color = args.use_color();
    let display = tokio::spawn(async move {
        while let Some(update) = progress.recv().await {
            if show_progress {
                eprintln!("{}", format_progress(&update, color));
            }
        }
    });

    runner.run(&ctx).await?;
    display.await.context("progress display task failed")?;
    watchdog.abort();

    let snapshot = runner.session().snapshot();
    let formatter = get_formatter(args.format, color, args.verbose, args.quiet);
    println!("{}", formatter.format(&snapshot));

    Ok(ExitCode::from(exit_code(snapshot.overall_result)))
}

/// Cancel `ctx` when the deadline passes or the user presses Ctrl-C.
fn spawn_watchdog(ctx: CancellationToken, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctx.cancelled() => return,
            _ = tokio::time::sleep(deadline) => {
                warn!(timeout_ms = deadline.as_millis() as u64, "deadline reached, cancelling remaining checks");
            }
            _ = interrupted => {
                warn!("interrupted, cancelling remaining checks");
            }
        }
        ctx.cancel();
    })
}
