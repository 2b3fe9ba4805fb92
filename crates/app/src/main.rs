//! Nimbus - weather lookups through a shared cache pool
//!
//! Main entry point for the command-line application.

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use nimbus_app::render::{render_lookup, render_stats};
use nimbus_app::{AppContext, Cli};
use nimbus_domain::{Config, Result as DomainResult, WeatherLookup};
use nimbus_infra::{config, init_tracing};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} lookup(s) failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the CLI; returns the number of failed lookups
async fn run(cli: Cli) -> anyhow::Result<usize> {
    // Load .env before reading configuration from the environment
    let dotenv = dotenvy::dotenv();

    let config = load_config(&cli)?;
    init_tracing(&config.logging).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env loaded"),
    }

    let ctx = AppContext::new_with_config(config).await.context("failed to start nimbus")?;

    let failed = if cli.interactive {
        interactive(&ctx, &cli).await
    } else {
        let mut failed = 0;
        for location in cli.queries() {
            let result = ctx.weather.get_weather(location, cli.refresh).await;
            let label = location.unwrap_or(ctx.weather.default_location());
            failed += usize::from(!print_result(label, result, &cli));
        }
        failed
    };

    if cli.stats {
        println!("\n{}", render_stats(&ctx.pool.stats(), &ctx.pool.health()));
    }

    ctx.shutdown().await.context("shutdown failed")?;
    Ok(failed)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let loaded = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    };
    loaded.context("failed to load configuration")
}

/// Answer one location per stdin line until EOF or Ctrl-C
async fn interactive(ctx: &AppContext, cli: &Cli) -> usize {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = 0;

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line() => line,
        };

        let location = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read stdin");
                break;
            }
        };

        let query = Some(location.trim()).filter(|l| !l.is_empty());
        let result = ctx.weather.get_weather(query, cli.refresh).await;
        let label = query.unwrap_or(ctx.weather.default_location());
        failed += usize::from(!print_result(label, result, cli));
    }

    failed
}

/// Print a lookup result; returns whether it succeeded
fn print_result(location: &str, result: DomainResult<WeatherLookup>, cli: &Cli) -> bool {
    match result {
        Ok(lookup) if cli.json => match serde_json::to_string_pretty(&lookup) {
            Ok(json) => {
                println!("{json}");
                true
            }
            Err(err) => {
                eprintln!("{location}: failed to encode report: {err}");
                false
            }
        },
        Ok(lookup) => {
            println!("{}\n", render_lookup(&lookup));
            true
        }
        Err(err) => {
            eprintln!("{location}: {err}");
            false
        }
    }
}
