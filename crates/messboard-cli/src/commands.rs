use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use messboard_engine::{EngineConfig, LifecycleEngine, SweepReport};
use messboard_fabric::NullChannel;
use messboard_server::{open_blobs, open_record_store, MessboardServer, ServerConfig, StoreConfig};
use messboard_types::{ActiveRecord, SystemClock};
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config: config_path,
        format,
        ..
    } = cli;
    let config = ServerConfig::load(config_path.as_deref()).context("loading configuration")?;

    match command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::List => cmd_list(&config, &format).await,
        Command::Sweep => cmd_sweep(&config, &format).await,
        Command::Config => cmd_config(&config),
    }
}

/// Engine over the configured stores, for one-shot commands with no event
/// subscribers.
fn offline_engine(config: &ServerConfig) -> anyhow::Result<LifecycleEngine> {
    let store = open_record_store(&config.store)?;
    let blobs = open_blobs(&config.blobs)?;
    Ok(LifecycleEngine::new(
        store,
        blobs,
        Arc::new(NullChannel),
        Arc::new(SystemClock),
        EngineConfig { ttl: config.ttl() },
    ))
}

fn warn_if_ephemeral(config: &ServerConfig) {
    if config.store == StoreConfig::Memory {
        eprintln!(
            "{} record store is in-memory; configure a file store to see persisted records",
            "note:".yellow().bold()
        );
    }
}

async fn active_records(config: &ServerConfig) -> anyhow::Result<Vec<ActiveRecord>> {
    let engine = offline_engine(config)?;
    Ok(engine.list_active(engine.now()).await)
}

async fn sweep_once(config: &ServerConfig) -> anyhow::Result<SweepReport> {
    let engine = offline_engine(config)?;
    engine
        .sweep(engine.now())
        .await
        .context("sweeping expired records")
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "{} Messboard on {} (ttl {}s, sweep every {}s)",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.ttl_secs,
        config.sweep_interval_secs
    );
    MessboardServer::new(config).serve().await?;
    Ok(())
}

fn record_lines(active: &ActiveRecord) -> Vec<String> {
    let record = &active.record;
    let remaining = if active.remaining.urgent {
        active.remaining.text.red().bold()
    } else {
        active.remaining.text.green()
    };
    let menu_type = record
        .menu_type
        .map(|m| format!(" [{m}]"))
        .unwrap_or_default();
    let price = record
        .price
        .as_deref()
        .map(|p| format!(" · {p}"))
        .unwrap_or_default();

    vec![
        format!(
            "{}  {}{}  {}",
            record.id.short_id().dimmed(),
            record.name.bold(),
            menu_type.cyan(),
            remaining
        ),
        format!("  {} · {}", record.location, record.phone.blue()),
        format!("  {}{}", record.menu_text, price),
    ]
}

async fn cmd_list(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let records = active_records(config).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            warn_if_ephemeral(config);
            if records.is_empty() {
                println!("No active records.");
            }
            for record in &records {
                for line in record_lines(record) {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

async fn cmd_sweep(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let report = sweep_once(config).await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "deletedCount": report.deleted_count,
                "blobsDeleted": report.blobs_deleted,
                "blobFailures": report.blob_failures,
            })
        ),
        OutputFormat::Text => {
            warn_if_ephemeral(config);
            println!(
                "{} Swept {} expired records",
                "✓".green().bold(),
                report.deleted_count.to_string().bold()
            );
            if report.blob_failures > 0 {
                println!(
                    "  {} {} images could not be deleted",
                    "!".yellow().bold(),
                    report.blob_failures
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
