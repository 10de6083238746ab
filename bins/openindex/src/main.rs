//! OpenIndex CLI and Engine Binary
//!
//! This is the main entry point for the OpenIndex application. It provides
//! commands for initializing and validating configuration and for running
//! the index engine against the configured sources.

use anyhow::{bail, Context, Result};
use cli::{Cli, Commands};
use common::SourceId;
use config::{
    generate_default_config, load_config, save_config, validate_config, IndexConfig, SinkSection,
    SourceConfig, SourceKind,
};
use engine::{EngineSettings, EngineSummary, IndexEngine};
use feed::{spawn_adapter, PriceFeed, RandomWalkFeed, ScriptedFeed, ShutdownController};
use futures::future::join_all;
use observability::init_logging;
use sink::{ConsoleSink, CsvSink};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging("openindex", cli.log_format)?;

    match cli.command {
        Commands::Start {
            config,
            metrics_port,
        } => start_engine(config, metrics_port).await,
        Commands::Validate { config } => validate_command(config),
        Commands::Init { output } => init_command(output),
    }
}

async fn start_engine<P: AsRef<Path>>(config_path: P, metrics_port: Option<u16>) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    report_validation(&config)?;

    let port = metrics_port.or(config.monitoring.as_ref().map(|m| m.metrics_port));
    if let Some(port) = port {
        observability::init_metrics(port)?;
    }

    let settings = EngineSettings {
        bar_width_secs: config.engine.bar_width_secs,
        safety_margin_secs: config.engine.safety_margin(),
        combine: config.engine.combine.into(),
        queue_capacity: config.engine.queue_capacity,
    };
    let names: Vec<String> = config.sources.iter().map(|s| s.name.clone()).collect();
    let (index_engine, tx) = IndexEngine::new(settings, names)?;

    let shutdown = ShutdownController::with_ctrl_c();
    let adapters: Vec<_> = config
        .sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            info!(name = %source.name, kind = source.kind.kind_name(), "Starting feed");
            spawn_adapter(
                SourceId(index as u16),
                build_feed(source),
                tx.clone(),
                shutdown.child_token(),
            )
        })
        .collect();
    // The engine must observe channel closure if every adapter dies early
    drop(tx);

    let summary = match &config.sink {
        SinkSection::Console => {
            let mut sink = ConsoleSink::new();
            index_engine.run(&mut sink).await?
        }
        SinkSection::Csv { path } => {
            let mut sink = CsvSink::create(path)
                .await
                .with_context(|| format!("Failed to open CSV sink: {:?}", path))?;
            index_engine.run(&mut sink).await?
        }
    };

    join_all(adapters).await;
    report_summary(&summary);
    Ok(())
}

fn build_feed(source: &SourceConfig) -> Box<dyn PriceFeed> {
    match &source.kind {
        SourceKind::RandomWalk {
            seed,
            start_price,
            ticks,
            tick_interval_ms,
            start_timestamp,
        } => {
            let start = start_timestamp.unwrap_or_else(now_epoch);
            let mut walk = RandomWalkFeed::new(source.name.as_str(), *seed, *start_price, *ticks)
                .starting_at(start);
            if *tick_interval_ms > 0 {
                walk = walk.with_pacing(Duration::from_millis(*tick_interval_ms));
            }
            Box::new(walk)
        }
        SourceKind::Scripted {
            ticks,
            error,
            tick_interval_ms,
        } => {
            let mut scripted = ScriptedFeed::new(source.name.as_str(), ticks.clone());
            if let Some(reason) = error {
                scripted = scripted.fail_with(reason.clone());
            }
            if *tick_interval_ms > 0 {
                scripted = scripted.with_tick_delay(Duration::from_millis(*tick_interval_ms));
            }
            Box::new(scripted)
        }
    }
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn report_validation(config: &IndexConfig) -> Result<()> {
    let report = validate_config(config);

    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }
    if !report.is_valid() {
        for e in &report.errors {
            error!("{}", e);
        }
        bail!("Configuration is invalid ({} errors)", report.errors.len());
    }
    Ok(())
}

fn report_summary(summary: &EngineSummary) {
    info!(
        bars = summary.bars_emitted,
        observations = summary.observations,
        rejected = summary.observations_rejected,
        source_errors = summary.source_errors,
        watermark = ?summary.final_watermark,
        "Run complete"
    );
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    let report = validate_config(&config);

    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }
    if report.is_valid() {
        println!(
            "Configuration OK: {} sources, {}s bars, {} combine",
            config.sources.len(),
            config.engine.bar_width_secs,
            config.engine.combine
        );
        Ok(())
    } else {
        for e in &report.errors {
            error!("{}", e);
        }
        bail!("Configuration is invalid ({} errors)", report.errors.len());
    }
}

fn init_command<P: AsRef<Path>>(output: P) -> Result<()> {
    let output = output.as_ref();
    if output.exists() {
        bail!("Refusing to overwrite existing file: {:?}", output);
    }

    let config = generate_default_config();
    save_config(&config, output)?;
    println!("Wrote default configuration to {:?}", output);
    Ok(())
}
