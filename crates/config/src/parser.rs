use crate::*;
use anyhow::{Context, Result};
use common::Tick;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IndexConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    // Perform environment variable substitution
    let substituted = substitution::substitute_env_vars(&content)?;
    debug!("Environment variable substitution completed");

    let config: IndexConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!(
        sources = config.sources.len(),
        bar_width = config.engine.bar_width_secs,
        "Configuration loaded"
    );
    Ok(config)
}

/// A runnable starting point: three simulated exchanges feeding a console
/// sink, one of them scripted to fail mid-stream.
#[instrument]
pub fn generate_default_config() -> IndexConfig {
    IndexConfig {
        engine: EngineSection::default(),
        sources: vec![
            SourceConfig {
                name: "exchange-a".to_string(),
                kind: SourceKind::RandomWalk {
                    seed: 1,
                    start_price: 100.0,
                    ticks: 240,
                    tick_interval_ms: 250,
                    start_timestamp: None,
                },
            },
            SourceConfig {
                name: "exchange-b".to_string(),
                kind: SourceKind::RandomWalk {
                    seed: 2,
                    start_price: 100.5,
                    ticks: 240,
                    tick_interval_ms: 400,
                    start_timestamp: None,
                },
            },
            SourceConfig {
                name: "exchange-c".to_string(),
                kind: SourceKind::Scripted {
                    ticks: vec![
                        Tick::new(0, 99.8),
                        Tick::new(30, 100.2),
                        Tick::new(95, 100.6),
                    ],
                    error: Some("simulated disconnect".to_string()),
                    tick_interval_ms: 100,
                },
            },
        ],
        sink: SinkSection::Console,
        monitoring: None,
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &IndexConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = generate_default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: IndexConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.sources.len(), 3);
        assert_eq!(parsed.sources[2].kind.kind_name(), "scripted");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = generate_default_config();
        let report = validator::validate_config(&config);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }
}
