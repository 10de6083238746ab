use crate::*;
use common::MAX_SOURCES;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("No sources defined")]
    NoSources,

    #[error("Too many sources: {count} (maximum is {MAX_SOURCES})")]
    TooManySources { count: usize },

    #[error("Duplicate source name: {0}")]
    DuplicateSourceName(String),

    #[error("Source name must not be empty")]
    EmptySourceName,

    #[error("bar_width_secs must be positive, got {0}")]
    InvalidBarWidth(i64),

    #[error("safety_margin_secs must not be negative, got {0}")]
    NegativeSafetyMargin(i64),

    #[error("queue_capacity must be positive")]
    ZeroQueueCapacity,

    #[error("Source '{source_name}': scripted timestamps must be strictly increasing ({prev} then {next})")]
    ScriptedNotIncreasing { source_name: String, prev: i64, next: i64 },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn warn(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

/// Validate a parsed configuration.
///
/// Errors make the configuration unusable; warnings flag setups that run
/// but probably do not behave the way the operator expects.
pub fn validate_config(config: &IndexConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_engine(&config.engine, &mut report);
    validate_sources(&config.sources, &mut report);

    report
}

fn validate_engine(engine: &EngineSection, report: &mut ValidationReport) {
    if engine.bar_width_secs <= 0 {
        report
            .errors
            .push(ValidationError::InvalidBarWidth(engine.bar_width_secs));
    }

    if let Some(margin) = engine.safety_margin_secs {
        if margin < 0 {
            report
                .errors
                .push(ValidationError::NegativeSafetyMargin(margin));
        } else if margin < engine.bar_width_secs {
            report.warn(
                "engine.safety_margin_secs",
                format!(
                    "margin {}s is below the bar width {}s; bars may finalize \
                     before all of their closing minute's data has arrived",
                    margin, engine.bar_width_secs
                ),
            );
        }
    }

    if engine.queue_capacity == 0 {
        report.errors.push(ValidationError::ZeroQueueCapacity);
    }
}

fn validate_sources(sources: &[SourceConfig], report: &mut ValidationReport) {
    if sources.is_empty() {
        report.errors.push(ValidationError::NoSources);
        return;
    }

    if sources.len() > MAX_SOURCES {
        report.errors.push(ValidationError::TooManySources {
            count: sources.len(),
        });
    }

    if sources.len() == 1 {
        report.warn(
            "sources",
            "only one source configured; the index degenerates to that source's price",
        );
    }

    let mut seen = HashSet::new();
    for source in sources {
        if source.name.is_empty() {
            report.errors.push(ValidationError::EmptySourceName);
        } else if !seen.insert(source.name.as_str()) {
            report
                .errors
                .push(ValidationError::DuplicateSourceName(source.name.clone()));
        }

        match &source.kind {
            SourceKind::Scripted { ticks, .. } => {
                if ticks.is_empty() {
                    report.warn(
                        &format!("sources.{}", source.name),
                        "scripted source has no ticks and will close immediately",
                    );
                }
                for pair in ticks.windows(2) {
                    if pair[1].timestamp <= pair[0].timestamp {
                        report.errors.push(ValidationError::ScriptedNotIncreasing {
                            source_name: source.name.clone(),
                            prev: pair[0].timestamp,
                            next: pair[1].timestamp,
                        });
                        break;
                    }
                }
            }
            SourceKind::RandomWalk { ticks, .. } => {
                if *ticks == 0 {
                    report.warn(
                        &format!("sources.{}", source.name),
                        "random walk source emits zero ticks and will close immediately",
                    );
                }
            }
        }
    }
}
