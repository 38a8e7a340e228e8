//! Run configuration validation.
//!
//! ```ini
//! [model]
//! kind = growth
//!
//! [data]
//! path = data/growth.txt
//!
//! [script]
//! paths = scripts/profit.txt, scripts/extra.txt
//!
//! [export]
//! output = results.tsv
//!
//! [chart]
//! kind = LINE
//! output = chart.svg
//!
//! [logging]
//! filter = periodsim=debug
//! history = true
//! ```

use crate::domain::chart::ChartKind;
use crate::domain::error::SimError;
use crate::domain::schema::ModelKind;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: ModelKind,
    pub data_path: PathBuf,
    pub scripts: Vec<PathBuf>,
    /// `None` writes the export to stdout.
    pub export_path: Option<PathBuf>,
    pub chart: Option<ChartSettings>,
    pub log_filter: Option<String>,
    pub show_history: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub kind: ChartKind,
    pub output: PathBuf,
}

fn missing(section: &str, key: &str) -> SimError {
    SimError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), SimError> {
    validate_model(config)?;
    validate_data(config)?;
    validate_chart(config)?;
    Ok(())
}

fn validate_model(config: &dyn ConfigPort) -> Result<(), SimError> {
    let kind = non_empty(config, "model", "kind").ok_or_else(|| missing("model", "kind"))?;
    ModelKind::from_name(&kind)?;
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), SimError> {
    non_empty(config, "data", "path").ok_or_else(|| missing("data", "path"))?;
    Ok(())
}

fn validate_chart(config: &dyn ConfigPort) -> Result<(), SimError> {
    let Some(kind) = non_empty(config, "chart", "kind") else {
        return Ok(());
    };
    ChartKind::from_name(&kind)?;
    non_empty(config, "chart", "output").ok_or_else(|| missing("chart", "output"))?;
    Ok(())
}

/// Validate, then read every section into a [`RunConfig`].
pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, SimError> {
    validate_run_config(config)?;

    let model_name = non_empty(config, "model", "kind").ok_or_else(|| missing("model", "kind"))?;
    let data_path = non_empty(config, "data", "path").ok_or_else(|| missing("data", "path"))?;

    let chart = match non_empty(config, "chart", "kind") {
        Some(kind) => Some(ChartSettings {
            kind: ChartKind::from_name(&kind)?,
            output: non_empty(config, "chart", "output")
                .map(PathBuf::from)
                .ok_or_else(|| missing("chart", "output"))?,
        }),
        None => None,
    };

    Ok(RunConfig {
        model: ModelKind::from_name(&model_name)?,
        data_path: PathBuf::from(data_path),
        scripts: config
            .get_list("script", "paths")
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        export_path: non_empty(config, "export", "output").map(PathBuf::from),
        chart,
        log_filter: non_empty(config, "logging", "filter"),
        show_history: config.get_bool("logging", "history", false),
    })
}
