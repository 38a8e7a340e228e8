//! Line-oriented data loader.
//!
//! File format (whitespace separated, blank lines ignored):
//!
//! ```text
//! LATA 2024_01 2024_02 2024_03
//! capital 100 200
//! growthRate 0.1
//! ```
//!
//! The `LATA` line sets the period axis. Every other line is a variable name
//! followed by numbers, padded with the last parsed value (or `0.0` when none
//! parsed) and truncated to the period count in effect when the line is read.

use crate::domain::error::SimError;
use crate::domain::schema::VariableKind;
use crate::domain::series_store::SeriesStore;
use crate::ports::log_port::LogPort;
use std::fs;
use std::path::Path;

/// First token of the period-axis line.
pub const PERIOD_AXIS_MARKER: &str = "LATA";

/// What a load did, independent of the logger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub period_count: usize,
    /// Bound series assigned, in file order (repeats allowed).
    pub assigned: Vec<String>,
    pub warnings: Vec<String>,
}

/// Pad or truncate `values` to `len`, repeating the last value.
pub fn align_to_periods(values: &[f64], len: usize) -> Vec<f64> {
    let fill = values.last().copied().unwrap_or(0.0);
    (0..len)
        .map(|i| values.get(i).copied().unwrap_or(fill))
        .collect()
}

/// Reset `store` and populate it from `lines`.
pub fn load_lines<'a, I>(lines: I, store: &mut SeriesStore, log: &dyn LogPort) -> LoadReport
where
    I: IntoIterator<Item = &'a str>,
{
    store.reset();
    log.info("Store has been reset.");

    let mut report = LoadReport::default();
    let warn = |report: &mut LoadReport, message: String| {
        log.warning(&message);
        report.warnings.push(message);
    };

    for line in lines {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };

        if head == PERIOD_AXIS_MARKER {
            let labels: Vec<String> = tokens.map(str::to_string).collect();
            store.set_period_axis(labels);
            report.period_count = store.period_count();
            log.info(&format!(
                "Set {} from {PERIOD_AXIS_MARKER} -> {}",
                store.schema().period_count_field,
                report.period_count
            ));
            continue;
        }

        let mut values = Vec::new();
        for token in tokens {
            match token.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => warn(
                    &mut report,
                    format!("Ignored non-numeric value: {token} for variable {head}"),
                ),
            }
        }

        let declared = store.schema().descriptor(head).map(|d| d.kind);
        if declared != Some(VariableKind::SeriesF64) {
            warn(
                &mut report,
                format!("Ignored variable or unsupported type: {head}"),
            );
            continue;
        }

        let aligned = align_to_periods(&values, store.period_count());
        log.info(&format!("Set {head} = {aligned:?}"));
        if let Some(slot) = store.series_mut(head) {
            *slot = aligned;
            report.assigned.push(head.to_string());
        }
    }

    report
}

pub fn load_str(content: &str, store: &mut SeriesStore, log: &dyn LogPort) -> LoadReport {
    load_lines(content.lines(), store, log)
}

/// Load a data file. An unreadable file leaves `store` reset and empty.
pub fn load_file<P: AsRef<Path>>(
    path: P,
    store: &mut SeriesStore,
    log: &dyn LogPort,
) -> Result<LoadReport, SimError> {
    let path = path.as_ref();
    log.info(&format!("Reading data from {}", path.display()));
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            store.reset();
            let err = SimError::DataRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            log.error(&err.to_string());
            return Err(err);
        }
    };
    let report = load_str(&content, store, log);
    log.info(&format!("Data loaded from {}", path.display()));
    Ok(report)
}
