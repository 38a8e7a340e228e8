//! Runs a script against a [`SeriesStore`].
//!
//! One call goes through three phases:
//!
//! 1. **Inject** every bound variable into a fresh [`Environment`]. Bound
//!    series are shared handles, so `capital[0] = 5` inside a script writes
//!    straight through to the store's `capital`, while `capital = [5]` only
//!    rebinds the script-side name. Derived series from earlier runs are
//!    injected as copies.
//! 2. **Evaluate** the parsed program. Syntax errors stop the call before
//!    anything runs. A runtime error keeps whatever the script already did.
//! 3. **Extract** new series in first-binding order. See [`extract`].

use crate::domain::error::SimError;
use crate::domain::schema::{BoundValue, VariableKind};
use crate::domain::script::eval;
use crate::domain::script::parser::parse;
use crate::domain::script::value::{Environment, SeriesRef, Value};
use crate::domain::series_store::SeriesStore;
use crate::ports::log_port::LogPort;
use std::fs;
use std::path::Path;

/// Outcome of a successful script run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptReport {
    /// Derived names written by this run, in extraction order.
    pub extracted: Vec<String>,
    /// The subset of `extracted` that did not exist before.
    pub introduced: Vec<String>,
}

/// Single lowercase letters are scratch names: loop counters, temporaries.
pub fn is_scratch_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_lowercase())
}

/// 1-based line and column of a byte offset.
fn line_col(source: &str, position: usize) -> (usize, usize) {
    let position = position.min(source.len());
    let before = &source[..position];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

fn inject(store: &SeriesStore) -> (Environment, Vec<(&'static str, SeriesRef)>) {
    let mut env = Environment::new();
    let mut handles = Vec::new();
    for (name, value) in store.bound() {
        match value {
            BoundValue::Scalar(v) => env.set(name, Value::Int(*v)),
            BoundValue::Series(values) => {
                let value = Value::series(values.clone());
                if let Some(handle) = value.as_series() {
                    handles.push((name, handle.clone()));
                }
                env.set(name, value);
            }
        }
    }
    for (name, values) in store.derived().iter() {
        env.set(name, Value::series(values.to_vec()));
    }
    (env, handles)
}

/// Copy the shared bound handles back into the store.
fn write_back(store: &mut SeriesStore, handles: &[(&'static str, SeriesRef)]) {
    for (name, handle) in handles {
        if let Some(slot) = store.series_mut(name) {
            slot.clone_from(&handle.borrow());
        }
    }
}

/// Move new series from `env` into the derived store.
///
/// Names are visited in first-binding order:
/// - the period-count field must still hold an `int`
/// - other bound names are never extracted; rebinding one to a value of
///   another kind only logs a warning
/// - scratch names are taken only when they hold a period-length series
/// - every other name must hold a series of exactly the period count
///
/// The first failure stops the pass; names extracted before it stay.
pub fn extract(
    env: &Environment,
    store: &mut SeriesStore,
    log: &dyn LogPort,
) -> Result<ScriptReport, SimError> {
    let period_count = store.period_count();
    let mut report = ScriptReport::default();

    for (name, value) in env.iter() {
        if name == store.schema().period_count_field {
            if !matches!(value, Value::Int(_)) {
                let err = SimError::ExtractionType {
                    name: name.to_string(),
                    expected: VariableKind::ScalarInt.to_string(),
                    found: value.describe(),
                };
                log.error(&err.to_string());
                return Err(err);
            }
            continue;
        }
        if store.schema().is_bound(name) {
            if value.as_series().is_none() {
                log.warning(&format!(
                    "Ignored bound variable '{name}' rebound to {}",
                    value.describe()
                ));
            }
            continue;
        }

        let series = value
            .as_series()
            .map(|handle| handle.borrow().clone())
            .filter(|values| values.len() == period_count);
        let Some(values) = series else {
            if is_scratch_name(name) {
                continue;
            }
            let err = SimError::ExtractionType {
                name: name.to_string(),
                expected: format!("{} of length {period_count}", VariableKind::SeriesF64),
                found: value.describe(),
            };
            log.error(&err.to_string());
            return Err(err);
        };

        log.info(&format!("Script variable '{name}' = {values:?}"));
        if store.derived_mut().upsert(name, values) {
            report.introduced.push(name.to_string());
        }
        report.extracted.push(name.to_string());
    }

    Ok(report)
}

/// Parse, inject, evaluate and extract `source` against `store`.
pub fn execute(
    source: &str,
    store: &mut SeriesStore,
    log: &dyn LogPort,
) -> Result<ScriptReport, SimError> {
    log.info("Executing script.");

    let program = match parse(source) {
        Ok(program) => program,
        Err(e) => {
            log.error(&format!(
                "Error executing script - syntax error\n{}",
                e.display_with_context(source)
            ));
            return Err(e.into());
        }
    };

    let (mut env, handles) = inject(store);
    let outcome = eval::execute(&program, &mut env);
    write_back(store, &handles);

    if let Err(e) = outcome {
        let (line, column) = line_col(source, e.position);
        let err = SimError::ScriptRuntime {
            reason: format!("{} (line {line}, column {column})", e.message),
        };
        log.error(&format!("Error executing script - {err}"));
        return Err(err);
    }

    let report = extract(&env, store, log)?;
    log.info("Script has been executed successfully.");
    Ok(report)
}

/// Read `path` and [`execute`] its contents.
pub fn execute_file<P: AsRef<Path>>(
    path: P,
    store: &mut SeriesStore,
    log: &dyn LogPort,
) -> Result<ScriptReport, SimError> {
    let path = path.as_ref();
    log.info(&format!("Executing script from file: {}", path.display()));
    let source = fs::read_to_string(path).map_err(|e| {
        let err = SimError::DataRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        log.error(&format!("Error reading script file: {err}"));
        err
    })?;
    let report = execute(&source, store, log)?;
    log.info(&format!("Script executed from file: {}", path.display()));
    Ok(report)
}
