//! Model computations.
//!
//! Each model kind reads its inputs from the [`SeriesStore`] by name and writes
//! its declared output, sized by the current value of the period-count field:
//! - `savings`: cumulative savings from income, ETH holdings and deposits
//! - `growth`: `result[t] = capital[t] * growthRate[t]`
//! - `debt`: `newDebt[t] = debt[t] * (1 + interest[t])`
//! - `cashflow`: `balance[t] = inflow[t] - outflow[t]`

pub mod cashflow;
pub mod debt;
pub mod growth;
pub mod savings;

use crate::domain::error::SimError;
use crate::domain::schema::ModelKind;
use crate::domain::series_store::SeriesStore;
use crate::ports::log_port::LogPort;

pub fn run_model(
    kind: ModelKind,
    store: &mut SeriesStore,
    log: &dyn LogPort,
) -> Result<(), SimError> {
    match kind {
        ModelKind::Savings => savings::run(store, log),
        ModelKind::Growth => growth::run(store),
        ModelKind::Debt => debt::run(store),
        ModelKind::Cashflow => cashflow::run(store),
    }
}

pub(crate) fn computation_error(kind: ModelKind, reason: impl Into<String>) -> SimError {
    SimError::ModelComputation {
        model: kind.to_string(),
        reason: reason.into(),
    }
}

/// The period count a model must produce, rejecting negative values.
pub(crate) fn output_len(kind: ModelKind, store: &SeriesStore) -> Result<usize, SimError> {
    let ll = store.period_count_value();
    usize::try_from(ll).map_err(|_| computation_error(kind, format!("invalid period count {ll}")))
}

/// Borrow an input series that must cover at least `len` periods.
pub(crate) fn require_series<'s>(
    kind: ModelKind,
    store: &'s SeriesStore,
    name: &str,
    len: usize,
) -> Result<&'s [f64], SimError> {
    let values = store
        .series(name)
        .ok_or_else(|| computation_error(kind, format!("missing input '{name}'")))?;
    if values.len() < len {
        return Err(computation_error(
            kind,
            format!("input '{name}' has {} values, need {len}", values.len()),
        ));
    }
    Ok(values)
}

/// Element-wise binary model: `out[t] = f(a[t], b[t])` for every period.
pub(crate) fn zip_model(
    kind: ModelKind,
    store: &mut SeriesStore,
    inputs: (&str, &str),
    output: &str,
    f: impl Fn(f64, f64) -> f64,
) -> Result<(), SimError> {
    let len = output_len(kind, store)?;
    let a = require_series(kind, store, inputs.0, len)?;
    let b = require_series(kind, store, inputs.1, len)?;
    let values: Vec<f64> = a.iter().zip(b).take(len).map(|(&x, &y)| f(x, y)).collect();
    store.set_series(output, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::log_port::NullLog;

    #[test]
    fn run_model_dispatches_by_kind() {
        let mut store = SeriesStore::new(ModelKind::Cashflow.schema());
        store.set_period_axis(vec!["p1".into()]);
        store.set_series("inflow", vec![5.0]).unwrap();
        store.set_series("outflow", vec![2.0]).unwrap();

        run_model(ModelKind::Cashflow, &mut store, &NullLog).unwrap();
        assert_eq!(store.series("balance"), Some(&[3.0][..]));
    }

    #[test]
    fn require_series_reports_short_input() {
        let mut store = SeriesStore::new(ModelKind::Growth.schema());
        store.set_series("capital", vec![1.0]).unwrap();
        let err = require_series(ModelKind::Growth, &store, "capital", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model 'growth' failed: input 'capital' has 1 values, need 3"
        );
    }

    #[test]
    fn zero_periods_yield_empty_output() {
        let mut store = SeriesStore::new(ModelKind::Debt.schema());
        run_model(ModelKind::Debt, &mut store, &NullLog).unwrap();
        assert_eq!(store.series("newDebt"), Some(&[][..]));
    }
}
