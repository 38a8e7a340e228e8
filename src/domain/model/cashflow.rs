//! Cash-flow model: `balance[t] = inflow[t] - outflow[t]`.

use crate::domain::error::SimError;
use crate::domain::model::zip_model;
use crate::domain::schema::ModelKind;
use crate::domain::series_store::SeriesStore;

pub fn run(store: &mut SeriesStore) -> Result<(), SimError> {
    zip_model(
        ModelKind::Cashflow,
        store,
        ("inflow", "outflow"),
        "balance",
        |inflow, outflow| inflow - outflow,
    )
}
