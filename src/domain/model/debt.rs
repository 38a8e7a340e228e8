//! Debt model: `newDebt[t] = debt[t] * (1 + interest[t])`.

use crate::domain::error::SimError;
use crate::domain::model::zip_model;
use crate::domain::schema::ModelKind;
use crate::domain::series_store::SeriesStore;

pub fn run(store: &mut SeriesStore) -> Result<(), SimError> {
    zip_model(
        ModelKind::Debt,
        store,
        ("debt", "interest"),
        "newDebt",
        |debt, interest| debt * (1.0 + interest),
    )
}
