//! Growth model: `result[t] = capital[t] * growthRate[t]`.

use crate::domain::error::SimError;
use crate::domain::model::zip_model;
use crate::domain::schema::ModelKind;
use crate::domain::series_store::SeriesStore;

pub fn run(store: &mut SeriesStore) -> Result<(), SimError> {
    zip_model(
        ModelKind::Growth,
        store,
        ("capital", "growthRate"),
        "result",
        |capital, rate| capital * rate,
    )
}
