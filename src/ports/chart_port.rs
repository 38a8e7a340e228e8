//! Chart rendering port trait.

use crate::domain::chart::ChartKind;
use crate::domain::error::SimError;
use crate::domain::export::MergedResultView;

/// Port for drawing the merged result table.
///
/// Implementations return the rendered document. Missing input variables are
/// reported as [`SimError::ChartPrecondition`]; see
/// [`crate::domain::chart::check_requirements`].
pub trait ChartPort {
    fn render(&self, view: &MergedResultView, kind: ChartKind) -> Result<String, SimError>;
}
