//! The period-aligned variable store shared by loader, models, scripts and
//! the exporter.
//!
//! Bound variables are laid out in schema declaration order. Derived
//! variables live in a separate [`DerivedStore`] in first-seen order, and a
//! derived name can never shadow a bound one.

use crate::domain::error::SimError;
use crate::domain::schema::{BoundValue, ModelSchema, VariableKind};

/// Script-derived series, kept in the order they were first introduced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedStore {
    entries: Vec<(String, Vec<f64>)>,
}

impl DerivedStore {
    /// Insert or overwrite. Returns `true` when the name is new.
    pub fn upsert(&mut self, name: &str, values: Vec<f64>) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = values;
                false
            }
            None => {
                self.entries.push((name.to_string(), values));
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStore {
    schema: ModelSchema,
    period_labels: Vec<String>,
    bound: Vec<BoundValue>,
    derived: DerivedStore,
}

impl SeriesStore {
    pub fn new(schema: ModelSchema) -> Self {
        let bound = schema
            .variables
            .iter()
            .map(|d| BoundValue::default_for(d.kind))
            .collect();
        Self {
            schema,
            period_labels: Vec::new(),
            bound,
            derived: DerivedStore::default(),
        }
    }

    /// Clear the period axis, zero the period-count scalar, empty every bound
    /// series and drop all derived variables.
    pub fn reset(&mut self) {
        self.period_labels.clear();
        for (value, descriptor) in self.bound.iter_mut().zip(self.schema.variables) {
            *value = BoundValue::default_for(descriptor.kind);
        }
        self.derived.clear();
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn period_labels(&self) -> &[String] {
        &self.period_labels
    }

    pub fn period_count(&self) -> usize {
        self.period_labels.len()
    }

    /// Replace the period axis and set the period-count scalar to its length.
    pub fn set_period_axis(&mut self, labels: Vec<String>) {
        let count = labels.len() as i64;
        self.period_labels = labels;
        let field = self.schema.period_count_field;
        if let Some(slot) = self.slot_mut(field) {
            *slot = BoundValue::Scalar(count);
        }
    }

    /// Current value of the period-count scalar. This is what models size
    /// their outputs by; scripts cannot change it.
    pub fn period_count_value(&self) -> i64 {
        match self.get(self.schema.period_count_field) {
            Some(BoundValue::Scalar(v)) => *v,
            _ => 0,
        }
    }

    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        let index = self.index_of(name)?;
        self.bound.get(index)
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        match self.get(name)? {
            BoundValue::Series(values) => Some(values),
            BoundValue::Scalar(_) => None,
        }
    }

    pub fn series_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        match self.slot_mut(name)? {
            BoundValue::Series(values) => Some(values),
            BoundValue::Scalar(_) => None,
        }
    }

    /// Assign a bound series. Fails when the name is not declared as a
    /// `series-f64` by the schema.
    pub fn set_series(&mut self, name: &str, values: Vec<f64>) -> Result<(), SimError> {
        match self.slot_mut(name) {
            Some(slot @ BoundValue::Series(_)) => {
                *slot = BoundValue::Series(values);
                Ok(())
            }
            Some(BoundValue::Scalar(_)) => Err(SimError::ExtractionType {
                name: name.to_string(),
                expected: VariableKind::ScalarInt.to_string(),
                found: VariableKind::SeriesF64.to_string(),
            }),
            None => Err(SimError::ModelComputation {
                model: self.schema.kind.to_string(),
                reason: format!("'{name}' is not a bound variable"),
            }),
        }
    }

    /// Bound variables in declaration order, period-count field included.
    pub fn bound(&self) -> impl Iterator<Item = (&'static str, &BoundValue)> {
        self.schema
            .variables
            .iter()
            .map(|d| d.name)
            .zip(self.bound.iter())
    }

    pub fn derived(&self) -> &DerivedStore {
        &self.derived
    }

    pub fn derived_mut(&mut self) -> &mut DerivedStore {
        &mut self.derived
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.schema.variables.iter().position(|d| d.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut BoundValue> {
        let index = self.index_of(name)?;
        self.bound.get_mut(index)
    }
}
