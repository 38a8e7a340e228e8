//! Model schemas: which named variables each model kind binds.
//!
//! Every model kind maps to a static, ordered table of variable descriptors.
//! Exactly one descriptor per schema is the period-count scalar; all others are
//! period-aligned `f64` series. The table order is the declaration order used
//! by the merged view and the exported text.

use crate::domain::error::SimError;
use std::fmt;

/// Name of the period-count scalar shared by every shipped schema.
pub const PERIOD_COUNT_FIELD: &str = "LL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    ScalarInt,
    SeriesF64,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::ScalarInt => write!(f, "scalar-int"),
            VariableKind::SeriesF64 => write!(f, "series-f64"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub name: &'static str,
    pub kind: VariableKind,
}

impl VariableDescriptor {
    const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: VariableKind::ScalarInt,
        }
    }

    const fn series(name: &'static str) -> Self {
        Self {
            name,
            kind: VariableKind::SeriesF64,
        }
    }
}

/// A bound variable's value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Scalar(i64),
    Series(Vec<f64>),
}

impl BoundValue {
    pub fn default_for(kind: VariableKind) -> Self {
        match kind {
            VariableKind::ScalarInt => BoundValue::Scalar(0),
            VariableKind::SeriesF64 => BoundValue::Series(Vec::new()),
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            BoundValue::Scalar(_) => VariableKind::ScalarInt,
            BoundValue::Series(_) => VariableKind::SeriesF64,
        }
    }
}

/// Supported model kinds. Adding a model means adding a variant here, a
/// descriptor table below and a dispatch arm in [`crate::domain::model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Savings,
    Growth,
    Debt,
    Cashflow,
}

const SAVINGS_VARIABLES: &[VariableDescriptor] = &[
    VariableDescriptor::scalar(PERIOD_COUNT_FIELD),
    VariableDescriptor::series("monthlyIncome"),
    VariableDescriptor::series("savingFraction"),
    VariableDescriptor::series("ethereumDollar"),
    VariableDescriptor::series("ETHquantity"),
    VariableDescriptor::series("bankDeposit"),
    VariableDescriptor::series("bankDepositRate"),
    VariableDescriptor::series("initialSavings"),
    VariableDescriptor::series("totalSavings"),
];

const GROWTH_VARIABLES: &[VariableDescriptor] = &[
    VariableDescriptor::scalar(PERIOD_COUNT_FIELD),
    VariableDescriptor::series("capital"),
    VariableDescriptor::series("growthRate"),
    VariableDescriptor::series("result"),
];

const DEBT_VARIABLES: &[VariableDescriptor] = &[
    VariableDescriptor::scalar(PERIOD_COUNT_FIELD),
    VariableDescriptor::series("debt"),
    VariableDescriptor::series("interest"),
    VariableDescriptor::series("newDebt"),
];

const CASHFLOW_VARIABLES: &[VariableDescriptor] = &[
    VariableDescriptor::scalar(PERIOD_COUNT_FIELD),
    VariableDescriptor::series("inflow"),
    VariableDescriptor::series("outflow"),
    VariableDescriptor::series("balance"),
];

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Savings,
        ModelKind::Growth,
        ModelKind::Debt,
        ModelKind::Cashflow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Savings => "savings",
            ModelKind::Growth => "growth",
            ModelKind::Debt => "debt",
            ModelKind::Cashflow => "cashflow",
        }
    }

    /// Legacy class-style name accepted by [`ModelKind::from_name`].
    pub fn alias(self) -> &'static str {
        match self {
            ModelKind::Savings => "ModelSavings",
            ModelKind::Growth => "Model2",
            ModelKind::Debt => "Model3",
            ModelKind::Cashflow => "Model4",
        }
    }

    /// Resolve a user-supplied model name. Matching is case-insensitive and
    /// accepts the legacy class-style aliases (`Model2`, ...).
    pub fn from_name(name: &str) -> Result<Self, SimError> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted) || k.alias().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SimError::UnknownModel {
                name: wanted.to_string(),
                known: Self::ALL.map(|k| k.name()).join(", "),
            })
    }

    pub fn schema(self) -> ModelSchema {
        ModelSchema::declare(self)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    pub kind: ModelKind,
    pub period_count_field: &'static str,
    pub variables: &'static [VariableDescriptor],
}

impl ModelSchema {
    pub fn declare(kind: ModelKind) -> Self {
        let variables = match kind {
            ModelKind::Savings => SAVINGS_VARIABLES,
            ModelKind::Growth => GROWTH_VARIABLES,
            ModelKind::Debt => DEBT_VARIABLES,
            ModelKind::Cashflow => CASHFLOW_VARIABLES,
        };
        Self {
            kind,
            period_count_field: PERIOD_COUNT_FIELD,
            variables,
        }
    }

    /// Series names in declaration order, without the period-count field.
    pub fn series_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variables
            .iter()
            .filter(|d| d.kind == VariableKind::SeriesF64)
            .map(|d| d.name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&'static VariableDescriptor> {
        self.variables.iter().find(|d| d.name == name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }
}
