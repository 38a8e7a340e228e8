//! Chart preparation: preconditions and plotted series.
//!
//! Rendering lives behind [`crate::ports::chart_port::ChartPort`]; this module
//! only decides what gets plotted.

use crate::domain::error::SimError;
use crate::domain::export::MergedResultView;
use std::fmt;

pub const CHART_TITLE: &str = "Total Savings Over Time";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Area,
}

impl ChartKind {
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Line => "LINE",
            ChartKind::Area => "AREA",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SimError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "LINE" => Ok(ChartKind::Line),
            "AREA" => Ok(ChartKind::Area),
            _ => Err(SimError::ConfigInvalid {
                section: "chart".into(),
                key: "kind".into(),
                reason: format!("unknown chart kind '{name}' (expected LINE or AREA)"),
            }),
        }
    }

    /// Names that must be present and non-empty in the view.
    pub fn required_names(self) -> &'static [&'static str] {
        match self {
            ChartKind::Line => &["totalSavings"],
            ChartKind::Area => &[
                "totalSavings",
                "monthlyIncome",
                "savingFraction",
                "ethereumDollar",
                "ETHquantity",
            ],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub title: &'static str,
    /// Period labels in `MM/YY` form where possible.
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// `2024_01` becomes `01/24`. Labels of any other shape pass through.
pub fn format_period_label(label: &str) -> String {
    let parts: Vec<&str> = label.split('_').collect();
    match parts.as_slice() {
        [year, month] => match year.get(2..) {
            Some(short_year) => format!("{month}/{short_year}"),
            None => label.to_string(),
        },
        _ => label.to_string(),
    }
}

pub fn check_requirements(view: &MergedResultView, kind: ChartKind) -> Result<(), SimError> {
    let missing: Vec<String> = kind
        .required_names()
        .iter()
        .filter(|name| view.column(name).is_none_or(<[f64]>::is_empty))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SimError::ChartPrecondition {
            chart: kind.to_string(),
            missing,
        })
    }
}

/// Build the plotted series for `kind`.
///
/// LINE plots total savings. AREA adds cumulative saved income and
/// cumulative ETH profit. Columns shorter than the period count repeat their
/// last value.
pub fn chart_data(view: &MergedResultView, kind: ChartKind) -> Result<ChartData, SimError> {
    check_requirements(view, kind)?;

    let column = |name: &str| -> Vec<f64> {
        let values = view.column(name).unwrap_or_default();
        (0..view.period_count)
            .map(|i| values.get(i).or_else(|| values.last()).copied().unwrap_or(0.0))
            .collect()
    };

    let mut series = vec![ChartSeries {
        label: "Total Savings ($)",
        values: column("totalSavings"),
    }];

    if kind == ChartKind::Area {
        let income = column("monthlyIncome");
        let fraction = column("savingFraction");
        let price = column("ethereumDollar");
        let quantity = column("ETHquantity");

        let mut cumulative_income = Vec::with_capacity(view.period_count);
        let mut cumulative_eth = Vec::with_capacity(view.period_count);
        let (mut income_total, mut eth_total) = (0.0, 0.0);
        for i in 0..view.period_count {
            income_total += income[i] * fraction[i];
            if i > 0 {
                eth_total += (price[i] - price[i - 1]) * quantity[i];
            }
            cumulative_income.push(income_total);
            cumulative_eth.push(eth_total);
        }

        series.push(ChartSeries {
            label: "Income($)",
            values: cumulative_income,
        });
        series.push(ChartSeries {
            label: "ETH($)",
            values: cumulative_eth,
        });
    }

    Ok(ChartData {
        kind,
        title: CHART_TITLE,
        categories: view
            .period_labels
            .iter()
            .map(|l| format_period_label(l))
            .collect(),
        series,
    })
}
