//! Merged result view and its text renderings.
//!
//! The view lists bound series in schema order followed by derived series in
//! first-seen order. The tab-separated export additionally carries the
//! period-count field as a row, repeated once per period:
//!
//! ```text
//! LATA	2024_01	2024_02
//! LL	2	2
//! capital	100	200
//! profit	10	20
//! ```

use crate::domain::error::SimError;
use crate::domain::loader::PERIOD_AXIS_MARKER;
use crate::domain::schema::BoundValue;
use crate::domain::series_store::SeriesStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    Bound,
    Derived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: String,
    pub origin: ColumnOrigin,
    pub values: Vec<f64>,
}

/// Read-only snapshot of everything a table or chart can show.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedResultView {
    pub period_labels: Vec<String>,
    pub period_count: usize,
    pub columns: Vec<ResultColumn>,
}

impl MergedResultView {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

pub fn to_table(store: &SeriesStore) -> MergedResultView {
    let schema = store.schema();
    let mut columns: Vec<ResultColumn> = schema
        .series_names()
        .map(|name| ResultColumn {
            name: name.to_string(),
            origin: ColumnOrigin::Bound,
            values: store.series(name).map(<[f64]>::to_vec).unwrap_or_default(),
        })
        .collect();
    columns.extend(
        store
            .derived()
            .iter()
            .filter(|(name, _)| !schema.is_bound(name))
            .map(|(name, values)| ResultColumn {
                name: name.to_string(),
                origin: ColumnOrigin::Derived,
                values: values.to_vec(),
            }),
    );

    MergedResultView {
        period_labels: store.period_labels().to_vec(),
        period_count: store.period_count(),
        columns,
    }
}

fn export_error(e: impl std::fmt::Display) -> SimError {
    SimError::Export {
        reason: e.to_string(),
    }
}

fn write_row<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    name: &str,
    cells: impl IntoIterator<Item = String>,
) -> Result<(), SimError> {
    let mut record = vec![name.to_string()];
    record.extend(cells);
    writer.write_record(&record).map_err(export_error)
}

/// Render the store as tab-separated text. Values use `f64`'s shortest
/// round-trip `Display`, so nothing is rounded.
pub fn to_delimited_text(store: &SeriesStore) -> Result<String, SimError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    write_row(
        &mut writer,
        PERIOD_AXIS_MARKER,
        store.period_labels().iter().cloned(),
    )?;

    let period_count = store.period_count();
    for (name, value) in store.bound() {
        match value {
            BoundValue::Scalar(v) => {
                write_row(&mut writer, name, std::iter::repeat_n(v.to_string(), period_count))?
            }
            BoundValue::Series(values) => {
                write_row(&mut writer, name, values.iter().map(f64::to_string))?
            }
        }
    }
    for (name, values) in store.derived().iter() {
        write_row(&mut writer, name, values.iter().map(f64::to_string))?;
    }

    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}

/// A table read back from [`to_delimited_text`] output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTable {
    pub period_labels: Vec<String>,
    pub rows: Vec<(String, Vec<f64>)>,
}

impl ParsedTable {
    pub fn row(&self, name: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

pub fn parse_delimited_text(text: &str) -> Result<ParsedTable, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut table = ParsedTable::default();
    let mut seen_header = false;
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(export_error)?;
        let Some(head) = record.get(0) else {
            continue;
        };

        if !seen_header {
            if head != PERIOD_AXIS_MARKER {
                return Err(export_error(format!(
                    "expected '{PERIOD_AXIS_MARKER}' header row, found '{head}'"
                )));
            }
            table.period_labels = record.iter().skip(1).map(str::to_string).collect();
            seen_header = true;
            continue;
        }

        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| {
                    export_error(format!(
                        "row {} ('{head}'): invalid number '{cell}'",
                        line + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        table.rows.push((head.to_string(), values));
    }

    if !seen_header {
        return Err(export_error("empty table"));
    }
    Ok(table)
}

/// `#,##0.00`: two decimals with comma-grouped thousands.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.chars().all(|c| c == '0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

fn format_cell(name: &str, values: &[f64], row: usize) -> String {
    let Some(value) = values.get(row).or_else(|| values.last()).copied() else {
        return String::new();
    };
    if name == "savingFraction" {
        format!("{}%", format_grouped(value * 100.0))
    } else {
        format_grouped(value)
    }
}

/// Period-per-row text table: the period label, then one right-aligned
/// column per view column.
pub fn to_display_table(view: &MergedResultView) -> String {
    let mut header = vec![PERIOD_AXIS_MARKER.to_string()];
    header.extend(view.names().map(str::to_string));

    let rows: Vec<Vec<String>> = view
        .period_labels
        .iter()
        .enumerate()
        .map(|(r, label)| {
            let mut row = vec![label.clone()];
            row.extend(
                view.columns
                    .iter()
                    .map(|c| format_cell(&c.name, &c.values, r)),
            );
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = render(header.as_slice());
    out.push('\n');
    let rule_len = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in &rows {
        out.push_str(&render(row.as_slice()));
        out.push('\n');
    }
    out
}
