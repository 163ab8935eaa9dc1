//! Date-indexed table of raw cells.
//!
//! Frames carry every input column through the pipeline untouched; stages
//! read typed series out of named columns and append (or overwrite) their
//! own output columns.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use super::error::BandtraderError;
use super::price::PricePoint;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parse a date cell. Accepts ISO dates, compact `YYYYMMDD`, slashed dates
/// and ISO datetimes with a midnight time part.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn is_missing(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("null")
}

pub fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    date_column: String,
    columns: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    /// Build a frame, sorting rows by date. Duplicate dates are rejected.
    pub fn new(
        date_column: impl Into<String>,
        columns: Vec<String>,
        mut rows: Vec<(NaiveDate, Vec<String>)>,
    ) -> Result<Self, BandtraderError> {
        rows.sort_by_key(|(d, _)| *d);
        for pair in rows.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(BandtraderError::DuplicateDate { date: pair[0].0 });
            }
        }

        let width = columns.len();
        let (dates, rows): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .map(|(d, mut cells)| {
                cells.resize(width, String::new());
                (d, cells)
            })
            .unzip();

        Ok(Frame {
            date_column: date_column.into(),
            columns,
            dates,
            rows,
        })
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Look up several columns at once, reporting every missing name.
    pub fn require(&self, names: &[&str]) -> Result<Vec<usize>, BandtraderError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.has_column(n))
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            let mut available = vec![self.date_column.clone()];
            available.extend(self.columns.iter().cloned());
            return Err(BandtraderError::MissingColumns { missing, available });
        }
        Ok(names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect())
    }

    /// Numeric column where blank or `NaN` cells become `None`.
    pub fn optional_numeric(&self, name: &str) -> Result<Vec<Option<f64>>, BandtraderError> {
        let idx = self.require(&[name])?[0];
        self.rows
            .iter()
            .zip(&self.dates)
            .map(|(row, date)| {
                let cell = &row[idx];
                if is_missing(cell) {
                    return Ok(None);
                }
                cell.trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| BandtraderError::InvalidValue {
                        date: *date,
                        column: name.to_string(),
                        value: cell.clone(),
                    })
            })
            .collect()
    }

    /// Numeric column that must be populated on every row.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, BandtraderError> {
        let values = self.optional_numeric(name)?;
        values
            .into_iter()
            .zip(&self.dates)
            .map(|(v, date)| {
                v.ok_or_else(|| BandtraderError::InvalidValue {
                    date: *date,
                    column: name.to_string(),
                    value: String::new(),
                })
            })
            .collect()
    }

    pub fn prices(&self, close_column: &str) -> Result<Vec<PricePoint>, BandtraderError> {
        if self.is_empty() {
            return Err(BandtraderError::EmptySeries {
                what: close_column.to_string(),
            });
        }
        let closes = self.numeric(close_column)?;
        Ok(self
            .dates
            .iter()
            .zip(closes)
            .map(|(d, c)| PricePoint::new(*d, c))
            .collect())
    }

    pub fn row_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Keep only `rows` (ascending indices) and attach `added` columns, each
    /// aligned with `rows`. An added column replaces an existing one of the
    /// same name.
    pub fn select_with(&self, rows: &[usize], added: Vec<(String, Vec<String>)>) -> Frame {
        let mut columns = self.columns.clone();
        let mut targets = Vec::with_capacity(added.len());
        for (name, _) in &added {
            match columns.iter().position(|c| c == name) {
                Some(i) => targets.push(i),
                None => {
                    columns.push(name.clone());
                    targets.push(columns.len() - 1);
                }
            }
        }

        let width = columns.len();
        let mut dates = Vec::with_capacity(rows.len());
        let mut out_rows = Vec::with_capacity(rows.len());
        for (k, &i) in rows.iter().enumerate() {
            let mut cells = self.rows[i].clone();
            cells.resize(width, String::new());
            for ((_, values), &target) in added.iter().zip(&targets) {
                cells[target] = values.get(k).cloned().unwrap_or_default();
            }
            dates.push(self.dates[i]);
            out_rows.push(cells);
        }

        Frame {
            date_column: self.date_column.clone(),
            columns,
            dates,
            rows: out_rows,
        }
    }

    /// Header names that appear more than once.
    pub fn duplicate_columns(columns: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        columns
            .iter()
            .filter(|c| !seen.insert(c.as_str()))
            .cloned()
            .collect()
    }
}
