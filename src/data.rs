use crate::error::{DashError, Result};
use std::cmp::Ordering;
use std::collections::HashSet;

/// An immutable, ordered table of string cells.
///
/// Cells are kept as they were read; numeric interpretation happens at the
/// point of use so that categorical and numeric columns share one
/// representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, matched case-insensitively
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
            .ok_or_else(|| DashError::ColumnNotFound(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    /// Numeric value of a cell. Blank cells are missing values, not errors.
    pub fn number(&self, row: usize, col: usize) -> Result<Option<f64>> {
        let raw = self.cell(row, col);
        if raw.trim().is_empty() {
            return Ok(None);
        }
        parse_number(raw).map(Some).ok_or_else(|| DashError::NotNumeric {
            column: self.headers[col].clone(),
            row: row + 1,
            value: raw.to_string(),
        })
    }

    /// Rows whose `name` cell equals `value` (numerically when both sides are numbers)
    pub fn filter_eq(&self, name: &str, value: &str) -> Result<Table> {
        let col = self.column(name)?;
        Ok(self.select(|row| same_value(row.get(col).map(String::as_str).unwrap_or(""), value)))
    }

    /// Rows whose numeric `name` cell lies within `[lo, hi]`
    pub fn filter_range(&self, name: &str, lo: f64, hi: f64) -> Result<Table> {
        let col = self.column(name)?;
        let mut rows = Vec::new();
        for idx in 0..self.rows.len() {
            if let Some(v) = self.number(idx, col)? {
                if lo <= v && v <= hi {
                    rows.push(self.rows[idx].clone());
                }
            }
        }
        Ok(Table::new(self.headers.clone(), rows))
    }

    /// Distinct values of a column in order of first appearance
    pub fn distinct(&self, name: &str) -> Result<Vec<String>> {
        let col = self.column(name)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let v = row.get(col).cloned().unwrap_or_default();
            if seen.insert(v.clone()) {
                out.push(v);
            }
        }
        Ok(out)
    }

    /// Observed minimum and maximum of a numeric column
    pub fn min_max(&self, name: &str) -> Result<(f64, f64)> {
        let col = self.column(name)?;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for idx in 0..self.rows.len() {
            if let Some(v) = self.number(idx, col)? {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min > max {
            return Err(DashError::EmptyColumn(name.to_string()));
        }
        Ok((min, max))
    }

    fn select<F: Fn(&[String]) -> bool>(&self, keep: F) -> Table {
        Table::new(
            self.headers.clone(),
            self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        )
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Cell equality that treats `1980` and `1980.0` as the same value
pub fn same_value(a: &str, b: &str) -> bool {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Orders numerically when both cells are numbers, lexically otherwise
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Render an aggregate back into a cell, dropping a redundant `.0`
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
