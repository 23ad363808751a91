use crate::data::{compare_values, format_number, Table};
use crate::error::Result;
use std::collections::HashMap;

/// Statistic applied to the value column of each group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
    /// Number of rows per group; the output column is named `count`
    Count,
}

/// Group rows by `keys` and reduce `value` per group.
///
/// The result has one row per distinct key tuple, sorted by key (numerically
/// where the key cells are numbers), with columns `keys..., value`. Blank
/// value cells are skipped, so a group made only of blanks has a mean of 0.
pub fn group_by(table: &Table, keys: &[&str], value: &str, agg: Aggregate) -> Result<Table> {
    let key_cols = keys
        .iter()
        .map(|k| table.column(k))
        .collect::<Result<Vec<_>>>()?;
    let value_col = match agg {
        Aggregate::Count => None,
        _ => Some(table.column(value)?),
    };

    // (sum, non-blank count, row count) per key tuple
    let mut groups: HashMap<Vec<String>, (f64, usize, usize)> = HashMap::new();
    for idx in 0..table.len() {
        let key: Vec<String> = key_cols
            .iter()
            .map(|&c| table.cell(idx, c).to_string())
            .collect();
        let entry = groups.entry(key).or_insert((0.0, 0, 0));
        entry.2 += 1;
        if let Some(col) = value_col {
            if let Some(v) = table.number(idx, col)? {
                entry.0 += v;
                entry.1 += 1;
            }
        }
    }

    let mut ordered: Vec<(Vec<String>, (f64, usize, usize))> = groups.into_iter().collect();
    ordered.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut headers: Vec<String> = key_cols.iter().map(|&c| table.headers[c].clone()).collect();
    headers.push(match agg {
        Aggregate::Count => "count".to_string(),
        _ => table.headers[value_col.unwrap_or_default()].clone(),
    });

    let rows = ordered
        .into_iter()
        .map(|(mut key, (sum, n, rows))| {
            let reduced = match agg {
                Aggregate::Sum => sum,
                Aggregate::Mean if n > 0 => sum / n as f64,
                Aggregate::Mean => 0.0,
                Aggregate::Count => rows as f64,
            };
            key.push(format_number(reduced));
            key
        })
        .collect();

    Ok(Table::new(headers, rows))
}

/// Split rows by the value of `name`, keeping groups in order of first appearance
pub fn partition(table: &Table, name: &str) -> Result<Vec<(String, Table)>> {
    let col = table.column(name)?;
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    for row in &table.rows {
        let key = row.get(col).cloned().unwrap_or_default();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row.clone());
    }

    Ok(order
        .into_iter()
        .map(|key| {
            let rows = groups.remove(&key).unwrap_or_default();
            (key, Table::new(table.headers.clone(), rows))
        })
        .collect())
}
