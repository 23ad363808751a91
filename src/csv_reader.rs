use crate::data::Table;
use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use log::info;
use std::fs::File;
use std::io::Read;

/// Read a headed CSV stream into a table
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

/// Load a dataset from a local path or an `http(s)://` URL.
pub async fn load_source(source: &str) -> Result<Table> {
    let table = if is_remote(source) {
        let body = reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await?;
        read_csv(body.as_bytes())?
    } else {
        read_csv(File::open(source)?)?
    };

    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        source
    );
    Ok(table)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
