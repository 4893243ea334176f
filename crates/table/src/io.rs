//! CSV import/export.
//!
//! Empty CSV fields load as [`Value::Null`]; everything else loads as raw
//! text. Normalization is a separate stage.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::TableError;
use crate::frame::Table;
use crate::value::{RecordId, Value};

/// Load a table from CSV with a header row.
///
/// If `index_column` names a header, that column becomes the row index and
/// is dropped from the data columns; otherwise rows are indexed by position.
pub fn read_csv<R: Read>(reader: R, index_column: Option<&str>) -> Result<Table, TableError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let index_pos = match index_column {
        Some(name) => Some(
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?,
        ),
        None => None,
    };

    let columns: Vec<&String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != index_pos)
        .map(|(_, h)| h)
        .collect();
    let mut table = Table::new(columns.iter().map(|c| c.as_str()))?;

    for (pos, row) in rdr.records().enumerate() {
        let row = row?;
        let id = match index_pos {
            Some(i) => RecordId::from(row.get(i).unwrap_or_default()),
            None => RecordId::from(pos),
        };
        let cells = row
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != index_pos)
            .map(|(_, field)| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::from(field)
                }
            })
            .collect();
        table.push_row(id, cells)?;
    }

    Ok(table)
}

pub fn read_csv_path(path: impl AsRef<Path>, index_column: Option<&str>) -> Result<Table, TableError> {
    read_csv(File::open(path)?, index_column)
}

/// Write a table as CSV. When `index_header` is set the row ids are written
/// as a leading column under that header.
pub fn write_csv<W: Write>(
    table: &Table,
    writer: W,
    index_header: Option<&str>,
) -> Result<(), TableError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = Vec::with_capacity(table.width() + 1);
    if let Some(h) = index_header {
        header.push(h);
    }
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (id, row) in table.rows() {
        let mut out: Vec<String> = Vec::with_capacity(row.len() + 1);
        if index_header.is_some() {
            out.push(id.to_string());
        }
        out.extend(row.iter().map(|v| v.render().unwrap_or_default()));
        wtr.write_record(&out)?;
    }

    wtr.flush()?;
    Ok(())
}
