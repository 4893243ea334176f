use std::collections::HashMap;
use std::time::Instant;

use fields::{FieldSpec, FieldType};
use table::{Table, Value};
use tracing::{info, warn, Level};

use crate::config::NormalizeConfig;
use crate::error::NormalizeError;
use crate::text::normalize_text;
use crate::typed::{parse_lat_long, parse_price};

/// Normalize a single cell for a column of the given type.
///
/// Cells that are already typed (a `Float` in a Price column, a `LatLong`
/// in a LatLong column) pass through unchanged, which is what makes
/// normalizing a normalized table a no-op.
pub fn normalize_cell(
    column: &str,
    field_type: FieldType,
    value: &Value,
    cfg: &NormalizeConfig,
) -> Result<Value, NormalizeError> {
    match (field_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::Price, Value::Float(v)) if v.is_finite() => Ok(Value::Float(*v)),
        (FieldType::Price, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (FieldType::LatLong, Value::LatLong(lat, lon)) => Ok(Value::LatLong(*lat, *lon)),
        (ty, other) => {
            let raw = other.render().unwrap_or_default();
            let text = normalize_text(&raw, cfg);
            match ty {
                FieldType::Price => parse_price(column, text.as_deref()),
                FieldType::LatLong => parse_lat_long(column, text.as_deref()),
                _ => Ok(text.map(Value::Text).unwrap_or(Value::Null)),
            }
        }
    }
}

/// Normalize every cell of `table`.
///
/// Columns named in `fields` use that field's type; every other column is
/// treated as a plain string column. The result has the same columns, row
/// ids and row order as the input.
pub fn normalize_table(
    table: &Table,
    fields: &[FieldSpec],
    cfg: &NormalizeConfig,
) -> Result<Table, NormalizeError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::DEBUG,
        "normalize.table",
        rows = table.len(),
        columns = table.width()
    );
    let _guard = span.enter();

    match normalize_table_inner(table, fields, cfg) {
        Ok(out) => {
            info!(
                rows = out.len(),
                columns = out.width(),
                typed_fields = fields.iter().filter(|f| !f.field_type.is_textual()).count(),
                elapsed_micros = start.elapsed().as_micros(),
                "normalize_success"
            );
            Ok(out)
        }
        Err(err) => {
            warn!(
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "normalize_failure"
            );
            Err(err)
        }
    }
}

fn normalize_table_inner(
    table: &Table,
    fields: &[FieldSpec],
    cfg: &NormalizeConfig,
) -> Result<Table, NormalizeError> {
    cfg.validate()?;

    let mut types: HashMap<&str, FieldType> = HashMap::with_capacity(fields.len());
    for f in fields {
        if !table.has_column(&f.name) {
            return Err(NormalizeError::UnknownColumn(f.name.clone()));
        }
        types.insert(f.name.as_str(), f.field_type);
    }

    table.try_map_cells(|column, cell| {
        let ty = types.get(column).copied().unwrap_or(FieldType::String);
        normalize_cell(column, ty, cell, cfg)
    })
}
