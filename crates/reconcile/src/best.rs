use std::collections::HashMap;

use table::{RecordId, Table, TableError, Value};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::ReconcileError;
use crate::join::CLUSTER_ID_COLUMN;

/// Best-single-match left join of `primary` (A) with `secondary` (B).
///
/// `deduped` is the self-match result over both tables stacked together,
/// each row id tagged with its [`Dataset`] prefix and carrying a cluster id
/// column. The output keeps every primary row in order with its original
/// id and columns, the result columns the dedupe run added, and the
/// secondary columns A lacks, taken from the single B row of the same
/// cluster with the fewest nulls. Ties go to the earliest B row. Secondary
/// columns that are null in every kept B row are dropped, and so are B's
/// result columns.
pub fn best_single_match(
    primary: &Table,
    secondary: &Table,
    deduped: &Table,
) -> Result<Table, ReconcileError> {
    let cluster_pos = deduped
        .column_position(CLUSTER_ID_COLUMN)
        .ok_or_else(|| TableError::UnknownColumn(CLUSTER_ID_COLUMN.to_string()))?;

    let mut a_rows: HashMap<RecordId, &[Value]> = HashMap::new();
    let mut b_rows: Vec<&[Value]> = Vec::new();
    for (id, row) in deduped.rows() {
        match Dataset::require(id)? {
            (Dataset::A, original) => {
                a_rows.insert(original, row);
            }
            (Dataset::B, _) => b_rows.push(row),
        }
    }

    // Fewest nulls per cluster; strict comparison keeps the first on ties.
    let mut kept: Vec<(usize, &[Value])> = Vec::new();
    let mut by_cluster: HashMap<String, usize> = HashMap::new();
    for row in b_rows {
        let Some(key) = row[cluster_pos].render() else {
            continue;
        };
        let nulls = row.iter().filter(|v| v.is_null()).count();
        match by_cluster.get(&key) {
            Some(&slot) if nulls < kept[slot].0 => kept[slot] = (nulls, row),
            Some(_) => {}
            None => {
                by_cluster.insert(key, kept.len());
                kept.push((nulls, row));
            }
        }
    }

    let result_columns: Vec<(String, usize)> = deduped
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !primary.has_column(c) && !secondary.has_column(c))
        .map(|(pos, c)| (c.clone(), pos))
        .collect();

    let extra_columns: Vec<(String, usize)> = secondary
        .columns()
        .iter()
        .filter(|c| !primary.has_column(c))
        .filter_map(|c| deduped.column_position(c).map(|pos| (c.clone(), pos)))
        .filter(|(_, pos)| kept.iter().any(|(_, row)| !row[*pos].is_null()))
        .collect();

    let mut out = primary.clone();
    let a_lookup: Vec<Option<&[Value]>> = primary
        .index()
        .iter()
        .map(|id| a_rows.get(id).copied())
        .collect();

    for (name, pos) in &result_columns {
        let values = a_lookup
            .iter()
            .map(|row| row.map(|r| r[*pos].clone()).unwrap_or_default())
            .collect();
        out.push_column(name.clone(), values)?;
    }

    let matched_b: Vec<Option<&[Value]>> = a_lookup
        .iter()
        .map(|row| {
            row.and_then(|r| r[cluster_pos].render())
                .and_then(|key| by_cluster.get(&key))
                .map(|&slot| kept[slot].1)
        })
        .collect();
    for (name, pos) in &extra_columns {
        let values = matched_b
            .iter()
            .map(|row| row.map(|r| r[*pos].clone()).unwrap_or_default())
            .collect();
        out.push_column(name.clone(), values)?;
    }

    debug!(
        rows = out.len(),
        clusters = kept.len(),
        matched = matched_b.iter().filter(|m| m.is_some()).count(),
        extra_columns = extra_columns.len(),
        "best_single_match"
    );
    Ok(out)
}
