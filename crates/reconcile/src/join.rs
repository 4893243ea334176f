use std::cmp::Ordering;
use std::collections::HashMap;

use cluster::{Assignment, LinkAssignment};
use table::{RecordId, Table, TableError, Value};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::ReconcileError;

/// Cluster id column appended to every result table.
pub const CLUSTER_ID_COLUMN: &str = "cluster_id";
/// Confidence column appended to every result table.
pub const CONFIDENCE_COLUMN: &str = "confidence";
/// Prefix of canonical value columns: `canonical_<field>`.
pub const CANONICAL_PREFIX: &str = "canonical_";

pub fn canonical_column(field: &str) -> String {
    format!("{CANONICAL_PREFIX}{field}")
}

/// Left-outer-join assignment rows onto `original` by record id.
///
/// Every input row appears once, in its original position. Rows without
/// an assignment get null cluster, confidence and canonical cells.
pub fn join_assignments(
    original: &Table,
    rows: &[Assignment],
    canonical_fields: &[String],
) -> Result<Table, ReconcileError> {
    let mut by_id: HashMap<&RecordId, &Assignment> = HashMap::with_capacity(rows.len());
    for row in rows {
        if original.row_position(&row.record_id).is_none() {
            return Err(ReconcileError::UnknownRecord(row.record_id.clone()));
        }
        if by_id.insert(&row.record_id, row).is_some() {
            return Err(ReconcileError::DuplicateAssignment(row.record_id.clone()));
        }
    }

    let canonical_columns: Vec<String> =
        canonical_fields.iter().map(|f| canonical_column(f)).collect();
    for name in [CLUSTER_ID_COLUMN, CONFIDENCE_COLUMN]
        .into_iter()
        .chain(canonical_columns.iter().map(String::as_str))
    {
        if original.has_column(name) {
            return Err(ReconcileError::ColumnClash(name.to_string()));
        }
    }

    let lookup: Vec<Option<&Assignment>> = original
        .index()
        .iter()
        .map(|id| by_id.get(id).copied())
        .collect();

    let mut out = original.clone();
    out.push_column(
        CLUSTER_ID_COLUMN,
        lookup
            .iter()
            .map(|a| a.map(|a| a.cluster_id.to_value()).unwrap_or_default())
            .collect(),
    )?;
    out.push_column(
        CONFIDENCE_COLUMN,
        lookup
            .iter()
            .map(|a| a.map(|a| Value::Float(a.confidence)).unwrap_or_default())
            .collect(),
    )?;
    for (field, column) in canonical_fields.iter().zip(canonical_columns) {
        let values = lookup
            .iter()
            .map(|a| {
                a.and_then(|a| a.canonical.iter().find(|(name, _)| name == field))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        out.push_column(column, values)?;
    }

    debug!(
        rows = out.len(),
        matched = by_id.len(),
        canonical_columns = canonical_fields.len(),
        "assignments_joined"
    );
    Ok(out)
}

/// Result of a two-set link: tagged A rows then tagged B rows, each
/// carrying its pair's cluster id, stably sorted by cluster id with
/// unmatched rows last. Columns are the union of both tables.
pub fn stack_linked(
    left: &Table,
    right: &Table,
    links: &[LinkAssignment],
    canonical_fields: &[String],
) -> Result<Table, ReconcileError> {
    let mut a_rows = Vec::with_capacity(links.len());
    let mut b_rows = Vec::with_capacity(links.len());
    for link in links.iter().cloned() {
        let [a, b] = link.into_assignments();
        a_rows.push(a);
        b_rows.push(b);
    }

    let a = join_assignments(&Dataset::A.tag_table(left)?, &a_rows, canonical_fields)?;
    let b = join_assignments(&Dataset::B.tag_table(right)?, &b_rows, canonical_fields)?;
    sort_by_cluster(&a.concat(&b)?)
}

/// Stable sort on the cluster id column, nulls last.
pub fn sort_by_cluster(table: &Table) -> Result<Table, ReconcileError> {
    let pos = table
        .column_position(CLUSTER_ID_COLUMN)
        .ok_or_else(|| TableError::UnknownColumn(CLUSTER_ID_COLUMN.to_string()))?;
    let rows: Vec<(&RecordId, &[Value])> = table.rows().collect();
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&x, &y| compare_cluster_ids(&rows[x].1[pos], &rows[y].1[pos]));

    let mut out = Table::new(table.columns().iter().cloned())?;
    for i in order {
        let (id, row) = rows[i];
        out.push_row(id.clone(), row.to_vec())?;
    }
    Ok(out)
}

fn compare_cluster_ids(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        _ => a.render().cmp(&b.render()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster::ClusterId;

    fn people() -> Table {
        Table::from_rows(
            ["name", "city"],
            vec![
                vec![Value::from("Acme Corp"), Value::from("Berlin")],
                vec![Value::from("ACME corp."), Value::from("berlin")],
                vec![Value::from("Globex"), Value::Null],
            ],
        )
        .expect("table")
    }

    fn assignment(id: &str, cluster: usize, confidence: f64) -> Assignment {
        Assignment {
            record_id: RecordId::new(id),
            cluster_id: ClusterId::Seq(cluster),
            confidence,
            canonical: vec![("name".into(), Value::from("acme corp"))],
        }
    }

    #[test]
    fn left_join_preserves_rows_and_order() {
        let rows = vec![assignment("1", 0, 0.9), assignment("0", 0, 0.8)];
        let out = join_assignments(&people(), &rows, &["name".to_string()]).expect("join");

        assert_eq!(out.len(), 3);
        assert_eq!(out.index(), people().index());
        assert_eq!(
            out.columns(),
            &["name", "city", "cluster_id", "confidence", "canonical_name"]
        );
        let id = |s: &str| RecordId::new(s);
        assert_eq!(out.value(&id("0"), "name"), Some(&Value::from("Acme Corp")));
        assert_eq!(out.value(&id("0"), "cluster_id"), Some(&Value::Integer(0)));
        assert_eq!(out.value(&id("1"), "confidence"), Some(&Value::Float(0.9)));
        assert_eq!(out.value(&id("2"), "cluster_id"), Some(&Value::Null));
        assert_eq!(out.value(&id("2"), "canonical_name"), Some(&Value::Null));
        assert_eq!(
            out.value(&id("1"), "canonical_name"),
            Some(&Value::from("acme corp"))
        );
    }

    #[test]
    fn no_assignments_means_all_null() {
        let out = join_assignments(&people(), &[], &[]).expect("join");
        assert_eq!(out.len(), 3);
        assert!(out
            .column(CLUSTER_ID_COLUMN)
            .expect("column")
            .iter()
            .all(|v| v.is_null()));
    }

    #[test]
    fn rejects_bad_assignments() {
        let dup = vec![assignment("0", 0, 0.9), assignment("0", 1, 0.9)];
        assert!(matches!(
            join_assignments(&people(), &dup, &[]),
            Err(ReconcileError::DuplicateAssignment(_))
        ));
        let unknown = vec![assignment("9", 0, 0.9)];
        assert!(matches!(
            join_assignments(&people(), &unknown, &[]),
            Err(ReconcileError::UnknownRecord(_))
        ));
        let mut clash = people();
        clash
            .push_column("confidence", vec![Value::Null; 3])
            .expect("column");
        assert!(matches!(
            join_assignments(&clash, &[], &[]),
            Err(ReconcileError::ColumnClash(ref c)) if c == "confidence"
        ));
    }

    #[test]
    fn stacked_link_sorted_by_cluster_nulls_last() {
        let left = Table::from_rows(
            ["name"],
            vec![vec![Value::from("acme")], vec![Value::from("solo")], vec![Value::from("globex")]],
        )
        .expect("left");
        let right = Table::from_rows(
            ["name", "phone"],
            vec![vec![Value::from("globex"), Value::from("555")], vec![Value::from("acme"), Value::Null]],
        )
        .expect("right");
        let links = vec![
            LinkAssignment {
                cluster_id: 0,
                left: RecordId::new("dfa2"),
                right: RecordId::new("dfb0"),
                confidence: 0.9,
                canonical: Vec::new(),
            },
            LinkAssignment {
                cluster_id: 1,
                left: RecordId::new("dfa0"),
                right: RecordId::new("dfb1"),
                confidence: 0.8,
                canonical: Vec::new(),
            },
        ];

        let out = stack_linked(&left, &right, &links, &[]).expect("stack");
        let ids: Vec<&str> = out.index().iter().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["dfa2", "dfb0", "dfa0", "dfb1", "dfa1"]);
        assert_eq!(out.columns(), &["name", "cluster_id", "confidence", "phone"]);
        assert_eq!(out.value(&RecordId::new("dfa1"), "phone"), Some(&Value::Null));
        assert_eq!(out.len(), left.len() + right.len());
    }

    #[test]
    fn text_cluster_ids_sort_lexically() {
        assert_eq!(
            compare_cluster_ids(&Value::from("c1"), &Value::from("c2")),
            Ordering::Less
        );
        assert_eq!(compare_cluster_ids(&Value::Null, &Value::Integer(0)), Ordering::Greater);
    }
}
