use table::{RecordId, Table};

use crate::error::ReconcileError;

/// Origin of a row in a two-table workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// The first (primary) table.
    A,
    /// The second (secondary) table.
    B,
}

impl Dataset {
    pub fn prefix(&self) -> &'static str {
        match self {
            Dataset::A => "dfa",
            Dataset::B => "dfb",
        }
    }

    /// Re-index a table so every row id carries this dataset's prefix.
    pub fn tag_table(&self, table: &Table) -> Result<Table, ReconcileError> {
        let prefix = self.prefix();
        Ok(table.map_index(|id| id.prefixed(prefix))?)
    }

    /// Dataset and original id of a tagged row id.
    pub fn of(id: &RecordId) -> Option<(Dataset, RecordId)> {
        [Dataset::A, Dataset::B]
            .into_iter()
            .find_map(|d| id.strip_prefix(d.prefix()).map(|orig| (d, orig)))
    }

    /// Like [`Dataset::of`] but an untagged id is an error.
    pub fn require(id: &RecordId) -> Result<(Dataset, RecordId), ReconcileError> {
        Dataset::of(id).ok_or_else(|| ReconcileError::UntaggedRow(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table::Value;

    #[test]
    fn tags_and_untags() {
        let t = Table::from_rows(["name"], vec![vec![Value::from("x")], vec![Value::from("y")]])
            .expect("table");
        let tagged = Dataset::B.tag_table(&t).expect("tag");
        let ids: Vec<&str> = tagged.index().iter().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["dfb0", "dfb1"]);

        assert_eq!(
            Dataset::of(&RecordId::new("dfa12")),
            Some((Dataset::A, RecordId::new("12")))
        );
        assert_eq!(Dataset::of(&RecordId::new("12")), None);
        assert!(matches!(
            Dataset::require(&RecordId::new("x1")),
            Err(ReconcileError::UntaggedRow(_))
        ));
    }
}
