//! In-memory tables.

use std::collections::{HashMap, HashSet};

use crate::error::TableError;
use crate::record::{Record, RecordSet};
use crate::value::{RecordId, Value};

/// Column-named, row-indexed table of [`Value`] cells.
///
/// Rows keep their insertion order and every row has exactly one cell per
/// column. Row ids are unique within a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    index: Vec<RecordId>,
    rows: Vec<Vec<Value>>,
    positions: HashMap<RecordId, usize>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(TableError::DuplicateColumn(c.clone()));
            }
        }
        Ok(Self {
            columns,
            ..Self::default()
        })
    }

    /// Table whose row ids are the 0-based row positions.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for (pos, row) in rows.into_iter().enumerate() {
            table.push_row(RecordId::from(pos), row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, id: RecordId, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::WidthMismatch {
                record: id,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        if self.positions.contains_key(&id) {
            return Err(TableError::DuplicateRecord(id));
        }
        self.positions.insert(id.clone(), self.index.len());
        self.index.push(id);
        self.rows.push(row);
        Ok(())
    }

    /// Append a column. `values` must have one entry per row.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if self.columns.contains(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::WidthMismatch {
                record: RecordId::new(format!("column:{name}")),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), TableError> {
        if from == to {
            return self.column_position(from).map(|_| ()).ok_or_else(|| {
                TableError::UnknownColumn(from.to_string())
            });
        }
        if self.columns.iter().any(|c| c == to) {
            return Err(TableError::DuplicateColumn(to.to_string()));
        }
        let pos = self
            .column_position(from)
            .ok_or_else(|| TableError::UnknownColumn(from.to_string()))?;
        self.columns[pos] = to.to_string();
        Ok(())
    }

    /// Same rows with every id passed through `f`. Fails if `f` maps two
    /// rows onto the same id.
    pub fn map_index<F>(&self, mut f: F) -> Result<Table, TableError>
    where
        F: FnMut(&RecordId) -> RecordId,
    {
        let mut out = Table::new(self.columns.iter().cloned())?;
        for (id, row) in self.rows() {
            out.push_row(f(id), row.to_vec())?;
        }
        Ok(out)
    }

    /// Same shape with every cell passed through `f(column, cell)`.
    pub fn try_map_cells<F, E>(&self, mut f: F) -> Result<Table, E>
    where
        F: FnMut(&str, &Value) -> Result<Value, E>,
    {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mapped = row
                .iter()
                .zip(&self.columns)
                .map(|(cell, col)| f(col, cell))
                .collect::<Result<Vec<_>, E>>()?;
            rows.push(mapped);
        }
        Ok(Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
            positions: self.positions.clone(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[RecordId] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    pub fn row_position(&self, id: &RecordId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn row(&self, pos: usize) -> Option<(&RecordId, &[Value])> {
        Some((self.index.get(pos)?, self.rows.get(pos)?.as_slice()))
    }

    pub fn rows(&self) -> impl Iterator<Item = (&RecordId, &[Value])> {
        self.index.iter().zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Cell at (`id`, `column`).
    pub fn value(&self, id: &RecordId, column: &str) -> Option<&Value> {
        let col = self.column_position(column)?;
        let row = *self.positions.get(id)?;
        self.rows[row].get(col)
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let col = self
            .column_position(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// One record per row, carrying every column.
    pub fn to_records(&self) -> Result<RecordSet, TableError> {
        let mut set = RecordSet::new();
        for (id, row) in self.rows() {
            let record: Record = self
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            set.insert(id.clone(), record)?;
        }
        Ok(set)
    }

    /// Rows of `self` followed by rows of `other`; columns are the union in
    /// first-seen order, missing cells are null.
    pub fn concat(&self, other: &Table) -> Result<Table, TableError> {
        let mut columns = self.columns.clone();
        for c in &other.columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
        let mut out = Table::new(columns.clone())?;
        for source in [self, other] {
            let positions: Vec<Option<usize>> =
                columns.iter().map(|c| source.column_position(c)).collect();
            for (id, row) in source.rows() {
                let cells = positions
                    .iter()
                    .map(|p| p.map(|p| row[p].clone()).unwrap_or_default())
                    .collect();
                out.push_row(id.clone(), cells)?;
            }
        }
        Ok(out)
    }
}
