use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    List(Vec<String>),
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Missing => Some(f64::NAN),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::List(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::List(items) => f.write_str(&items.join(", ")),
            Cell::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unknown column: {0}")]
    MissingColumn(String),
    #[error("column {column} is not numeric (row {row})")]
    NotNumeric { column: String, row: usize },
    #[error("row has {got} cells, table has {expected} columns")]
    RowWidth { expected: usize, got: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from row records. Columns are the union of record keys
    /// in first-seen order; absent keys become `Cell::Missing`.
    pub fn from_records(records: Vec<IndexMap<String, Cell>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        let mut rows = Vec::with_capacity(records.len());
        for mut record in records {
            let row = columns
                .iter()
                .map(|c| record.shift_remove(c).unwrap_or(Cell::Missing))
                .collect();
            rows.push(row);
        }
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.rows[row][column]
    }

    /// Missing cells read as NaN.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self.column_index(name)?;
        let mut out = Vec::with_capacity(self.rows.len());
        for (row, cells) in self.rows.iter().enumerate() {
            let v = cells[idx].as_f64().ok_or_else(|| TableError::NotNumeric {
                column: name.to_string(),
                row,
            })?;
            out.push(v);
        }
        Ok(out)
    }

    /// Columns every cell of which reads as a number (missing included).
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().all(|r| r[*idx].as_f64().is_some()))
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn string_column(&self, name: &str) -> Result<Vec<String>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].to_string()).collect())
    }

    /// Distinct string values in order of first appearance.
    pub fn unique_strings(&self, name: &str) -> Result<Vec<String>, TableError> {
        let mut seen = indexmap::IndexSet::new();
        for value in self.string_column(name)? {
            seen.insert(value);
        }
        Ok(seen.into_iter().collect())
    }

    /// Finite (min, max) of a numeric column, `None` when it has no finite values.
    pub fn min_max(&self, name: &str) -> Result<Option<(f64, f64)>, TableError> {
        let values = self.numeric_column(name)?;
        let mut out: Option<(f64, f64)> = None;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            out = Some(match out {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        Ok(out)
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    pub fn filter_eq(&self, name: &str, value: &str) -> Result<Table, TableError> {
        let values = self.string_column(name)?;
        let keep: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_str() == value)
            .map(|(i, _)| i)
            .collect();
        Ok(self.select_rows(&keep))
    }

    /// Appends `name`, or replaces it when the column already exists.
    pub fn with_column(mut self, name: &str, cells: Vec<Cell>) -> Result<Table, TableError> {
        if cells.len() != self.rows.len() {
            return Err(TableError::RowWidth {
                expected: self.rows.len(),
                got: cells.len(),
            });
        }
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        Ok(self)
    }

    /// Row-wise concatenation; columns are unioned in first-seen order.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for t in tables {
            for c in &t.columns {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
        }
        let mut rows = Vec::new();
        for t in tables {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|c| t.columns.iter().position(|x| x == c))
                .collect();
            for r in &t.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map(|i| r[i].clone()).unwrap_or(Cell::Missing))
                        .collect(),
                );
            }
        }
        Table { columns, rows }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/table.rs"]
mod tests;
