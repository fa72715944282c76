use indexmap::IndexMap;

use crate::model::table::{Cell, Table, TableError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    ecotypes: IndexMap<String, Table>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ecotype: impl Into<String>, table: Table) {
        self.ecotypes.insert(ecotype.into(), table);
    }

    pub fn get(&self, ecotype: &str) -> Option<&Table> {
        self.ecotypes.get(ecotype)
    }

    /// Ecotypes with at least one term and the given column; the only ones
    /// worth offering for selection.
    pub fn populated_ecotypes(&self, required_column: &str) -> Vec<String> {
        self.ecotypes
            .iter()
            .filter(|(_, t)| !t.is_empty() && t.has_column(required_column))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ecotypes.len()
    }

    /// Column names offered by the settings widgets: those of the first
    /// ecotype holding any terms.
    pub fn columns(&self) -> Vec<String> {
        self.first_populated()
            .map(|t| t.columns().to_vec())
            .unwrap_or_default()
    }

    /// Columns numeric in every ecotype that has them.
    pub fn numeric_columns(&self) -> Vec<String> {
        let Some(first) = self.first_populated() else {
            return Vec::new();
        };
        first
            .numeric_columns()
            .into_iter()
            .filter(|c| {
                self.ecotypes
                    .values()
                    .all(|t| !t.has_column(c) || t.numeric_column(c).is_ok())
            })
            .collect()
    }

    fn first_populated(&self) -> Option<&Table> {
        self.ecotypes.values().find(|t| !t.is_empty())
    }

    pub fn n_terms(&self) -> usize {
        self.ecotypes.values().map(Table::n_rows).sum()
    }

    /// All ecotype tables stacked, tagged with their ecotype in `ecotype_column`.
    pub fn stacked(&self, ecotype_column: &str) -> Result<Table, TableError> {
        let mut parts = Vec::with_capacity(self.ecotypes.len());
        for (ecotype, table) in &self.ecotypes {
            let tags = vec![Cell::Text(ecotype.clone()); table.n_rows()];
            parts.push(table.clone().with_column(ecotype_column, tags)?);
        }
        Ok(Table::concat(&parts))
    }
}
