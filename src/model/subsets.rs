use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

use crate::model::table::{Cell, Table, TableError};

/// Reserved default label; also assigned to rows no pattern matches.
pub const SENTINEL: &str = "None";

/// Preferred name of the column holding each row's label.
pub const LABEL_COLUMN: &str = "Subset";

/// Label column name for `table`: `LABEL_COLUMN`, or the first free
/// `Subset_<n>` when the data already has a column of that name.
pub fn label_column(table: &Table) -> String {
    if !table.has_column(LABEL_COLUMN) {
        return LABEL_COLUMN.to_string();
    }
    (1usize..)
        .map(|n| format!("{LABEL_COLUMN}_{n}"))
        .find(|name| !table.has_column(name))
        .unwrap_or_else(|| LABEL_COLUMN.to_string())
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(label: &str, source: String) -> Option<Self> {
        let regex = match Regex::new(&source) {
            Ok(re) => re,
            Err(err) => {
                warn!(label, pattern = %source, %err, "invalid regex; matching it literally");
                match Regex::new(&regex::escape(&source)) {
                    Ok(re) => re,
                    Err(err) => {
                        warn!(label, pattern = %source, %err, "pattern skipped");
                        return None;
                    }
                }
            }
        };
        Some(Self { source, regex })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankQuery<'a> {
    pub x: &'a str,
    pub y: &'a str,
    pub x_threshold: f64,
    pub y_threshold: f64,
    pub per_label_limit: usize,
    pub global_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelTally {
    pub label: String,
    pub value: f64,
}

/// Ordered label -> pattern-set mapping. Insertion order decides which label
/// a row gets when several match.
#[derive(Debug, Clone, Default)]
pub struct SubsetRegistry {
    entries: IndexMap<String, Vec<Pattern>>,
}

impl PartialEq for SubsetRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.to_map() == other.to_map()
    }
}

impl SubsetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn patterns(&self, label: &str) -> Option<Vec<&str>> {
        self.entries
            .get(label)
            .map(|ps| ps.iter().map(|p| p.source.as_str()).collect())
    }

    pub fn to_map(&self) -> IndexMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(label, ps)| (label.clone(), ps.iter().map(|p| p.source.clone()).collect()))
            .collect()
    }

    /// Empty patterns remove `label`. A real label displaces the sentinel; the
    /// sentinel is only kept while it is the sole label.
    pub fn add_or_update(&mut self, label: &str, patterns: Vec<String>) {
        let mut compiled: Vec<Pattern> = Vec::with_capacity(patterns.len());
        for source in patterns {
            if source.is_empty() || compiled.iter().any(|p| p.source == source) {
                continue;
            }
            if let Some(pattern) = Pattern::compile(label, source) {
                compiled.push(pattern);
            }
        }
        if compiled.is_empty() {
            self.remove(label);
            return;
        }
        if label == SENTINEL {
            if self.entries.keys().any(|k| k != SENTINEL) {
                self.entries.shift_remove(SENTINEL);
                return;
            }
        } else {
            self.entries.shift_remove(SENTINEL);
        }
        self.entries.insert(label.to_string(), compiled);
    }

    pub fn remove(&mut self, label: &str) {
        self.entries.shift_remove(label);
    }

    pub fn merge(&mut self, patterns_by_label: IndexMap<String, Vec<String>>) {
        for (label, patterns) in patterns_by_label {
            self.add_or_update(&label, patterns);
        }
    }

    pub fn label_for(&self, value: &str) -> &str {
        for (label, patterns) in &self.entries {
            if patterns.iter().any(|p| p.regex.is_match(value)) {
                return label;
            }
        }
        SENTINEL
    }

    pub fn classify(&self, table: &Table, reference_column: &str) -> Result<Vec<String>, TableError> {
        let values = table.string_column(reference_column)?;
        Ok(values
            .iter()
            .map(|v| self.label_for(v).to_string())
            .collect())
    }

    /// Per-label tallies in registry order, the sentinel last when it has rows.
    pub fn count_by_label(
        &self,
        table: &Table,
        reference_column: &str,
        normalize: bool,
    ) -> Result<Vec<LabelTally>, TableError> {
        let labels = self.classify(table, reference_column)?;
        let mut counts: IndexMap<&str, usize> =
            self.entries.keys().map(|k| (k.as_str(), 0usize)).collect();
        for label in &labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        let total = labels.len();
        Ok(counts
            .into_iter()
            .map(|(label, count)| LabelTally {
                label: label.to_string(),
                value: if normalize {
                    if total == 0 {
                        0.0
                    } else {
                        count as f64 / total as f64
                    }
                } else {
                    count as f64
                },
            })
            .collect())
    }

    /// Returns the kept rows with their labels appended under `label_column(table)`.
    pub fn filter_and_rank(
        &self,
        table: &Table,
        reference_column: &str,
        query: &RankQuery<'_>,
    ) -> Result<Table, TableError> {
        let labels = self.classify(table, reference_column)?;
        let xs = table.numeric_column(query.x)?;
        let ys = table.numeric_column(query.y)?;

        let keep = if query.per_label_limit > 0 {
            let mut groups: IndexMap<&str, Vec<usize>> = self
                .entries
                .keys()
                .map(|k| (k.as_str(), Vec::new()))
                .collect();
            for (row, label) in labels.iter().enumerate() {
                groups.entry(label.as_str()).or_default().push(row);
            }
            let mut keep = Vec::new();
            for (_, mut rows) in groups {
                rank_rows(&mut rows, &xs, &ys);
                rows.truncate(query.per_label_limit);
                keep.extend(rows);
            }
            keep
        } else {
            let mut keep: Vec<usize> = (0..table.n_rows())
                .filter(|&r| xs[r] > query.x_threshold && ys[r] > query.y_threshold)
                .collect();
            if let Some(limit) = query.global_limit {
                rank_rows(&mut keep, &xs, &ys);
                keep.truncate(limit);
            }
            keep
        };

        let cells = keep.iter().map(|&r| Cell::Text(labels[r].clone())).collect();
        table.select_rows(&keep).with_column(&label_column(table), cells)
    }

    /// Drops labels with fewer than `min_terms` rows above both thresholds.
    /// Returns the dropped labels in registry order.
    pub fn auto_drop(
        &mut self,
        table: &Table,
        reference_column: &str,
        query: &RankQuery<'_>,
        min_terms: usize,
    ) -> Result<Vec<String>, TableError> {
        if min_terms == 0 {
            return Ok(Vec::new());
        }
        let topmost = self.filter_and_rank(
            table,
            reference_column,
            &RankQuery {
                per_label_limit: 0,
                global_limit: None,
                ..*query
            },
        )?;
        let assigned = topmost.string_column(&label_column(table))?;
        let dropped: Vec<String> = self
            .entries
            .keys()
            .filter(|label| assigned.iter().filter(|a| a == label).count() < min_terms)
            .cloned()
            .collect();
        for label in &dropped {
            self.remove(label);
        }
        Ok(dropped)
    }
}

/// Sorts row indices by y descending, ties broken by x descending. NaN ranks last.
pub fn rank_rows(rows: &mut [usize], xs: &[f64], ys: &[f64]) {
    rows.sort_by(|&a, &b| {
        rank_key(ys[b])
            .total_cmp(&rank_key(ys[a]))
            .then_with(|| rank_key(xs[b]).total_cmp(&rank_key(xs[a])))
    });
}

fn rank_key(v: f64) -> f64 {
    if v.is_nan() { f64::NEG_INFINITY } else { v }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/subsets.rs"]
mod tests;
