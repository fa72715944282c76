pub mod controls;
pub mod cycle;
pub mod explorer;
pub mod summary;
pub mod widgets;

use crate::model::table::Table;
use crate::render::Figure;
use crate::session::SessionStore;

/// A rendered view and the table behind it.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub name: String,
    pub figure: Figure,
    pub table: Table,
    pub show_table: bool,
}

/// Reads a value stored as `Option<T>` by a producer that may yield nothing.
pub(crate) fn stored<'a, T: 'static>(store: &'a SessionStore, key: &str) -> Option<&'a T> {
    store.get::<Option<T>>(key).and_then(Option::as_ref)
}

/// `columns` with `first` moved to the front when present.
pub(crate) fn ordered_options(columns: &[String], first: &str) -> Vec<String> {
    let mut out: Vec<String> = columns.iter().filter(|c| *c != first).cloned().collect();
    if columns.iter().any(|c| c == first) {
        out.insert(0, first.to_string());
    }
    out
}

/// `columns` preceded by the "no column" option.
pub(crate) fn optional_options(columns: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(columns.len() + 1);
    out.push(widgets::NO_COLUMN.to_string());
    out.extend(columns.iter().cloned());
    out
}

pub(crate) fn optional_choice(choice: Option<String>) -> Option<String> {
    choice.filter(|c| c != widgets::NO_COLUMN)
}
