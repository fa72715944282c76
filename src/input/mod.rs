use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;

pub mod patterns;
pub mod script;

use crate::model::collection::Collection;
use crate::model::table::{Cell, Table};
use crate::session::Upload;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid collection: {0}")]
    InvalidCollection(String),
    #[error("invalid subset file: {0}")]
    InvalidSubsets(String),
    #[error("invalid session script: {0}")]
    InvalidScript(String),
}

/// Turns an uploaded blob into a collection.
pub trait CollectionDecoder {
    fn decode(&self, upload: &Upload) -> Result<Collection, InputError>;
}

/// `{ "<ecotype>": [ { "<column>": value, ... }, ... ] }`, plain or gzip.
#[derive(Debug, Clone)]
pub struct JsonCollectionDecoder {
    pub required_columns: Vec<String>,
}

impl Default for JsonCollectionDecoder {
    fn default() -> Self {
        Self {
            required_columns: vec!["Term".to_string(), "CellType".to_string()],
        }
    }
}

impl CollectionDecoder for JsonCollectionDecoder {
    fn decode(&self, upload: &Upload) -> Result<Collection, InputError> {
        let bytes = maybe_gunzip(&upload.bytes)?;
        let raw: IndexMap<String, Vec<IndexMap<String, Cell>>> = serde_json::from_slice(&bytes)?;
        if raw.is_empty() {
            return Err(InputError::InvalidCollection(format!(
                "{} holds no ecotypes",
                upload.name
            )));
        }

        let mut collection = Collection::new();
        for (ecotype, records) in raw {
            let table = Table::from_records(records);
            for column in &self.required_columns {
                if !table.is_empty() && !table.has_column(column) {
                    return Err(InputError::InvalidCollection(format!(
                        "ecotype {ecotype} is missing column {column}"
                    )));
                }
            }
            collection.insert(ecotype, table);
        }

        info!(
            source = %upload.name,
            ecotypes = collection.len(),
            terms = collection.n_terms(),
            "collection loaded"
        );
        Ok(collection)
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn maybe_gunzip(bytes: &[u8]) -> Result<Vec<u8>, InputError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}

pub fn read_upload(path: &Path) -> Result<Upload, InputError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload { name, bytes })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
