use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("ecotype_viewer_input_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &[u8]) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents).unwrap();
}

fn gzip(contents: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(contents).unwrap();
    enc.finish().unwrap()
}

const COLLECTION: &str = r#"{
  "CE1": [
    {"Term": "HALLMARK_HYPOXIA", "CellType": "B.cells", "log2_score": 2.1, "log10_qval": 3.0, "Genes": ["VEGFA", "LDHA"]},
    {"Term": "KEGG_APOPTOSIS", "CellType": "B.cells", "log2_score": 0.4, "log10_qval": null}
  ],
  "CE2": [
    {"Term": "REACTOME_TRANSLATION", "CellType": "T.cells", "log2_score": 1.2, "log10_qval": 1.5}
  ]
}"#;

fn upload(name: &str, bytes: Vec<u8>) -> Upload {
    Upload {
        name: name.to_string(),
        bytes,
    }
}

#[test]
fn test_decode_plain_json() {
    let c = JsonCollectionDecoder::default()
        .decode(&upload("c.json", COLLECTION.as_bytes().to_vec()))
        .unwrap();
    assert_eq!(c.populated_ecotypes("CellType"), vec!["CE1", "CE2"]);
    assert_eq!(c.n_terms(), 3);
    let ce1 = c.get("CE1").unwrap();
    assert_eq!(
        ce1.columns(),
        &["Term", "CellType", "log2_score", "log10_qval", "Genes"]
    );
    assert_eq!(ce1.cell(0, 4).to_string(), "VEGFA, LDHA");
    assert!(ce1.numeric_column("log10_qval").unwrap()[1].is_nan());
}

#[test]
fn test_decode_gzip_json() {
    let plain = JsonCollectionDecoder::default()
        .decode(&upload("c.json", COLLECTION.as_bytes().to_vec()))
        .unwrap();
    let gz = JsonCollectionDecoder::default()
        .decode(&upload("c.json.gz", gzip(COLLECTION.as_bytes())))
        .unwrap();
    assert_eq!(plain, gz);
}

#[test]
fn test_decode_rejects_empty_collection() {
    let err = JsonCollectionDecoder::default()
        .decode(&upload("c.json", b"{}".to_vec()))
        .unwrap_err();
    assert!(matches!(err, InputError::InvalidCollection(_)));
}

#[test]
fn test_decode_rejects_missing_required_column() {
    let err = JsonCollectionDecoder::default()
        .decode(&upload("c.json", br#"{"CE1": [{"Term": "X"}]}"#.to_vec()))
        .unwrap_err();
    assert!(err.to_string().contains("CellType"));
}

#[test]
fn test_decode_rejects_malformed_json() {
    let err = JsonCollectionDecoder::default()
        .decode(&upload("c.json", b"not json".to_vec()))
        .unwrap_err();
    assert!(matches!(err, InputError::Json(_)));
}

#[test]
fn test_maybe_gunzip_passthrough() {
    assert_eq!(maybe_gunzip(b"abc").unwrap(), b"abc".to_vec());
    assert_eq!(maybe_gunzip(&gzip(b"abc")).unwrap(), b"abc".to_vec());
}

#[test]
fn test_read_upload_uses_file_name() {
    let dir = make_temp_dir();
    let path = dir.join("collection.json");
    write_file(&path, COLLECTION.as_bytes());
    let up = read_upload(&path).unwrap();
    assert_eq!(up.name, "collection.json");
    assert_eq!(up.bytes, COLLECTION.as_bytes());

    assert!(matches!(
        read_upload(&dir.join("absent.json")),
        Err(InputError::Io(_))
    ));
}
