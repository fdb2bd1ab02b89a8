use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::index::DocMeta;
use crate::tokenizer::StemmerAlgorithm;
use crate::weighting::WeighingScheme;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    /// Scheme the stored weights were computed under.
    pub scheme: WeighingScheme,
    pub stemmer: StemmerAlgorithm,
    pub average_doc_length: f64,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    pub fn doc_weights(&self) -> PathBuf { self.root.join("docweights.bin") }
    pub fn dictionary(&self) -> PathBuf { self.root.join("dictionary") }
    pub fn terms(&self) -> PathBuf { self.root.join("terms.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// True when every file of a published index is present under `root`.
pub fn has_existing_index<P: AsRef<Path>>(root: P) -> bool {
    let paths = IndexPaths::new(root);
    paths.meta().is_file()
        && paths.postings().is_file()
        && paths.doc_weights().is_file()
        && paths.dictionary().is_dir()
        && paths.terms().is_file()
}

pub fn save_docs(paths: &IndexPaths, docs: &[DocMeta]) -> Result<()> {
    let mut f = BufWriter::new(File::create(paths.docs())?);
    bincode::serialize_into(&mut f, docs)?;
    f.flush()?;
    Ok(())
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocMeta>> {
    let f = BufReader::new(File::open(paths.docs())?);
    let docs = bincode::deserialize_from(f)?;
    Ok(docs)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    f.sync_all()?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Moves a fully written staging directory into place at `root`.
///
/// A previous index at `root` is first renamed aside and only deleted once the
/// new one is in place, so a failed publish leaves the old index readable.
pub fn publish(staging: &Path, root: &Path) -> Result<()> {
    if !root.exists() {
        fs::rename(staging, root)?;
        return Ok(());
    }
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    let backup = root.with_file_name(format!(".{name}.previous"));
    if backup.exists() {
        fs::remove_dir_all(&backup)?;
    }
    fs::rename(root, &backup)?;
    if let Err(e) = fs::rename(staging, root) {
        fs::rename(&backup, root)?;
        return Err(e.into());
    }
    discard_backup(&backup);
    Ok(())
}

// The new index is already live, so a leftover backup is only logged.
fn discard_backup(backup: &Path) {
    if let Err(e) = fs::remove_dir_all(backup) {
        tracing::warn!(backup = %backup.display(), error = %e, "could not remove previous index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta() -> MetaFile {
        MetaFile {
            num_docs: 3,
            created_at: "2024-01-01T00:00:00Z".into(),
            version: FORMAT_VERSION,
            scheme: WeighingScheme::Wacky,
            stemmer: StemmerAlgorithm::English,
            average_doc_length: 4.5,
        }
    }

    #[test]
    fn meta_round_trips_with_scheme_stamp() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_meta(&paths, &meta()).unwrap();
        let raw = fs::read_to_string(paths.meta()).unwrap();
        assert!(raw.contains("\"scheme\": \"wacky\""));
        assert_eq!(load_meta(&paths).unwrap(), meta());
    }

    #[test]
    fn docs_round_trip() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let docs = vec![
            DocMeta { title: "a".into(), byte_size: 10 },
            DocMeta { title: "b".into(), byte_size: 0 },
        ];
        save_docs(&paths, &docs).unwrap();
        assert_eq!(load_docs(&paths).unwrap(), docs);
    }

    #[test]
    fn publish_replaces_previous_index() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("index");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("old.txt"), "old").unwrap();

        let staging = dir.path().join("staging");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("new.txt"), "new").unwrap();

        publish(&staging, &root).unwrap();
        assert!(root.join("new.txt").exists());
        assert!(!root.join("old.txt").exists());
        assert!(!staging.exists());
        assert!(!dir.path().join(".index.previous").exists());
    }

    #[test]
    fn backup_cleanup_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        // removing a backup that is already gone fails inside and is only logged
        discard_backup(&dir.path().join(".index.previous"));
        assert!(dir.path().exists());
    }

    #[test]
    fn incomplete_directory_is_not_an_index() {
        let dir = tempdir().unwrap();
        assert!(!has_existing_index(dir.path()));
        save_meta(&IndexPaths::new(dir.path()), &meta()).unwrap();
        assert!(!has_existing_index(dir.path()));
    }
}
