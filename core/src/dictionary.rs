//! Term → postings offset map backed by sled.
//!
//! Keys are the UTF-8 term bytes, so sled's byte order is the lexicographic term
//! order. Values are big-endian i64 offsets into `postings.bin`. sled holds an
//! exclusive lock on the directory, so only the build opens it; readers load the
//! [`DictionarySnapshot`] published next to it instead.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Start from an empty store, destroying any previous one at the path.
    Create,
    /// Open (or create) a store and allow upserts.
    Write,
    /// Lookups and ordered iteration only.
    Read,
}

pub struct TermDictionary {
    db: sled::Db,
    path: PathBuf,
    mode: OpenMode,
}

impl TermDictionary {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match mode {
            OpenMode::Create => {
                if path.exists() {
                    fs::remove_dir_all(&path)?;
                }
            }
            OpenMode::Read => {
                if !path.exists() {
                    return Err(IndexError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no term dictionary at {}", path.display()),
                    )));
                }
            }
            OpenMode::Write => {}
        }
        let db = sled::Config::new().path(&path).open()?;
        tracing::debug!(path = %path.display(), ?mode, "opened term dictionary");
        Ok(Self { db, path, mode })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Inserts or replaces the offset for `term`.
    pub fn put(&self, term: &str, offset: i64) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Err(IndexError::ReadOnly(self.path.display().to_string()));
        }
        self.db.insert(term.as_bytes(), offset.to_be_bytes().to_vec())?;
        Ok(())
    }

    pub fn get(&self, term: &str) -> Result<i64> {
        match self.db.get(term.as_bytes())? {
            Some(value) => decode_offset(term, &value),
            None => Err(IndexError::TermNotFound(term.to_string())),
        }
    }

    pub fn contains(&self, term: &str) -> Result<bool> {
        Ok(self.db.contains_key(term.as_bytes())?)
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Terms in ascending order, produced lazily.
    pub fn keys(&self) -> impl Iterator<Item = Result<String>> + '_ {
        self.db.iter().keys().map(|key| {
            let key = key?;
            String::from_utf8(key.to_vec()).map_err(|e| {
                IndexError::corrupt(0, format!("dictionary key is not UTF-8: {e}"))
            })
        })
    }

    /// Copies every entry, in term order, into an immutable snapshot.
    pub fn snapshot(&self) -> Result<DictionarySnapshot> {
        let mut entries = Vec::with_capacity(self.len());
        for item in self.db.iter() {
            let (key, value) = item?;
            let term = String::from_utf8(key.to_vec()).map_err(|e| {
                IndexError::corrupt(0, format!("dictionary key is not UTF-8: {e}"))
            })?;
            let offset = decode_offset(&term, &value)?;
            entries.push((term, offset));
        }
        Ok(DictionarySnapshot { entries })
    }

    /// Flushes pending writes. Must be called before a reader opens the same path.
    pub fn close(self) -> Result<()> {
        if self.mode != OpenMode::Read {
            self.db.flush()?;
        }
        tracing::debug!(path = %self.path.display(), "closed term dictionary");
        Ok(())
    }
}

/// Read-only, sorted copy of the dictionary published as `terms.bin`.
///
/// Loading it takes no lock, so any number of readers may share one index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionarySnapshot {
    entries: Vec<(String, i64)>,
}

impl DictionarySnapshot {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut f = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut f, &self.entries)?;
        f.flush()?;
        f.get_ref().sync_all()?;
        Ok(())
    }

    /// Loads a snapshot, rejecting one whose terms are not strictly ascending.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = BufReader::new(File::open(path)?);
        let entries: Vec<(String, i64)> = bincode::deserialize_from(f)?;
        if let Some(i) = entries.windows(2).position(|w| w[0].0 >= w[1].0) {
            return Err(IndexError::corrupt(
                0,
                format!("term dictionary out of order at entry {}", i + 1),
            ));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, term: &str) -> Result<i64> {
        self.entries
            .binary_search_by(|(t, _)| t.as_str().cmp(term))
            .map(|at| self.entries[at].1)
            .map_err(|_| IndexError::TermNotFound(term.to_string()))
    }

    pub fn contains(&self, term: &str) -> bool {
        self.get(term).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Terms in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }
}

fn decode_offset(term: &str, value: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| {
        IndexError::corrupt(0, format!("offset for '{term}' is {} bytes, expected 8", value.len()))
    })?;
    Ok(i64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_get_and_ordered_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionary");
        let dict = TermDictionary::open(&path, OpenMode::Create).unwrap();
        dict.put("dog", 40).unwrap();
        dict.put("cat", 0).unwrap();
        dict.put("emu", 96).unwrap();
        dict.put("dog", 48).unwrap();
        dict.close().unwrap();

        let dict = TermDictionary::open(&path, OpenMode::Read).unwrap();
        assert_eq!(dict.get("dog").unwrap(), 48);
        assert_eq!(dict.len(), 3);
        let keys: Vec<String> = dict.keys().collect::<Result<_>>().unwrap();
        assert_eq!(keys, vec!["cat", "dog", "emu"]);
    }

    #[test]
    fn missing_term_is_not_found() {
        let dir = tempdir().unwrap();
        let dict = TermDictionary::open(dir.path().join("d"), OpenMode::Create).unwrap();
        let err = dict.get("nothing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn read_mode_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d");
        TermDictionary::open(&path, OpenMode::Create).unwrap().close().unwrap();
        let dict = TermDictionary::open(&path, OpenMode::Read).unwrap();
        assert!(matches!(dict.put("x", 1), Err(IndexError::ReadOnly(_))));
    }

    #[test]
    fn read_mode_requires_existing_store() {
        let dir = tempdir().unwrap();
        assert!(TermDictionary::open(dir.path().join("absent"), OpenMode::Read).is_err());
    }

    #[test]
    fn create_discards_previous_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d");
        let dict = TermDictionary::open(&path, OpenMode::Create).unwrap();
        dict.put("old", 1).unwrap();
        dict.close().unwrap();

        let dict = TermDictionary::open(&path, OpenMode::Create).unwrap();
        assert!(dict.is_empty());
        assert!(!dict.contains("old").unwrap());
    }

    #[test]
    fn snapshot_preserves_order_and_offsets() {
        let dir = tempdir().unwrap();
        let dict = TermDictionary::open(dir.path().join("d"), OpenMode::Create).unwrap();
        dict.put("emu", 96).unwrap();
        dict.put("cat", 0).unwrap();
        dict.put("dog", 40).unwrap();
        let snapshot = dict.snapshot().unwrap();
        dict.close().unwrap();

        let path = dir.path().join("terms.bin");
        snapshot.save(&path).unwrap();
        let loaded = DictionarySnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["cat", "dog", "emu"]);
        assert_eq!(loaded.get("dog").unwrap(), 40);
        assert!(loaded.get("ant").unwrap_err().is_not_found());
        assert!(!loaded.contains("zebra"));
    }

    #[test]
    fn unsorted_snapshot_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("terms.bin");
        let entries = vec![("dog".to_string(), 4i64), ("cat".to_string(), 0i64)];
        fs::write(&path, bincode::serialize(&entries).unwrap()).unwrap();
        assert!(matches!(
            DictionarySnapshot::load(&path),
            Err(IndexError::CorruptData { .. })
        ));
    }
}
