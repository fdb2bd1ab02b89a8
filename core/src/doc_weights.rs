//! Fixed-width per-document records in `docweights.bin`.
//!
//! Record `n` starts at `n * RECORD_SIZE`:
//!
//! ```text
//! L_d: f64 | length in tokens: i64 | byte size: i64 | average tf: i32
//! ```
//!
//! A single f64 follows the last record: the corpus-wide average document length.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::DocId;

pub const RECORD_SIZE: u64 = 8 + 8 + 8 + 4;
const TRAILER_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentWeight {
    pub normalization: f64,
    pub length: i64,
    pub byte_size: i64,
    pub average_tf: i32,
}

impl DocumentWeight {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_f64::<LittleEndian>(self.normalization)?;
        w.write_i64::<LittleEndian>(self.length)?;
        w.write_i64::<LittleEndian>(self.byte_size)?;
        w.write_i32::<LittleEndian>(self.average_tf)?;
        Ok(())
    }

    fn read_from<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            normalization: r.read_f64::<LittleEndian>()?,
            length: r.read_i64::<LittleEndian>()?,
            byte_size: r.read_i64::<LittleEndian>()?,
            average_tf: r.read_i32::<LittleEndian>()?,
        })
    }
}

/// Writes records in document order, then the trailer on `finish`.
pub struct DocWeightsWriter<W: Write> {
    inner: W,
    next_doc: DocId,
}

impl<W: Write> DocWeightsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, next_doc: 0 }
    }

    /// Appends the record for `doc_id`, which must be the next id in sequence.
    pub fn write(&mut self, doc_id: DocId, weight: &DocumentWeight) -> Result<()> {
        if doc_id != self.next_doc {
            return Err(IndexError::InvalidInput(format!(
                "document weights must be written in order: expected {}, got {doc_id}",
                self.next_doc
            )));
        }
        weight.write_to(&mut self.inner)?;
        self.next_doc += 1;
        Ok(())
    }

    pub fn finish(mut self, average_doc_length: f64) -> Result<W> {
        self.inner.write_f64::<LittleEndian>(average_doc_length)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Read side of `docweights.bin`, addressed directly by document id.
#[derive(Debug, Clone)]
pub struct DocWeightsStore {
    path: PathBuf,
    count: u64,
}

impl DocWeightsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = fs::metadata(&path)?.len();
        if len < TRAILER_SIZE || (len - TRAILER_SIZE) % RECORD_SIZE != 0 {
            return Err(IndexError::corrupt(
                0,
                format!("document weight store of {len} bytes is not a whole number of records"),
            ));
        }
        Ok(Self {
            path,
            count: (len - TRAILER_SIZE) / RECORD_SIZE,
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn get(&self, doc_id: DocId) -> Result<DocumentWeight> {
        let offset = doc_id as u64 * RECORD_SIZE;
        if doc_id as u64 >= self.count {
            return Err(IndexError::corrupt(
                offset,
                format!("document {doc_id} outside store of {} records", self.count),
            ));
        }
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let record = DocumentWeight::read_from(&mut BufReader::new(file))?;
        Ok(record)
    }

    pub fn average_doc_length(&self) -> Result<f64> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.count * RECORD_SIZE))?;
        Ok(file.read_f64::<LittleEndian>()?)
    }
}
