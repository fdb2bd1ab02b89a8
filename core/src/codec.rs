//! Binary postings format.
//!
//! Each term's postings list is one contiguous block appended to `postings.bin`:
//!
//! ```text
//! df: i32
//! df times:
//!   doc id gap: i32     first absolute, then doc[i] - doc[i-1]
//!   weight: f64         w(d,t), one slot
//!   tf: i32
//!   tf times:
//!     position gap: i32 first absolute, then pos[j] - pos[j-1]
//! ```
//!
//! All values are little-endian. Decoding is stateless given an offset and every
//! field is bounds-checked, so a bad offset fails with `CorruptData` instead of
//! producing garbage postings.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::index::Posting;
use crate::{DocId, Position};

/// Number of f64 weight values stored per posting.
pub const WEIGHT_SLOTS: u64 = 1;

const INT_BYTES: u64 = 4;
const MIN_POSTING_BYTES: u64 = INT_BYTES + 8 * WEIGHT_SLOTS + INT_BYTES + INT_BYTES;

/// Appends postings blocks to a byte sink and tracks the running offset.
pub struct PostingsWriter<W: Write> {
    inner: W,
    cursor: u64,
}

impl<W: Write> PostingsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, cursor: 0 }
    }

    /// Offset the next block will start at.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Writes one term's postings and returns `(start_offset, bytes_written)`.
    pub fn write_postings(&mut self, postings: &[Posting]) -> Result<(u64, u64)> {
        let mut buf = Vec::with_capacity(encoded_len(postings));
        encode_block(postings, &mut buf)?;
        self.inner.write_all(&buf)?;
        let start = self.cursor;
        self.cursor += buf.len() as u64;
        Ok((start, buf.len() as u64))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn encoded_len(postings: &[Posting]) -> usize {
    let positions: usize = postings.iter().map(|p| p.positions.len()).sum();
    4 + postings.len() * (4 + 8 * WEIGHT_SLOTS as usize + 4) + positions * 4
}

fn to_i32(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| IndexError::InvalidInput(format!("{what} {value} does not fit in 32 bits")))
}

/// Gap-encodes a postings list into `out`.
///
/// The list must be sorted by document id without duplicates, and every posting
/// must carry its strictly ascending positions with `term_frequency` equal to
/// their count.
pub fn encode_block(postings: &[Posting], out: &mut Vec<u8>) -> Result<()> {
    let df = i32::try_from(postings.len())
        .map_err(|_| IndexError::InvalidInput("postings list too long".into()))?;
    out.write_i32::<LittleEndian>(df)?;

    let mut previous_doc: Option<DocId> = None;
    for posting in postings {
        let gap = match previous_doc {
            None => posting.doc_id,
            Some(prev) if posting.doc_id > prev => posting.doc_id - prev,
            Some(prev) => {
                return Err(IndexError::InvalidInput(format!(
                    "document ids not strictly ascending: {} after {}",
                    posting.doc_id, prev
                )))
            }
        };
        to_i32(posting.doc_id, "document id")?;
        out.write_i32::<LittleEndian>(gap as i32)?;
        out.write_f64::<LittleEndian>(posting.weight)?;

        if posting.term_frequency as usize != posting.positions.len() || posting.positions.is_empty() {
            return Err(IndexError::InvalidInput(format!(
                "document {} has tf {} but {} positions",
                posting.doc_id,
                posting.term_frequency,
                posting.positions.len()
            )));
        }
        out.write_i32::<LittleEndian>(to_i32(posting.term_frequency, "term frequency")?)?;

        let mut previous_pos: Option<Position> = None;
        for &pos in &posting.positions {
            let gap = match previous_pos {
                None => pos,
                Some(prev) if pos > prev => pos - prev,
                Some(prev) => {
                    return Err(IndexError::InvalidInput(format!(
                        "positions in document {} not strictly ascending: {} after {}",
                        posting.doc_id, pos, prev
                    )))
                }
            };
            to_i32(pos, "position")?;
            out.write_i32::<LittleEndian>(gap as i32)?;
            previous_pos = Some(pos);
        }
        previous_doc = Some(posting.doc_id);
    }
    Ok(())
}

/// Bounds-checked reader over one block.
struct BlockCursor<R> {
    inner: R,
    pos: u64,
    end: u64,
}

impl<R: Read> BlockCursor<R> {
    fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.pos)
    }

    fn ensure(&self, n: u64, what: &str) -> Result<()> {
        if self.remaining() < n {
            return Err(IndexError::corrupt(
                self.pos,
                format!("truncated {what}: need {n} bytes, {} left", self.remaining()),
            ));
        }
        Ok(())
    }

    fn read_i32(&mut self, what: &str) -> Result<i32> {
        self.ensure(INT_BYTES, what)?;
        let value = self
            .inner
            .read_i32::<LittleEndian>()
            .map_err(|e| eof_as_corrupt(e, self.pos, what))?;
        self.pos += INT_BYTES;
        Ok(value)
    }

    fn read_f64(&mut self, what: &str) -> Result<f64> {
        self.ensure(8, what)?;
        let value = self
            .inner
            .read_f64::<LittleEndian>()
            .map_err(|e| eof_as_corrupt(e, self.pos, what))?;
        self.pos += 8;
        Ok(value)
    }

    fn skip(&mut self, n: u64, what: &str) -> Result<()> {
        self.ensure(n, what)?;
        let skipped = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        if skipped != n {
            return Err(IndexError::corrupt(self.pos, format!("truncated {what}")));
        }
        self.pos += n;
        Ok(())
    }
}

fn eof_as_corrupt(err: io::Error, pos: u64, what: &str) -> IndexError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        IndexError::corrupt(pos, format!("unexpected end of data reading {what}"))
    } else {
        IndexError::Io(err)
    }
}

/// Decodes the block that starts at `offset`.
///
/// `reader` must already be positioned at `offset`; `end` is the total length
/// of the store and bounds every read. Without positions, position data is
/// skipped and each posting keeps only its tf.
pub fn decode_block<R: Read>(
    reader: R,
    offset: u64,
    end: u64,
    with_positions: bool,
) -> Result<Vec<Posting>> {
    let mut cur = BlockCursor {
        inner: reader,
        pos: offset,
        end,
    };

    let df = cur.read_i32("document frequency")?;
    if df < 0 {
        return Err(IndexError::corrupt(offset, format!("negative document frequency {df}")));
    }
    let df = df as u64;
    if df.saturating_mul(MIN_POSTING_BYTES) > cur.remaining() {
        return Err(IndexError::corrupt(
            offset,
            format!("document frequency {df} exceeds the {} remaining bytes", cur.remaining()),
        ));
    }

    let mut postings = Vec::with_capacity(df as usize);
    let mut doc_id: DocId = 0;
    for i in 0..df {
        let at = cur.pos;
        let gap = cur.read_i32("document id")?;
        doc_id = if i == 0 {
            if gap < 0 {
                return Err(IndexError::corrupt(at, format!("negative document id {gap}")));
            }
            gap as DocId
        } else {
            if gap <= 0 {
                return Err(IndexError::corrupt(at, format!("non-positive document gap {gap}")));
            }
            doc_id
                .checked_add(gap as DocId)
                .filter(|&d| d <= i32::MAX as DocId)
                .ok_or_else(|| IndexError::corrupt(at, "document id overflow"))?
        };

        let at = cur.pos;
        let weight = cur.read_f64("weight")?;
        if !weight.is_finite() {
            return Err(IndexError::corrupt(at, format!("non-finite weight {weight}")));
        }

        let at = cur.pos;
        let tf = cur.read_i32("term frequency")?;
        if tf < 1 {
            return Err(IndexError::corrupt(at, format!("term frequency {tf} below one")));
        }
        let tf = tf as u32;
        let position_bytes = tf as u64 * INT_BYTES;
        cur.ensure(position_bytes, "positions")?;

        let positions = if with_positions {
            let mut positions = Vec::with_capacity(tf as usize);
            let mut position: Position = 0;
            for j in 0..tf {
                let at = cur.pos;
                let gap = cur.read_i32("position")?;
                position = if j == 0 {
                    if gap < 0 {
                        return Err(IndexError::corrupt(at, format!("negative position {gap}")));
                    }
                    gap as Position
                } else {
                    if gap <= 0 {
                        return Err(IndexError::corrupt(at, format!("non-positive position gap {gap}")));
                    }
                    position
                        .checked_add(gap as Position)
                        .ok_or_else(|| IndexError::corrupt(at, "position overflow"))?
                };
                positions.push(position);
            }
            positions
        } else {
            cur.skip(position_bytes, "positions")?;
            Vec::new()
        };

        postings.push(Posting {
            doc_id,
            positions,
            term_frequency: tf,
            weight,
        });
    }
    Ok(postings)
}

/// Read side of `postings.bin`. Every read opens the file afresh.
#[derive(Debug, Clone)]
pub struct PostingsStore {
    path: PathBuf,
    len: u64,
}

impl PostingsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = fs::metadata(&path)?.len();
        Ok(Self { path, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read_postings(&self, offset: u64) -> Result<Vec<Posting>> {
        self.read(offset, true)
    }

    pub fn read_postings_without_positions(&self, offset: u64) -> Result<Vec<Posting>> {
        self.read(offset, false)
    }

    fn read(&self, offset: u64, with_positions: bool) -> Result<Vec<Posting>> {
        if offset >= self.len {
            return Err(IndexError::corrupt(
                offset,
                format!("offset outside postings store of {} bytes", self.len),
            ));
        }
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        decode_block(BufReader::new(file), offset, self.len, with_positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc_id: DocId, positions: &[Position], weight: f64) -> Posting {
        let mut p = Posting::with_positions(doc_id, positions.to_vec());
        p.weight = weight;
        p
    }

    fn sample() -> Vec<Posting> {
        vec![
            posting(0, &[3], 1.0),
            posting(4, &[0, 7, 8], 2.0986),
            posting(9, &[12, 40], 1.693),
        ]
    }

    fn decode(bytes: &[u8], offset: u64, with_positions: bool) -> Result<Vec<Posting>> {
        decode_block(&bytes[offset as usize..], offset, bytes.len() as u64, with_positions)
    }

    #[test]
    fn block_layout_is_gap_encoded() {
        let mut buf = Vec::new();
        encode_block(&sample()[1..], &mut buf).unwrap();
        let mut r = &buf[..];
        assert_eq!(r.read_i32::<LittleEndian>().unwrap(), 2);
        assert_eq!(r.read_i32::<LittleEndian>().unwrap(), 4);
        assert_eq!(r.read_f64::<LittleEndian>().unwrap(), 2.0986);
        assert_eq!(r.read_i32::<LittleEndian>().unwrap(), 3);
        let gaps: Vec<i32> = (0..3).map(|_| r.read_i32::<LittleEndian>().unwrap()).collect();
        assert_eq!(gaps, vec![0, 7, 1]);
        // second document stored as a gap of 5
        assert_eq!(r.read_i32::<LittleEndian>().unwrap(), 5);
    }

    #[test]
    fn writer_reports_offsets_and_decodes_each_block() {
        let mut writer = PostingsWriter::new(Vec::new());
        let first = sample();
        let second = vec![posting(2, &[1, 2], 0.5)];
        let (a, a_len) = writer.write_postings(&first).unwrap();
        let (b, b_len) = writer.write_postings(&second).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, a_len);
        assert_eq!(writer.cursor(), a_len + b_len);

        let bytes = writer.into_inner();
        // random access order
        assert_eq!(decode(&bytes, b, true).unwrap(), second);
        assert_eq!(decode(&bytes, a, true).unwrap(), first);
    }

    #[test]
    fn without_positions_skips_position_data() {
        let mut writer = PostingsWriter::new(Vec::new());
        writer.write_postings(&sample()).unwrap();
        let (next, _) = writer.write_postings(&[posting(1, &[0], 3.0)]).unwrap();
        let bytes = writer.into_inner();

        let decoded = decode(&bytes, 0, false).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().all(|p| p.positions.is_empty()));
        assert_eq!(
            decoded.iter().map(|p| p.term_frequency).collect::<Vec<_>>(),
            vec![1, 3, 2]
        );
        assert_eq!(decode(&bytes, next, false).unwrap()[0].weight, 3.0);
    }

    #[test]
    fn rejects_unsorted_input() {
        let mut buf = Vec::new();
        let bad = vec![posting(5, &[1], 1.0), posting(5, &[2], 1.0)];
        assert!(matches!(encode_block(&bad, &mut buf), Err(IndexError::InvalidInput(_))));

        let mut p = posting(1, &[1, 2], 1.0);
        p.positions = vec![4, 2];
        assert!(encode_block(&[p], &mut Vec::new()).is_err());
    }

    #[test]
    fn rejects_tf_mismatch() {
        let mut p = posting(1, &[1, 2], 1.0);
        p.term_frequency = 3;
        assert!(encode_block(&[p], &mut Vec::new()).is_err());
    }

    #[test]
    fn misaligned_offset_is_corrupt() {
        let mut buf = Vec::new();
        encode_block(&[posting(7, &[3], 1.0), posting(9, &[1, 2], 2.0)], &mut buf).unwrap();
        // one byte in lands mid-integer and reads a huge df
        let err = decode(&buf, 1, true).unwrap_err();
        assert!(matches!(err, IndexError::CorruptData { .. }), "{err}");
    }

    #[test]
    fn truncated_block_is_corrupt() {
        let mut buf = Vec::new();
        encode_block(&sample(), &mut buf).unwrap();
        buf.truncate(buf.len() - 2);
        assert!(matches!(decode(&buf, 0, true), Err(IndexError::CorruptData { .. })));
        assert!(matches!(decode(&buf, 0, false), Err(IndexError::CorruptData { .. })));
    }

    #[test]
    fn store_rejects_offset_past_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postings.bin");
        let mut writer = PostingsWriter::new(File::create(&path).unwrap());
        writer.write_postings(&sample()).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let store = PostingsStore::open(&path).unwrap();
        assert_eq!(store.read_postings(0).unwrap(), sample());
        let err = store.read_postings(store.len() + 10).unwrap_err();
        assert!(matches!(err, IndexError::CorruptData { .. }));
    }

    #[test]
    fn decoded_length_matches_stored_df() {
        let mut buf = Vec::new();
        encode_block(&sample(), &mut buf).unwrap();
        let stored_df = (&buf[..]).read_i32::<LittleEndian>().unwrap();
        assert_eq!(decode(&buf, 0, true).unwrap().len(), stored_df as usize);
    }
}
