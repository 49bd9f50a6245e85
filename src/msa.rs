//! Multiple sequence alignment records
//!
//! The aligner writes one record per read fragment: a `>ReadId` header followed by
//! the reference, uncorrected and corrected rows, all padded with `.` to the same
//! width. Some aligner versions repeat the header before every row; both layouts
//! are accepted. Rows are upper-cased on read. Consecutive records may share an
//! id when the corrector split or trimmed the read.

use crate::error::MsaError;
use flate2::read::MultiGzDecoder;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const BGZF_HEADER_SIZE: usize = 18;

/// Check whether a file starts with a valid BGZF header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => Ok(header[0..2] == [0x1f, 0x8b]
            && header[2] == 0x08
            && header[3] == 0x04
            && header[10..12] == [0x06, 0x00]
            && header[12..14] == [b'B', b'C']
            && header[14..16] == [0x02, 0x00]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

/// Open a text input, decompressing `.gz`/`.bgz` files (BGZF or plain gzip)
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz" || ext == "bgz")
        .unwrap_or(false);

    if !is_compressed {
        return Ok(Box::new(BufReader::new(file)));
    }

    if is_bgzf(&mut file)? {
        debug!("Reading {} as BGZF", path.display());
        Ok(Box::new(BufReader::new(bgzf::io::Reader::new(file))))
    } else {
        debug!("Reading {} as gzip", path.display());
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}

/// Extract the read id from a header line: text after `>` up to the first space
pub fn header_id(line: &str) -> &str {
    let after = line.split_once('>').map(|(_, rest)| rest).unwrap_or(line);
    after.split(' ').next().unwrap_or("").trim_end()
}

/// Number of non-gap characters in an alignment row
pub fn ungapped_len(row: &[u8], gap: u8) -> usize {
    row.iter().filter(|&&c| c != gap).count()
}

/// Reference, uncorrected and corrected rows of one alignment record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedTriplet {
    read_id: String,
    ordinal: usize,
    reference: Vec<u8>,
    uncorrected: Vec<u8>,
    corrected: Vec<u8>,
}

impl AlignedTriplet {
    /// Build a triplet, rejecting rows of unequal length
    pub fn new(
        read_id: impl Into<String>,
        ordinal: usize,
        reference: Vec<u8>,
        uncorrected: Vec<u8>,
        corrected: Vec<u8>,
    ) -> Result<Self, MsaError> {
        let read_id = read_id.into();
        if reference.len() != uncorrected.len() || reference.len() != corrected.len() {
            return Err(MsaError::RowLengthMismatch {
                read_id,
                reference: reference.len(),
                uncorrected: uncorrected.len(),
                corrected: corrected.len(),
            });
        }
        Ok(AlignedTriplet {
            read_id,
            ordinal,
            reference,
            uncorrected,
            corrected,
        })
    }

    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    /// 0-based position of the record in the alignment file
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn uncorrected(&self) -> &[u8] {
        &self.uncorrected
    }

    pub fn corrected(&self) -> &[u8] {
        &self.corrected
    }

    /// Alignment width
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Iterate over (reference, uncorrected, corrected) columns
    pub fn columns(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        self.reference
            .iter()
            .zip(&self.uncorrected)
            .zip(&self.corrected)
            .map(|((&r, &u), &c)| (r, u, c))
    }
}

/// Streaming reader over alignment records in file order
pub struct MsaReader<R: BufRead> {
    reader: R,
    line_no: usize,
    next_ordinal: usize,
    buf: String,
}

impl<R: BufRead> MsaReader<R> {
    pub fn new(reader: R) -> Self {
        MsaReader {
            reader,
            line_no: 0,
            next_ordinal: 0,
            buf: String::new(),
        }
    }

    /// Next non-blank line with trailing whitespace removed, or None at end of input
    fn next_line(&mut self) -> Result<Option<String>, MsaError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim_end();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    /// Next alignment row, skipping a repeated per-row header of the same read
    fn next_row(&mut self, read_id: &str) -> Result<Vec<u8>, MsaError> {
        let mut line = self.next_line()?;
        if matches!(&line, Some(l) if l.starts_with('>') && header_id(l) == read_id) {
            line = self.next_line()?;
        }
        match line {
            Some(l) if !l.starts_with('>') => {
                let mut row = l.into_bytes();
                row.make_ascii_uppercase();
                Ok(row)
            }
            _ => Err(MsaError::TruncatedRecord {
                read_id: read_id.to_string(),
                line: self.line_no,
            }),
        }
    }

    pub fn read_record(&mut self) -> Result<Option<AlignedTriplet>, MsaError> {
        let header = match self.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        if !header.starts_with('>') {
            return Err(MsaError::MissingHeader { line: self.line_no });
        }
        let read_id = header_id(&header).to_string();

        let reference = self.next_row(&read_id)?;
        let uncorrected = self.next_row(&read_id)?;
        let corrected = self.next_row(&read_id)?;

        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        AlignedTriplet::new(read_id, ordinal, reference, uncorrected, corrected).map(Some)
    }

    pub fn read_all(&mut self) -> Result<Vec<AlignedTriplet>, MsaError> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

impl<R: BufRead> Iterator for MsaReader<R> {
    type Item = Result<AlignedTriplet, MsaError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
