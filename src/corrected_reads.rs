/// Raw corrected reads as written by the correction tool
///
/// Upper-case bases were corrected by the tool, lower-case bases were copied
/// from the uncorrected read. A split read appears as several records sharing
/// one id; fragments are kept in file order.
use crate::error::MsaError;
use crate::msa::header_id;
use indexmap::IndexMap;
use std::io::BufRead;

#[derive(Debug, Default)]
pub struct CorrectedReads {
    fragments: IndexMap<String, Vec<Vec<u8>>>,
}

impl CorrectedReads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a FASTA-like stream; any line containing `>` is a header
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MsaError> {
        let mut reads = CorrectedReads::new();
        let mut current: Option<(String, Vec<u8>)> = None;

        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line.contains('>') {
                if let Some((id, seq)) = current.take() {
                    reads.push(id, seq);
                }
                current = Some((header_id(line).to_string(), Vec::new()));
            } else {
                match current.as_mut() {
                    Some((_, seq)) => seq.extend_from_slice(line.as_bytes()),
                    None => return Err(MsaError::MissingHeader { line: line_idx + 1 }),
                }
            }
        }
        if let Some((id, seq)) = current {
            reads.push(id, seq);
        }

        Ok(reads)
    }

    /// Append a fragment; empty sequences are dropped
    pub fn push(&mut self, read_id: String, sequence: Vec<u8>) {
        if sequence.is_empty() {
            return;
        }
        self.fragments.entry(read_id).or_default().push(sequence);
    }

    /// Raw sequence of the `index`-th fragment of a read
    pub fn fragment(&self, read_id: &str, index: usize) -> Option<&[u8]> {
        self.fragments
            .get(read_id)
            .and_then(|frags| frags.get(index))
            .map(|seq| seq.as_slice())
    }

    pub fn contains(&self, read_id: &str) -> bool {
        self.fragments.contains_key(read_id)
    }

    /// Number of distinct read ids
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.values().map(|f| f.len()).sum()
    }
}

/// Sequence length of every record in file order, one entry per header
///
/// Unlike [`CorrectedReads`], repeated ids stay separate and empty records
/// report 0.
pub fn record_lengths<R: BufRead>(reader: R) -> Result<Vec<usize>, MsaError> {
    let mut lengths = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.contains('>') {
            lengths.push(0);
        } else if !line.is_empty() {
            match lengths.last_mut() {
                Some(len) => *len += line.len(),
                None => return Err(MsaError::MissingHeader { line: line_idx + 1 }),
            }
        }
    }
    Ok(lengths)
}
