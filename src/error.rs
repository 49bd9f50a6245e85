//! Errors raised while reading and scoring alignment records
use std::io::Error as IoError;

#[derive(Debug)]
pub enum MsaError {
    IoError(IoError),
    /// A record header was seen but the file ended before its three rows
    TruncatedRecord { read_id: String, line: usize },
    /// A sequence line appeared before any `>` header
    MissingHeader { line: usize },
    RowLengthMismatch {
        read_id: String,
        reference: usize,
        uncorrected: usize,
        corrected: usize,
    },
    MaskLengthMismatch {
        read_id: String,
        expected: usize,
        found: usize,
    },
    /// Fragments of one read were interleaved with another read
    NonContiguousRead { read_id: String },
    StretchOutOfBounds {
        read_id: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

impl std::fmt::Display for MsaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsaError::IoError(e) => write!(f, "IO error: {e}"),
            MsaError::TruncatedRecord { read_id, line } => write!(
                f,
                "Record '{read_id}' is truncated at line {line}: expected reference, uncorrected and corrected rows"
            ),
            MsaError::MissingHeader { line } => {
                write!(f, "Sequence at line {line} has no preceding '>' header")
            }
            MsaError::RowLengthMismatch {
                read_id,
                reference,
                uncorrected,
                corrected,
            } => write!(
                f,
                "Rows of record '{read_id}' differ in length (reference {reference}, uncorrected {uncorrected}, corrected {corrected})"
            ),
            MsaError::MaskLengthMismatch {
                read_id,
                expected,
                found,
            } => write!(
                f,
                "Position mask for '{read_id}' has length {found}, alignment row has {expected}"
            ),
            MsaError::NonContiguousRead { read_id } => write!(
                f,
                "Fragments of read '{read_id}' are not contiguous in the alignment file"
            ),
            MsaError::StretchOutOfBounds {
                read_id,
                start,
                end,
                len,
            } => write!(
                f,
                "Gap stretch [{start}, {end}) of '{read_id}' exceeds alignment length {len}"
            ),
        }
    }
}

impl std::error::Error for MsaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MsaError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for MsaError {
    fn from(e: IoError) -> Self {
        MsaError::IoError(e)
    }
}
