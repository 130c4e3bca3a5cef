//! Reading and writing process records.
//!
//! Two input formats are understood:
//!
//! - **Binary**: a stream of records, each a little-endian `i32` process id, a little-endian
//!   `i32` reference count, and that many single-byte page numbers. This is the format fed to
//!   the simulator on standard input.
//! - **Text**: one record per line, `pid page page ...`, with `#` starting a comment.
//!
//! Records are loaded atomically. Input that ends between two fields (the id, the count, or
//! the page bytes) ends the stream, and a record that was started but not finished is
//! dropped. Input that ends partway through a field is an error.

use core::fmt;
use std::io::{self, Read, Write};

use crate::{
    PageNumber,
    layout::{MAX_REFERENCES, VAS_PAGES},
};

/// A process as described by the input, before any memory is allocated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: i32,
    pub references: Vec<PageNumber>,
}

/// Errors that can occur while reading process records.
#[derive(Debug)]
pub enum LoadError {
    /// The underlying reader failed.
    Io(io::Error),
    /// The input ended partway through a field of a record.
    Truncated { record: usize },
    /// A record declared a negative or oversized reference count.
    InvalidLength { pid: i32, length: i64 },
    /// A reference named a page outside the address space.
    PageOutOfRange { pid: i32, index: usize, page: u64 },
    /// A text record contained something that is not a number.
    Parse { line: usize, token: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read input: {err}"),
            LoadError::Truncated { record } => {
                write!(f, "input ended in the middle of a field of record {record}")
            }
            LoadError::InvalidLength { pid, length } => write!(
                f,
                "process {pid} declares {length} references (expected 0..={MAX_REFERENCES})"
            ),
            LoadError::PageOutOfRange { pid, index, page } => write!(
                f,
                "process {pid} reference {index} names page {page} (expected < {VAS_PAGES})"
            ),
            LoadError::Parse { line, token } => {
                write!(f, "line {line}: `{token}` is not a valid number")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

fn check_length(pid: i32, length: i64) -> Result<usize, LoadError> {
    usize::try_from(length)
        .ok()
        .filter(|&len| len <= MAX_REFERENCES)
        .ok_or(LoadError::InvalidLength { pid, length })
}

fn check_page(pid: i32, index: usize, page: u64) -> Result<PageNumber, LoadError> {
    usize::try_from(page)
        .ok()
        .and_then(PageNumber::new)
        .ok_or(LoadError::PageOutOfRange { pid, index, page })
}

/// Iterator over the records of a binary stream.
///
/// Yields `None` once the stream ends between two fields. After that, or after an error, the
/// iterator is fused and yields nothing further.
pub struct BinaryReader<R> {
    reader: R,
    record: usize,
    finished: bool,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            record: 0,
            finished: false,
        }
    }

    /// Fills `buf` completely, or reports `Ok(false)` if the stream was already at its end.
    ///
    /// A stream that ends after some but not all of `buf` has been filled is truncated.
    fn fill(&mut self, buf: &mut [u8]) -> Result<bool, LoadError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(LoadError::Truncated {
                        record: self.record,
                    });
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }

    fn read_i32(&mut self) -> Result<Option<i32>, LoadError> {
        let mut raw = [0u8; 4];
        if !self.fill(&mut raw)? {
            return Ok(None);
        }
        Ok(Some(i32::from_le_bytes(raw)))
    }

    fn read_record(&mut self) -> Result<Option<ProcessRecord>, LoadError> {
        let Some(pid) = self.read_i32()? else {
            return Ok(None);
        };
        let Some(length) = self.read_i32()? else {
            log::warn!("input ended after the id of record {}; dropping it", self.record);
            return Ok(None);
        };
        let length = check_length(pid, length.into())?;

        let mut raw = vec![0u8; length];
        if !self.fill(&mut raw)? {
            log::warn!("input ended before the pages of record {}; dropping it", self.record);
            return Ok(None);
        }
        let references = raw
            .iter()
            .enumerate()
            .map(|(index, &page)| check_page(pid, index, page.into()))
            .collect::<Result<Vec<_>, _>>()?;

        self.record += 1;
        Ok(Some(ProcessRecord { pid, references }))
    }
}

impl<R: Read> Iterator for BinaryReader<R> {
    type Item = Result<ProcessRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.read_record().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

/// Parses records from the text format.
pub fn parse_text(input: &str) -> Result<Vec<ProcessRecord>, LoadError> {
    let mut records = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        let line_number = line_index + 1;
        let content = line.split('#').next().unwrap_or_default();
        let mut tokens = content.split_whitespace();
        let Some(pid_token) = tokens.next() else {
            continue;
        };

        let parse_error = |token: &str| LoadError::Parse {
            line: line_number,
            token: token.to_string(),
        };

        let pid: i32 = pid_token.parse().map_err(|_| parse_error(pid_token))?;
        let pages = tokens
            .map(|token| token.parse::<u64>().map_err(|_| parse_error(token)))
            .collect::<Result<Vec<_>, _>>()?;
        check_length(pid, pages.len() as i64)?;

        let references = pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| check_page(pid, index, page))
            .collect::<Result<Vec<_>, _>>()?;
        records.push(ProcessRecord { pid, references });
    }

    Ok(records)
}

/// Writes records in the binary format.
pub fn write_binary<'a, W: Write>(
    mut writer: W,
    records: impl IntoIterator<Item = &'a ProcessRecord>,
) -> io::Result<()> {
    for record in records {
        let length = i32::try_from(record.references.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many references"))?;
        writer.write_all(&record.pid.to_le_bytes())?;
        writer.write_all(&length.to_le_bytes())?;
        for page in &record.references {
            // Page numbers are below VAS_PAGES, so they always fit in a byte.
            writer.write_all(&[page.as_usize() as u8])?;
        }
    }
    writer.flush()
}
