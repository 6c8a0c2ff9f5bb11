//! Streaming line reader for transcript files.
//!
//! The parser consumes one logical line at a time and tracks the byte
//! position after each newline terminator, which the sync engine persists
//! as the resume cursor. Offsets therefore count delimiter bytes, so files
//! with CR-LF terminators resume correctly too.

use crate::error::{Error, Result};
use crate::jsonl::types::RawEntry;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Upper bound for a single JSONL record (10 MiB).
///
/// Records beyond this size are considered malformed.
pub const MAX_LINE_BYTES: u64 = 10 * 1024 * 1024;

/// Streaming parser over newline-delimited transcript entries.
pub struct EntryParser<R: BufRead> {
    reader: R,
    path: PathBuf,
    offset: u64,
    line: u64,
}

impl EntryParser<BufReader<File>> {
    /// Open a transcript file for parsing from the beginning.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_at(path, 0)
    }

    /// Open a transcript file and resume from a byte offset.
    ///
    /// The offset must point at the start of a line (the position a prior
    /// [`EntryParser::offset`] reported).
    pub fn open_at(path: &Path, offset: u64) -> Result<Self> {
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            offset,
            line: 0,
        })
    }
}

impl<R: BufRead> EntryParser<R> {
    /// Wrap an open byte stream. Offsets are relative to the stream start.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            path: PathBuf::from("<stream>"),
            offset: 0,
            line: 0,
        }
    }

    /// Byte position after the last consumed newline terminator.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The next raw line with its terminator stripped, or `None` at
    /// end-of-stream. Does not skip empty lines or parse JSON.
    pub fn next_raw(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_LINE_BYTES + 1)
            .read_until(b'\n', &mut buf)? as u64;
        if n == 0 {
            return Ok(None);
        }

        self.line += 1;
        // A full read with no newline means the record blew the cap; a full
        // read ending in a newline is a line of exactly MAX_LINE_BYTES.
        if n > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            return Err(Error::OversizedLine {
                path: self.path.clone(),
                line: self.line,
                max_bytes: MAX_LINE_BYTES,
            });
        }
        self.offset += n;

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// The next parsed entry, or `None` at end-of-stream.
    ///
    /// Empty lines are silently skipped. A line that fails to parse as JSON
    /// aborts iteration with the offending line's context.
    pub fn next(&mut self) -> Result<Option<RawEntry>> {
        loop {
            let Some(line) = self.next_raw()? else {
                return Ok(None);
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return match serde_json::from_slice(&line) {
                Ok(entry) => Ok(Some(entry)),
                Err(err) => Err(Error::Parse {
                    path: self.path.clone(),
                    line: self.line,
                    message: err.to_string(),
                }),
            };
        }
    }

    /// Parse every remaining entry.
    pub fn parse_all(&mut self) -> Result<Vec<RawEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}
