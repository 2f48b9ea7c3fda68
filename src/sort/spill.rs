//! Spill run files
//!
//! Record framing, all integers u32 little-endian:
//!
//! ```text
//! segment count
//! per segment: byte length, bytes
//! value byte length, value bytes
//! ```
//!
//! End of run is a clean end of file at a record boundary. The writer keeps
//! a CRC32 of every byte and the record count in memory; the reader checks
//! both when it reaches the end, so a damaged run is `AERO_DATA_CORRUPTION`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crc32fast::Hasher;
use tempfile::NamedTempFile;

use super::key::SortKey;
use crate::executor::{ExecutionError, ExecutionPhase, ExecutionResult};
use crate::observability::{log_event_with_fields, Event};

/// A sorted run written to a temp file
#[derive(Debug)]
pub struct SpillRun {
    file: NamedTempFile,
    records: u64,
    bytes: u64,
    checksum: u32,
}

impl SpillRun {
    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Open a reader positioned at the first record
    pub fn reader(&self) -> ExecutionResult<RunReader> {
        let file = self
            .file
            .reopen()
            .map_err(|e| {
                ExecutionError::sort_io("failed to reopen spill run", e)
                    .in_phase(ExecutionPhase::Merge)
            })?;
        Ok(RunReader {
            input: BufReader::new(file),
            hasher: Hasher::new(),
            expected_records: self.records,
            expected_checksum: self.checksum,
            expected_bytes: self.bytes,
            consumed: 0,
            records: 0,
            done: false,
        })
    }

    /// Delete the backing file. Failure is logged, not returned.
    pub fn remove(self) {
        let path = self.file.path().display().to_string();
        if let Err(e) = self.file.close() {
            let reason = e.to_string();
            log_event_with_fields(
                Event::TempFileCleanupFailed,
                &[("path", path.as_str()), ("reason", reason.as_str())],
            );
        }
    }
}

/// Writes records into a new spill run, one at a time
pub struct RunWriter {
    out: BufWriter<NamedTempFile>,
    hasher: Hasher,
    records: u64,
    bytes: u64,
}

impl RunWriter {
    pub fn new(file: NamedTempFile) -> Self {
        Self {
            out: BufWriter::new(file),
            hasher: Hasher::new(),
            records: 0,
            bytes: 0,
        }
    }

    fn io_error(e: io::Error) -> ExecutionError {
        ExecutionError::sort_io("failed to write spill run", e).in_phase(ExecutionPhase::Spill)
    }

    fn put(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.hasher.update(bytes);
        self.out.write_all(bytes)
    }

    fn put_len(&mut self, len: usize) -> io::Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "record field too large"))?;
        self.put(&len.to_le_bytes())
    }

    fn put_record(&mut self, key: &SortKey) -> io::Result<()> {
        self.put_len(key.segments().len())?;
        for segment in key.segments() {
            self.put_len(segment.len())?;
            self.put(segment)?;
        }
        self.put_len(key.value().len())?;
        self.put(key.value())
    }

    /// Append one record
    pub fn push(&mut self, key: &SortKey) -> ExecutionResult<()> {
        self.put_record(key).map_err(Self::io_error)?;
        self.records += 1;
        self.bytes += key.framed_size() as u64;
        Ok(())
    }

    /// Records appended so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush buffered records and seal the run
    pub fn finish(self) -> ExecutionResult<SpillRun> {
        let RunWriter {
            out,
            hasher,
            records,
            bytes,
        } = self;
        let file = out.into_inner().map_err(|e| Self::io_error(e.into_error()))?;
        Ok(SpillRun {
            file,
            records,
            bytes,
            checksum: hasher.finalize(),
        })
    }

    /// Append every key in order and seal the run
    pub fn write_all<'a>(
        mut self,
        keys: impl IntoIterator<Item = &'a SortKey>,
    ) -> ExecutionResult<SpillRun> {
        for key in keys {
            self.push(key)?;
        }
        self.finish()
    }
}

/// Sequential reader over one spill run
pub struct RunReader {
    input: BufReader<File>,
    hasher: Hasher,
    expected_records: u64,
    expected_checksum: u32,
    expected_bytes: u64,
    consumed: u64,
    records: u64,
    done: bool,
}

impl RunReader {
    fn corruption(&self, reason: impl Into<String>) -> ExecutionError {
        let reason = reason.into();
        let record = self.records.to_string();
        log_event_with_fields(
            Event::SortRunCorruption,
            &[("record", record.as_str()), ("reason", reason.as_str())],
        );
        ExecutionError::data_corruption(format!("spill run record {}: {}", self.records, reason))
            .in_phase(ExecutionPhase::Merge)
    }

    /// Fill `buf`; returns the number of bytes read before end of file
    fn fill(&mut self, buf: &mut [u8]) -> ExecutionResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.input.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ExecutionError::sort_io("failed to read spill run", e)
                        .in_phase(ExecutionPhase::Merge))
                }
            }
        }
        self.hasher.update(&buf[..filled]);
        self.consumed += filled as u64;
        Ok(filled)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> ExecutionResult<()> {
        if self.fill(buf)? < buf.len() {
            return Err(self.corruption("truncated record"));
        }
        Ok(())
    }

    fn read_len(&mut self) -> ExecutionResult<usize> {
        let mut word = [0u8; 4];
        self.read_exact(&mut word)?;
        Ok(u32::from_le_bytes(word) as usize)
    }

    fn read_bytes(&mut self) -> ExecutionResult<Vec<u8>> {
        let len = self.read_len()?;
        let left = self.expected_bytes.saturating_sub(self.consumed);
        if len as u64 > left {
            return Err(self.corruption(format!(
                "field length {} exceeds the {} bytes left in the run",
                len, left
            )));
        }
        let mut bytes = vec![0u8; len];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn finish(&mut self) -> ExecutionResult<()> {
        self.done = true;
        if self.records != self.expected_records {
            return Err(self.corruption(format!(
                "run ended after {} of {} records",
                self.records, self.expected_records
            )));
        }
        let checksum = std::mem::replace(&mut self.hasher, Hasher::new()).finalize();
        if checksum != self.expected_checksum {
            return Err(self.corruption(format!(
                "checksum mismatch: expected {:08x}, computed {:08x}",
                self.expected_checksum, checksum
            )));
        }
        Ok(())
    }

    /// Next record, or `None` at the end of a valid run
    pub fn next_key(&mut self) -> ExecutionResult<Option<SortKey>> {
        if self.done {
            return Ok(None);
        }
        let mut word = [0u8; 4];
        match self.fill(&mut word)? {
            0 => {
                self.finish()?;
                return Ok(None);
            }
            4 => {}
            _ => return Err(self.corruption("truncated segment count")),
        }
        if self.records >= self.expected_records {
            return Err(self.corruption("records past the end of the run"));
        }
        let count = u32::from_le_bytes(word) as usize;
        let mut segments = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            segments.push(self.read_bytes()?);
        }
        let value = self.read_bytes()?;
        self.records += 1;
        Ok(Some(SortKey::new(segments, value)))
    }
}
