// SPDX-License-Identifier: MIT

//! Append-only, line-delimited JSON write-ahead log.
//!
//! Every entry is a JSON object on its own line. `open` tolerates a log
//! truncated mid-write (the last line has no trailing newline) and a log
//! with trailing garbage (a crash mid-append, or disk corruption): the
//! valid prefix is kept, the original file is preserved under a rotated
//! `.bak` name, and the log is rewritten clean.

use crate::error::WalError;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FLUSH_ENTRY_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<std::fs::File>,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset into the file up to which [`Wal::next_unprocessed`] has
    /// already scanned (whether it returned or silently skipped a line).
    read_cursor: usize,
    appended_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let existing = read_file_bytes(&path)?;
        let (valid_entries, corrupted) = scan_valid_prefix(&existing);
        if corrupted {
            tracing::warn!(path = %path.display(), "WAL corruption detected on open, rotating backup");
            rotate_bak(&path)?;
            rewrite_clean(&path, &valid_entries)?;
        }
        let write_seq = valid_entries.last().map(|e| e.seq).unwrap_or(0);

        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            write_seq,
            processed_seq,
            read_cursor: 0,
            appended_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        self.write_seq = seq;
        self.appended_since_flush += 1;
        Ok(seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.appended_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.appended_since_flush >= FLUSH_ENTRY_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Pop the next entry with `seq > processed_seq` that hasn't already
    /// been returned by a prior call, skipping any unparseable lines
    /// encountered along the way. Returns `None` at EOF (or when the
    /// only remaining bytes are an incomplete trailing line).
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let bytes = read_file_bytes(&self.path)?;
        if self.read_cursor > bytes.len() {
            self.read_cursor = bytes.len();
        }
        let mut pos = self.read_cursor;
        loop {
            let Some(rel_nl) = bytes[pos..].iter().position(|&b| b == b'\n') else {
                break;
            };
            let line_end = pos + rel_nl;
            let line = &bytes[pos..line_end];
            let consumed_to = line_end + 1;
            if line.is_empty() {
                pos = consumed_to;
                continue;
            }
            match try_parse_line(line) {
                Some(entry) if entry.seq > self.processed_seq => {
                    self.read_cursor = consumed_to;
                    return Ok(Some(entry));
                }
                _ => {
                    pos = consumed_to;
                    continue;
                }
            }
        }
        self.read_cursor = pos;
        Ok(None)
    }

    /// All entries with `seq > after_seq`, stopping at the first
    /// unparseable line (a conservative read that never returns an entry
    /// past suspect data).
    pub fn entries_after(&self, after_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let bytes = read_file_bytes(&self.path)?;
        let mut out = Vec::new();
        for raw_line in bytes.split(|&b| b == b'\n') {
            if raw_line.is_empty() {
                continue;
            }
            match try_parse_line(raw_line) {
                Some(entry) => {
                    if entry.seq > after_seq {
                        out.push(entry);
                    }
                }
                None => break,
            }
        }
        Ok(out)
    }

    /// Drop all entries with `seq < seq`, rewriting the log file. Used
    /// after a snapshot makes older entries redundant.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        self.flush()?;
        let kept = self.entries_after(seq.saturating_sub(1))?;
        rewrite_clean(&self.path, &kept)?;
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.read_cursor = 0;
        Ok(())
    }
}

fn read_file_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn try_parse_line(line: &[u8]) -> Option<WalEntry> {
    std::str::from_utf8(line).ok().and_then(|s| serde_json::from_str::<WalEntry>(s.trim()).ok())
}

/// Scan `bytes` line-by-line, returning the valid entries up to (but
/// excluding) the first unparseable line, and whether corruption was found.
fn scan_valid_prefix(bytes: &[u8]) -> (Vec<WalEntry>, bool) {
    let mut out = Vec::new();
    for raw_line in bytes.split(|&b| b == b'\n') {
        if raw_line.is_empty() {
            continue;
        }
        match try_parse_line(raw_line) {
            Some(entry) => out.push(entry),
            None => return (out, true),
        }
    }
    (out, false)
}

fn rewrite_clean(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let mut buf = Vec::new();
    for entry in entries {
        serde_json::to_writer(&mut buf, entry)?;
        buf.push(b'\n');
    }
    std::fs::write(path, buf)?;
    Ok(())
}

/// Rotate `path.bak.2 -> path.bak.3` (evicting an existing `.bak.3`),
/// `path.bak -> path.bak.2`, then copy `path` to `path.bak`, preserving up
/// to three generations of corrupted WAL for post-mortem.
fn rotate_bak(path: &Path) -> Result<(), WalError> {
    let bak1 = path.with_extension("bak");
    let bak2 = path.with_extension("bak.2");
    let bak3 = path.with_extension("bak.3");
    if bak3.exists() {
        std::fs::remove_file(&bak3)?;
    }
    if bak2.exists() {
        std::fs::rename(&bak2, &bak3)?;
    }
    if bak1.exists() {
        std::fs::rename(&bak1, &bak2)?;
    }
    std::fs::copy(path, &bak1)?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
