//! Transactional byte buffer for incremental parsing.
//!
//! Inbound bytes are kept as a queue of immutable [`Bytes`] segments with a
//! read cursor on top of them. Reads move the cursor speculatively; a parse
//! step that runs out of data fails with [`Incomplete`] and the caller calls
//! [`Buffer::rewind`] so the identical step can be retried once more bytes
//! have been written. A successfully parsed unit is committed with
//! [`Buffer::consume`], which drops every segment the cursor has passed.
//!
//! ```text
//!   committed          cursor
//!      v                 v
//!  [ seg 0 ....|.... seg 1 ....|.... seg 2 ........ ]
//!      <-- read, not yet ---><------ unread ------->
//!          committed
//! ```

use bytes::{Bytes, BytesMut};
use memmem::{Searcher, TwoWaySearcher};
use std::collections::VecDeque;
use std::fmt;

/// Not enough bytes are buffered to complete the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incomplete;

impl fmt::Display for Incomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("incomplete data")
    }
}

impl std::error::Error for Incomplete {}

pub type BufferResult<T> = Result<T, Incomplete>;

#[derive(Debug, Default)]
pub struct Buffer {
    segments: VecDeque<Bytes>,
    /// Offset of the committed start inside `segments[0]`.
    start: usize,
    /// Cursor segment index; equals `segments.len()` when every byte is read.
    segment: usize,
    offset: usize,
    /// Sum of the lengths in `segments`.
    held_bytes: usize,
    total_bytes: usize,
    unread_bytes: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment. Empty writes are ignored.
    pub fn write(&mut self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return;
        }
        self.total_bytes += bytes.len();
        self.held_bytes += bytes.len();
        self.unread_bytes += bytes.len();
        self.segments.push_back(bytes);
    }

    /// Bytes at or after the cursor.
    pub fn available(&self) -> usize {
        self.unread_bytes
    }

    /// Bytes ever written, including consumed ones.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Number of segments still held in memory.
    pub fn segments(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unread_bytes == 0
    }

    pub fn read(&mut self, n: usize) -> BufferResult<Bytes> {
        if self.unread_bytes < n {
            return Err(Incomplete);
        }
        if n == 0 {
            return Ok(Bytes::new());
        }
        let segment = &self.segments[self.segment];
        if segment.len() - self.offset >= n {
            let bytes = segment.slice(self.offset..self.offset + n);
            self.advance(n, None);
            return Ok(bytes);
        }
        let mut out = BytesMut::with_capacity(n);
        self.advance(n, Some(&mut out));
        Ok(out.freeze())
    }

    pub fn skip(&mut self, n: usize) -> BufferResult<()> {
        if self.unread_bytes < n {
            return Err(Incomplete);
        }
        self.advance(n, None);
        Ok(())
    }

    /// Reads `pattern.len()` bytes and reports whether they equal `pattern`.
    /// The read stays applied whatever the outcome.
    pub fn match_bytes(&mut self, pattern: &[u8]) -> BufferResult<bool> {
        let bytes = self.read(pattern.len())?;
        Ok(bytes.as_ref() == pattern)
    }

    /// Offset of the first occurrence of `pattern` relative to the cursor.
    /// The cursor does not move.
    pub fn find(&self, pattern: &[u8]) -> BufferResult<usize> {
        self.find_from(pattern, 0)
    }

    /// Like [`Buffer::find`], but only considers matches starting at least
    /// `from` bytes past the cursor. A caller that already scanned `n` bytes
    /// without a match resumes with `from = n - (pattern.len() - 1)`.
    pub fn find_from(&self, pattern: &[u8], from: usize) -> BufferResult<usize> {
        if pattern.is_empty() {
            return if from <= self.unread_bytes {
                Ok(from)
            } else {
                Err(Incomplete)
            };
        }
        if from >= self.unread_bytes {
            return Err(Incomplete);
        }
        let mut index = self.segment;
        let mut skip = self.offset + from;
        while skip >= self.segments[index].len() {
            skip -= self.segments[index].len();
            index += 1;
        }

        // Whole-segment matches go through memmem. Knuth-Morris-Pratt state
        // is carried over the last `overlap` bytes of each segment so that
        // matches straddling a boundary are found without copying.
        let searcher = TwoWaySearcher::new(pattern);
        let failure = failure_table(pattern);
        let overlap = pattern.len() - 1;
        let mut matched = 0;
        let mut position = from;
        for segment in self.segments.iter().skip(index) {
            let slice = &segment[skip..];
            skip = 0;
            if slice.len() <= 2 * overlap {
                for (i, byte) in slice.iter().enumerate() {
                    matched = kmp_step(pattern, &failure, matched, *byte);
                    if matched == pattern.len() {
                        return Ok(position + i + 1 - pattern.len());
                    }
                }
            } else {
                for (i, byte) in slice[..overlap].iter().enumerate() {
                    matched = kmp_step(pattern, &failure, matched, *byte);
                    if matched == pattern.len() {
                        return Ok(position + i + 1 - pattern.len());
                    }
                }
                if let Some(found) = searcher.search_in(slice) {
                    return Ok(position + found);
                }
                matched = 0;
                for byte in &slice[slice.len() - overlap..] {
                    matched = kmp_step(pattern, &failure, matched, *byte);
                }
            }
            position += slice.len();
        }
        Err(Incomplete)
    }

    /// Restores the cursor to the last committed position.
    pub fn rewind(&mut self) {
        self.segment = 0;
        self.offset = self.start;
        self.unread_bytes = self.held_bytes - self.start;
    }

    /// Commits the cursor, dropping every byte before it.
    pub fn consume(&mut self) {
        for _ in 0..self.segment {
            if let Some(segment) = self.segments.pop_front() {
                self.held_bytes -= segment.len();
            }
        }
        self.segment = 0;
        self.start = self.offset;
    }

    fn advance(&mut self, mut n: usize, mut out: Option<&mut BytesMut>) {
        self.unread_bytes -= n;
        while n > 0 {
            let segment = &self.segments[self.segment];
            let take = (segment.len() - self.offset).min(n);
            if let Some(out) = out.as_mut() {
                out.extend_from_slice(&segment[self.offset..self.offset + take]);
            }
            self.offset += take;
            n -= take;
            if self.offset == segment.len() {
                self.segment += 1;
                self.offset = 0;
            }
        }
    }
}

fn failure_table(pattern: &[u8]) -> Vec<usize> {
    let mut table = vec![0; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[k] != pattern[i] {
            k = table[k - 1];
        }
        if pattern[k] == pattern[i] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

fn kmp_step(pattern: &[u8], failure: &[usize], mut matched: usize, byte: u8) -> usize {
    while matched > 0 && pattern[matched] != byte {
        matched = failure[matched - 1];
    }
    if pattern[matched] == byte {
        matched += 1;
    }
    matched
}
