//! Line sources for the pipeline
//!
//! A [`GcodeLines`] pulls one line at a time from any buffered reader.
//! `\n`, `\r\n` and a lone `\r` all end a line. Invalid UTF-8 bytes are dropped rather than rejected, matching how
//! hobbyist firmware tooling treats stray bytes in generated files.

use std::io::{self, BufRead};

use afrbkit_core::ToolpathError;

/// Lazy, forward-only line iterator over a buffered reader
///
/// Yields each line without its terminator. A read failure is yielded once
/// and ends the iteration; lines already yielded stay valid.
pub struct GcodeLines<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
    /// Last line ended on `\r`; a following `\n` belongs to it
    skip_lf: bool,
    done: bool,
}

impl<R: BufRead> GcodeLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_number: 0,
            skip_lf: false,
            done: false,
        }
    }

    /// Number of lines yielded so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Read the next line into `buf` without its terminator
    ///
    /// Returns `false` at end of input when nothing was read.
    fn read_line(&mut self) -> io::Result<bool> {
        let mut read_any = false;
        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(read_any);
            }

            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    self.skip_lf = available[i] == b'\r';
                    self.buf.extend_from_slice(&available[..i]);
                    self.reader.consume(i + 1);
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    self.buf.extend_from_slice(available);
                    self.reader.consume(len);
                    read_any = true;
                }
            }
        }
    }
}

impl<'a> GcodeLines<&'a [u8]> {
    /// Stream lines from in-memory text
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> Iterator for GcodeLines<R> {
    type Item = Result<String, ToolpathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.read_line() {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                self.line_number += 1;
                Some(Ok(decode_dropping_invalid(&self.buf)))
            }
            Err(source) => {
                self.done = true;
                tracing::warn!("G-code read failed after line {}: {}", self.line_number, source);
                Some(Err(ToolpathError::Read {
                    line_number: self.line_number,
                    source,
                }))
            }
        }
    }
}

/// Decode UTF-8, silently skipping invalid byte sequences
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
