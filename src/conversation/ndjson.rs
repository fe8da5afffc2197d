//! Incremental newline-delimited JSON framing.
//!
//! The reply stream is NDJSON: each line is one standalone JSON value.
//! [`NdjsonLineParser`] turns arbitrary byte chunks into complete lines,
//! holding partial lines across chunk boundaries. Decoding the JSON itself
//! is the caller's job; a line split mid-way through a multi-byte character
//! is reassembled before decoding.

/// Incremental line splitter over a byte stream.
///
/// Feed chunks via [`push`](Self::push) as they arrive; call
/// [`flush`](Self::flush) when the stream ends to recover a trailing line
/// without a final newline.
#[derive(Debug, Default)]
pub struct NdjsonLineParser {
    buffer: Vec<u8>,
}

impl NdjsonLineParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes, returning any lines it completed.
    ///
    /// Empty lines are dropped; a trailing `\r` is stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let raw = std::mem::take(&mut self.buffer);
                if let Some(line) = finish_line(raw) {
                    lines.push(line);
                }
            } else {
                self.buffer.push(byte);
            }
        }
        lines
    }

    /// Emit the trailing unterminated line, if any.
    pub fn flush(&mut self) -> Option<String> {
        finish_line(std::mem::take(&mut self.buffer))
    }
}

fn finish_line(mut raw: Vec<u8>) -> Option<String> {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    if raw.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}
