//! Partial-line reassembly for raw socket reads
//!
//! A single read may carry nothing useful, part of a line, or several lines.
//! `LineAssembler` accumulates bytes until a newline shows up and hands back
//! the finished line. It consumes at most one line per call so the caller
//! can switch capture context (name, chat, command) between lines of the
//! same read.

use log::debug;

/// Bounded accumulator for one newline-terminated line
#[derive(Debug)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    capacity: usize,
}

impl LineAssembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Consumes `input` up to and including the first newline.
    ///
    /// Returns how many bytes were consumed and, when a newline was found,
    /// the completed line without its terminator. Bytes past the capacity
    /// are dropped, never stored.
    pub fn feed(&mut self, input: &[u8]) -> (usize, Option<String>) {
        match input.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                self.append(&input[..pos]);
                (pos + 1, Some(self.take_line()))
            }
            None => {
                self.append(input);
                (input.len(), None)
            }
        }
    }

    fn append(&mut self, bytes: &[u8]) {
        let room = self.capacity.saturating_sub(self.buffer.len());
        let take = room.min(bytes.len());
        if take < bytes.len() {
            debug!("Dropping {} bytes beyond line capacity", bytes.len() - take);
        }
        self.buffer.extend_from_slice(&bytes[..take]);
    }

    fn take_line(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.buffer);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Bytes received so far for the unfinished line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
