pub mod ollama_service;
pub mod open_ai_service;

/// Channel capacity for streamed chat chunks. Bounded so a slow HTTP
/// consumer backpressures the upstream read instead of buffering the
/// whole answer.
pub(crate) const STREAM_CHANNEL_CAP: usize = 32;

/// Reassembles complete lines from a chunked byte stream.
///
/// Network chunks can cut a multibyte UTF-8 character in half, so bytes
/// are buffered raw and only complete lines are decoded. A line that is
/// not valid UTF-8 is dropped; it could not parse as a JSON event
/// anyway.
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pops the next complete line, trimmed, skipping undecodable ones.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            match std::str::from_utf8(&line) {
                Ok(s) => return Some(s.trim().to_string()),
                Err(_) => continue,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks_are_reassembled() {
        let mut lines = LineBuffer::new();
        lines.push(b"first li");
        assert_eq!(lines.next_line(), None);
        lines.push(b"ne\nsecond line\npartial");
        assert_eq!(lines.next_line(), Some("first line".into()));
        assert_eq!(lines.next_line(), Some("second line".into()));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn multibyte_char_cut_by_chunk_boundary_survives() {
        let text = "caf\u{e9} latte\n";
        let bytes = text.as_bytes();
        // Cut inside the two-byte encoding of 'é'.
        let split = text.find('\u{e9}').unwrap() + 1;

        let mut lines = LineBuffer::new();
        lines.push(&bytes[..split]);
        assert_eq!(lines.next_line(), None);
        lines.push(&bytes[split..]);
        assert_eq!(lines.next_line(), Some("caf\u{e9} latte".into()));
    }

    #[test]
    fn invalid_utf8_line_is_dropped() {
        let mut lines = LineBuffer::new();
        lines.push(b"\xC3\x28 broken\nok\n");
        assert_eq!(lines.next_line(), Some("ok".into()));
    }
}
