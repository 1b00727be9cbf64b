//! Partial-frame reassembly.
//!
//! Transports hand back reads of at most one buffer each; a logical message may
//! span many reads. Bytes are accumulated raw and only decoded as UTF-8 once
//! the transport signals end-of-message, so a multi-byte character split across
//! two reads is never mangled.

use bytes::BytesMut;

use crate::error::{HubSocketError, Result};

#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: BytesMut,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one read. Callers pass exactly the bytes read, never the whole buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered for the message in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// End-of-message: take the accumulated bytes as one message and reset.
    ///
    /// The accumulator is reset even when the bytes are not valid UTF-8, so a
    /// bad message does not bleed into the next one.
    pub fn finish(&mut self) -> Result<String> {
        let bytes = self.buf.split().freeze();
        tracing::trace!(len = bytes.len(), "message complete");
        String::from_utf8(bytes.to_vec())
            .map_err(|e| HubSocketError::BadRequest(format!("message is not valid utf-8: {e}")))
    }
}
