//! axum WebSocket adapters for the `FrameReader`/`FrameWriter` seam.
//!
//! axum hands over whole messages; the reader re-slices each one into reads of
//! at most one buffer, flagging end-of-message on the last slice, so the
//! connection's reassembly path is the same for every transport.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::{Buf, Bytes};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use hubsocket_core::error::{HubSocketError, Result};

use crate::transport::frame::{FrameReader, FrameWriter, ReadResult};

pub struct WsFrameReader {
    stream: SplitStream<WebSocket>,
    pending: Bytes,
    in_message: bool,
}

impl WsFrameReader {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self {
            stream,
            pending: Bytes::new(),
            in_message: false,
        }
    }
}

#[async_trait]
impl FrameReader for WsFrameReader {
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<ReadResult> {
        if !self.in_message {
            let Some(incoming) = self.stream.next().await else {
                return Ok(ReadResult::Closed);
            };
            let msg = incoming.map_err(|e| HubSocketError::Transport(e.to_string()))?;
            self.pending = match msg {
                Message::Text(s) => Bytes::from(s),
                Message::Binary(b) => Bytes::from(b),
                // axum answers pings itself; both only count as activity here.
                Message::Ping(_) | Message::Pong(_) => return Ok(ReadResult::Control),
                Message::Close(_) => return Ok(ReadResult::Closed),
            };
            self.in_message = true;
        }

        let count = self.pending.remaining().min(buf.len());
        self.pending.copy_to_slice(&mut buf[..count]);
        let end_of_message = !self.pending.has_remaining();
        if end_of_message {
            self.in_message = false;
        }
        Ok(ReadResult::Data { count, end_of_message })
    }
}

pub struct WsFrameWriter {
    sink: SplitSink<WebSocket, Message>,
}

impl WsFrameWriter {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl FrameWriter for WsFrameWriter {
    async fn write_text(&mut self, text: String) -> Result<()> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| HubSocketError::Transport(e.to_string()))
    }

    async fn write_ping(&mut self) -> Result<()> {
        self.sink
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| HubSocketError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| HubSocketError::Transport(e.to_string()))
    }
}

/// Split an upgraded socket into the connection's reader and writer halves.
pub fn split(socket: WebSocket) -> (WsFrameReader, WsFrameWriter) {
    let (tx, rx) = socket.split();
    (WsFrameReader::new(rx), WsFrameWriter::new(tx))
}
