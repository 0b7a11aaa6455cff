//! Adapters from an axum [`WebSocket`] to the manager's connection halves.
//!
//! Messages travel as JSON text frames. Binary frames holding JSON are
//! accepted on the way in; ping/pong frames are transport noise and are
//! skipped.

use axum::extract::ws::{self, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::domain::Message;
use crate::error::ConnectionError;
use crate::manager::{MessageSink, MessageSource};

/// Write half of an upgraded socket.
#[derive(Debug)]
pub struct WsSink {
    inner: SplitSink<WebSocket, ws::Message>,
}

/// Read half of an upgraded socket.
#[derive(Debug)]
pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

/// Splits `socket` into the halves the manager expects.
#[must_use]
pub fn split(socket: WebSocket) -> (WsSink, WsSource) {
    let (sink, stream) = socket.split();
    (WsSink { inner: sink }, WsSource { inner: stream })
}

impl MessageSink for WsSink {
    async fn write(&mut self, message: &Message) -> Result<(), ConnectionError> {
        let text = message.encode()?;
        self.inner
            .send(ws::Message::text(text))
            .await
            .map_err(ConnectionError::transport)
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.inner.close().await.map_err(ConnectionError::transport)
    }
}

impl MessageSource for WsSource {
    async fn read(&mut self) -> Result<Message, ConnectionError> {
        loop {
            match self.inner.next().await {
                Some(Ok(ws::Message::Text(text))) => return Ok(Message::decode(text.as_str())?),
                Some(Ok(ws::Message::Binary(bytes))) => return Ok(Message::decode_slice(&bytes)?),
                Some(Ok(ws::Message::Ping(_) | ws::Message::Pong(_))) => {}
                Some(Ok(ws::Message::Close(_))) | None => return Err(ConnectionError::Closed),
                Some(Err(err)) => return Err(ConnectionError::transport(err)),
            }
        }
    }
}
