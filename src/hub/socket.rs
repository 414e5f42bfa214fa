use async_trait::async_trait;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use thiserror::Error;

/// The handful of frame kinds the adapters care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Ping,
    Pong,
    /// Normal closure, optionally carrying a human-readable reason
    Close(Option<String>),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("message of {0} bytes exceeds the read limit")]
    MessageTooLarge(usize),

    #[error("no pong received in time")]
    ReadTimeout,

    #[error("write timed out")]
    WriteTimeout,
}

/// Write half of a connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError>;
}

/// Read half of a connection
#[async_trait]
pub trait FrameStream: Send {
    /// Next frame from the peer, `None` once the connection is gone.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Ping => Message::Ping(Vec::new()),
            Frame::Pong => Message::Pong(Vec::new()),
            Frame::Close(reason) => Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: reason.unwrap_or_default().into(),
            })),
        };
        self.send(message)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl FrameStream for SplitStream<WebSocket> {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let frame = match self.next().await? {
                Ok(Message::Text(text)) => Frame::Text(text),
                Ok(Message::Ping(_)) => Frame::Ping,
                Ok(Message::Pong(_)) => Frame::Pong,
                Ok(Message::Close(frame)) => Frame::Close(frame.map(|f| f.reason.into_owned())),
                // Keepers only speak text
                Ok(Message::Binary(_)) => continue,
                Err(e) => return Some(Err(TransportError::ReceiveFailed(e.to_string()))),
            };
            return Some(Ok(frame));
        }
    }
}
