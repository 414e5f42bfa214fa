#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

use courtside::hub::{Frame, FrameSink, FrameStream, TransportError};
use courtside::stats::StatlineSnapshot;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Server-side write half: everything written lands in the client's inbox
pub struct MockSink(mpsc::UnboundedSender<Frame>);

#[async_trait]
impl FrameSink for MockSink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.0
            .send(frame)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

/// Server-side read half, fed by the client
pub struct MockStream(mpsc::UnboundedReceiver<Result<Frame, TransportError>>);

#[async_trait]
impl FrameStream for MockStream {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        self.0.recv().await
    }
}

/// A peer that never finishes reading, so every write hangs
pub struct StalledSink;

#[async_trait]
impl FrameSink for StalledSink {
    async fn send_frame(&mut self, _frame: Frame) -> Result<(), TransportError> {
        std::future::pending().await
    }
}

/// The remote end of a mock connection
pub struct MockClient {
    outgoing: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    incoming: mpsc::UnboundedReceiver<Frame>,
    pending: VecDeque<String>,
}

pub fn mock_connection() -> (MockSink, MockStream, MockClient) {
    let (to_client, incoming) = mpsc::unbounded_channel();
    let (outgoing, from_client) = mpsc::unbounded_channel();
    (
        MockSink(to_client),
        MockStream(from_client),
        MockClient {
            outgoing,
            incoming,
            pending: VecDeque::new(),
        },
    )
}

impl MockClient {
    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(&value.to_string());
    }

    pub fn send_text(&self, text: &str) {
        let _ = self.outgoing.send(Ok(Frame::Text(text.to_string())));
    }

    pub fn send_close(&self) {
        let _ = self.outgoing.send(Ok(Frame::Close(None)));
    }

    /// Simulates the connection dropping mid-read
    pub fn fail(&self, reason: &str) {
        let _ = self
            .outgoing
            .send(Err(TransportError::ReceiveFailed(reason.to_string())));
    }

    /// Next frame written by the server, skipping heartbeats
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match tokio::time::timeout(RECEIVE_TIMEOUT, self.incoming.recv()).await {
                Ok(Some(Frame::Ping)) => continue,
                Ok(frame) => return frame,
                Err(_) => return None,
            }
        }
    }

    /// Next message, splitting coalesced writes
    pub async fn next_message(&mut self) -> String {
        if let Some(message) = self.pending.pop_front() {
            return message;
        }
        match self.next_frame().await {
            Some(Frame::Text(text)) => {
                self.pending.extend(text.split('\n').map(str::to_string));
                self.pending.pop_front().unwrap()
            }
            other => panic!("expected a text frame, got {:?}", other),
        }
    }

    pub async fn next_snapshot(&mut self) -> StatlineSnapshot {
        let message = self.next_message().await;
        serde_json::from_str(&message)
            .unwrap_or_else(|e| panic!("not a snapshot ({e}): {message}"))
    }

    /// Waits for the server's close frame and returns its reason
    pub async fn expect_close(&mut self) -> Option<String> {
        loop {
            match self.next_frame().await {
                Some(Frame::Close(reason)) => return reason,
                Some(Frame::Text(_)) => continue,
                other => panic!("expected a close frame, got {:?}", other),
            }
        }
    }

    /// Whether nothing else arrives within a short grace period
    pub async fn is_quiet(&mut self) -> bool {
        self.pending.is_empty()
            && tokio::time::timeout(Duration::from_millis(100), self.incoming.recv())
                .await
                .is_err()
    }
}
