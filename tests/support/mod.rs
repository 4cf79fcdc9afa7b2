//! Fake transport for driving the overlay without a network
//!
//! Each successful `connect` hands the test a server-side sender for the new
//! connection. Attempts, live connections and client-side closes are counted
//! so tests can check the single-connection and retry properties.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use voice_overlay::{Connection, Frame, OverlayError, Result, Transport};

#[derive(Default)]
struct FakeInner {
    attempts: Vec<Instant>,
    refuse: bool,
    live: usize,
    max_live: usize,
    client_closes: usize,
    server: Option<mpsc::UnboundedSender<Result<Frame>>>,
}

/// Transport whose connections are fed by the test
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following connect attempt fail
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner.lock().refuse = refuse;
    }

    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.inner.lock().attempts.clone()
    }

    pub fn live(&self) -> usize {
        self.inner.lock().live
    }

    pub fn max_live(&self) -> usize {
        self.inner.lock().max_live
    }

    pub fn client_closes(&self) -> usize {
        self.inner.lock().client_closes
    }

    /// Server sends a text frame on the newest connection
    pub fn send_text(&self, text: &str) {
        self.push(Ok(Frame::Text(text.to_string())));
    }

    pub fn send_binary(&self, data: &[u8]) {
        self.push(Ok(Frame::Binary(data.to_vec())));
    }

    /// Server vanishes without a close frame
    pub fn drop_connection(&self) {
        self.inner.lock().server = None;
    }

    /// Server sends a close frame
    pub fn close_connection(&self) {
        self.push(Ok(Frame::Close));
    }

    /// Transport reports a read error
    pub fn fail_connection(&self, message: &str) {
        self.push(Err(OverlayError::TransportError(message.to_string())));
    }

    fn push(&self, frame: Result<Frame>) {
        let inner = self.inner.lock();
        let server = inner.server.as_ref().expect("no open fake connection");
        server.send(frame).expect("fake connection already closed");
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        let mut inner = self.inner.lock();
        inner.attempts.push(Instant::now());
        if inner.refuse {
            return Err(OverlayError::ConnectionError(format!(
                "{endpoint}: connection refused"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        inner.server = Some(tx);
        inner.live += 1;
        inner.max_live = inner.max_live.max(inner.live);

        Ok(Box::new(FakeConnection {
            frames: rx,
            inner: Arc::clone(&self.inner),
            released: false,
        }))
    }
}

struct FakeConnection {
    frames: mpsc::UnboundedReceiver<Result<Frame>>,
    inner: Arc<Mutex<FakeInner>>,
    released: bool,
}

impl FakeConnection {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.lock().live -= 1;
        }
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        self.frames.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.lock().client_closes += 1;
        self.release();
        Ok(())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.release();
    }
}

/// Let every ready task run to completion
///
/// With a paused clock the runtime only moves time forward once nothing else
/// can make progress, so a 1ms sleep drains all pending work first.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
