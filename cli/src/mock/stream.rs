//! # DockMock Progress Streams
//!
//! File: cli/src/mock/stream.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Pull and build are long-running on a real daemon: the response body is a
//! stream of JSON progress messages. DockMock emulates that with a push-based
//! channel. A producer (`StreamSender`) emits zero or more data chunks and then
//! exactly one terminal event, `end` or `error`. The consumer side
//! (`ProgressStream`) is a `futures` `Stream` of `Result<Bytes, StreamError>`
//! and can be handed out as a response body while the producer is still going.
//!
//! ## Architecture
//!
//! - The terminal methods take `self` by value, so nothing can be sent after a
//!   terminal event.
//! - Listeners registered with `on_end` / `on_error` run inside `poll_next`,
//!   at the moment the consumer observes the terminal event and before the
//!   stream reports exhaustion. Chunks are always delivered before listeners
//!   run, and a stream nobody drains never runs them.
//! - A producer dropped without a terminal event counts as an error.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::mock::stream::ProgressStream;
//! use futures_util::StreamExt;
//!
//! # async fn run() {
//! let mut stream = ProgressStream::from_chunks(vec![r#"{"status":"Pulling"}"#]);
//! stream.on_end(|| println!("pull finished"));
//! while let Some(chunk) = stream.next().await {
//!     println!("{:?}", chunk);
//! }
//! # }
//! ```
//!
use bytes::Bytes;
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Failure reported on a stream's error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StreamError {
    pub message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
enum StreamEvent {
    Data(Bytes),
    End,
    Error(StreamError),
}

type EndListener = Box<dyn FnOnce() + Send>;
type ErrorListener = Box<dyn FnOnce(&StreamError) + Send>;

/// Producer half of a progress stream.
#[derive(Debug)]
pub struct StreamSender {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl StreamSender {
    /// Emits one chunk. Returns `false` once the consumer is gone.
    pub fn data(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.send(StreamEvent::Data(chunk.into())).is_ok()
    }

    pub fn end(self) {
        let _ = self.tx.send(StreamEvent::End);
    }

    pub fn error(self, err: StreamError) {
        let _ = self.tx.send(StreamEvent::Error(err));
    }
}

/// Creates a connected producer/consumer pair.
pub fn channel() -> (StreamSender, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        StreamSender { tx },
        ProgressStream {
            rx,
            on_end: Vec::new(),
            on_error: Vec::new(),
            finished: false,
        },
    )
}

/// Consumer half of a progress stream, usable as a response body.
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    on_end: Vec<EndListener>,
    on_error: Vec<ErrorListener>,
    finished: bool,
}

impl ProgressStream {
    /// A stream that yields `chunks` and then ends.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let (tx, stream) = channel();
        for chunk in chunks {
            tx.data(chunk);
        }
        tx.end();
        stream
    }

    /// A stream that yields `chunks` and then fails with `message`.
    pub fn failing<I, C>(chunks: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let (tx, stream) = channel();
        for chunk in chunks {
            tx.data(chunk);
        }
        tx.error(StreamError::new(message));
        stream
    }

    /// Registers a listener for the `end` event.
    pub fn on_end(&mut self, listener: impl FnOnce() + Send + 'static) -> &mut Self {
        self.on_end.push(Box::new(listener));
        self
    }

    /// Registers a listener for the `error` event.
    pub fn on_error(&mut self, listener: impl FnOnce(&StreamError) + Send + 'static) -> &mut Self {
        self.on_error.push(Box::new(listener));
        self
    }

    /// True once a terminal event has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drains the stream, returning every chunk or the first error.
    pub async fn drain(mut self) -> Result<Vec<Bytes>, StreamError> {
        use futures_util::StreamExt;

        let mut chunks = Vec::new();
        while let Some(item) = self.next().await {
            chunks.push(item?);
        }
        Ok(chunks)
    }

    fn fire_end(&mut self) {
        debug!("Progress stream ended; running {} listener(s)", self.on_end.len());
        self.on_error.clear();
        for listener in self.on_end.drain(..) {
            listener();
        }
    }

    fn fire_error(&mut self, err: &StreamError) {
        warn!("Progress stream failed: {}", err);
        self.on_end.clear();
        for listener in self.on_error.drain(..) {
            listener(err);
        }
    }
}

impl Stream for ProgressStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(StreamEvent::Data(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(StreamEvent::End)) => {
                this.finished = true;
                this.fire_end();
                Poll::Ready(None)
            }
            Poll::Ready(Some(StreamEvent::Error(err))) => {
                this.finished = true;
                this.fire_error(&err);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                let err = StreamError::new("stream closed without a terminal event");
                this.fire_error(&err);
                Poll::Ready(Some(Err(err)))
            }
        }
    }
}

impl fmt::Debug for ProgressStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStream")
            .field("end_listeners", &self.on_end.len())
            .field("error_listeners", &self.on_error.len())
            .field("finished", &self.finished)
            .finish()
    }
}
