//! Frame sources feeding raw beacon maps into the decoder.
//!
//! A frame is one JSON value handed over by the ranging collaborator,
//! normally an array of raw beacon maps. Sources run in their own task and
//! deliver frames over a bounded channel; the channel closes when the source
//! is exhausted.

use crate::codec::DecodeError;
use serde_json::Value;
use std::future::Future;
use std::io;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Channel buffer size for incoming frames.
pub const FRAME_CHANNEL_BUFFER_SIZE: usize = 100;

/// A parsed frame, or the reason it could not be parsed.
pub type FrameResult = Result<Value, DecodeError>;

/// Error type for source operations.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Reading the underlying stream failed
    #[error("Source I/O error: {0}")]
    Io(#[from] io::Error),
    /// Frame decoding error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Boxed future returned by [`FrameSource::start`].
pub type StartFuture<'a> =
    Pin<Box<dyn Future<Output = Result<mpsc::Receiver<FrameResult>, SourceError>> + Send + 'a>>;

/// Source abstraction so the run loop can be tested without a real stream.
pub trait FrameSource: Send + Sync {
    fn start(&self) -> StartFuture<'_>;
}

/// Parse one line of input into a batch frame.
///
/// Blank lines yield `None`. A single object is wrapped in a one-entry array
/// so it goes through the batch path like everything else.
pub fn parse_frame(line: &str) -> Option<FrameResult> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<Value>(line)
            .map(|value| match value {
                Value::Object(_) => Value::Array(vec![value]),
                other => other,
            })
            .map_err(DecodeError::from),
    )
}

/// Forward every line of `reader` as a frame until EOF or until the receiver
/// goes away.
pub async fn forward_lines<R>(reader: R, tx: mpsc::Sender<FrameResult>) -> Result<(), SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(frame) = parse_frame(&line) else {
            continue;
        };
        if tx.send(frame).await.is_err() {
            debug!("frame receiver dropped, stopping source");
            break;
        }
    }
    Ok(())
}

/// Reads newline-delimited JSON frames from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinSource;

impl FrameSource for StdinSource {
    fn start(&self) -> StartFuture<'_> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(FRAME_CHANNEL_BUFFER_SIZE);

            tokio::spawn(async move {
                let reader = BufReader::new(tokio::io::stdin());
                if let Err(e) = forward_lines(reader, tx).await {
                    tracing::error!(error = %e, "stdin source failed");
                }
            });

            Ok(rx)
        })
    }
}
