//! Readers that turn producer output pipes into decoded items.

use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{decode_bytes, StreamItem};

/// Default buffer size for the output channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Which output pipe an item was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Stream decoded items from any async reader.
///
/// Blank lines are skipped. A final line without a newline is still decoded.
pub fn read_records<R>(
    reader: R,
) -> impl futures_core::Stream<Item = std::io::Result<StreamItem>>
where
    R: AsyncRead + Unpin,
{
    let lines = BufReader::new(reader).split(b'\n');

    futures_util::stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_segment().await {
                Ok(Some(line)) => {
                    if let Some(item) = decode_bytes(&line) {
                        return Some((Ok(item), lines));
                    }
                }
                Ok(None) => return None,
                Err(e) => return Some((Err(e), lines)),
            }
        }
    })
}

/// Read `reader` to EOF in a background task, sending each decoded item.
///
/// The task stops early if the receiver is dropped or the read fails.
pub fn spawn_reader<R>(
    reader: R,
    channel: OutputChannel,
    tx: mpsc::Sender<(OutputChannel, StreamItem)>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let records = read_records(reader);
        futures_util::pin_mut!(records);

        while let Some(item) = records.next().await {
            match item {
                Ok(item) => {
                    if tx.send((channel, item)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(%channel, error = %e, "Failed to read producer output");
                    return;
                }
            }
        }
        tracing::trace!(%channel, "Producer output closed");
    })
}
