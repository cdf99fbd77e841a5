//! Line-delimited JSON over stdio.
//!
//! One `HostEvent` per inbound line, one `OutboundRequest` per outbound line.

use nudge_core::protocol::{HostEvent, OutboundRequest};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Forward parsed events until the reader hits EOF. Malformed lines are
/// logged and skipped. Returns the number of events forwarded.
pub async fn read_events<R>(reader: R, events: mpsc::UnboundedSender<HostEvent>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read host input");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<HostEvent>(line) {
            Ok(event) => {
                if events.send(event).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(e) => tracing::warn!(error = %e, "skipping malformed host event"),
        }
    }
    tracing::debug!(forwarded, "host input closed");
    forwarded
}

/// Write each request as one JSON line, flushing after every line so the
/// collaborator sees it immediately.
pub async fn write_requests<W>(
    mut writer: W,
    mut requests: mpsc::UnboundedReceiver<OutboundRequest>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(request) = requests.recv().await {
        let mut line = serde_json::to_vec(&request)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
