//! Connection Handler - one producer connection
//!
//! Framing is newline-delimited JSON. A frame longer than the configured
//! limit is skipped up to the next newline; the connection stays open.
//! Errors end this handler only and are never propagated.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::watch;

use crate::logic::context::PipelineContext;
use crate::logic::error::DecodeError;

/// Outcome of reading one frame into the caller's buffer
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A complete frame (newline and trailing `\r` removed)
    Line,
    /// Frame exceeded the limit and was discarded
    Oversized,
    /// Peer closed the connection
    Eof,
}

/// Read the next frame. At EOF an unterminated trailing frame still counts.
pub async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for the content plus a `\r\n` terminator
    let cap = (limit as u64).saturating_add(2);
    let read = (&mut *reader).take(cap).read_until(b'\n', buf).await?;

    if read == 0 {
        return Ok(Frame::Eof);
    }

    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    if buf.len() <= limit {
        return Ok(Frame::Line);
    }

    buf.clear();
    if terminated {
        return Ok(Frame::Oversized);
    }

    // Skip the rest of the oversized frame
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(Frame::Oversized);
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(Frame::Oversized);
        }
    }
}

/// Serve one connection until EOF, read error or shutdown.
/// Returns the number of samples pushed.
pub async fn handle_connection<S>(
    stream: S,
    peer: Option<SocketAddr>,
    ctx: Arc<PipelineContext>,
    mut shutdown: watch::Receiver<bool>,
) -> u64
where
    S: AsyncRead + Unpin,
{
    let peer_label = peer.map(|p| p.to_string()).unwrap_or_else(|| "<local>".to_string());
    let limit = ctx.config.max_frame_bytes;
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(1024);
    let mut pushed = 0u64;

    ctx.stats.connection_opened();
    log::info!("Client connected: {}", peer_label);

    loop {
        if *shutdown.borrow() {
            break;
        }

        let frame = tokio::select! {
            _ = shutdown.changed() => {
                log::debug!("Closing {} on shutdown", peer_label);
                break;
            }
            frame = read_frame(&mut reader, &mut buf, limit) => frame,
        };

        match frame {
            Ok(Frame::Eof) => break,
            Ok(Frame::Oversized) => {
                ctx.stats.decode_error();
                log::warn!("Dropped frame from {}: {}", peer_label, DecodeError::FrameTooLarge { limit });
            }
            Ok(Frame::Line) => {
                if buf.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                ctx.stats.frame_received();

                match ctx.decoder.decode_frame(&buf, peer) {
                    Ok(sample) => {
                        log::debug!("Data received from {}: {} features", peer_label, sample.len());
                        ctx.buffer.push(sample);
                        ctx.stats.sample_pushed();
                        pushed += 1;
                    }
                    Err(e) => {
                        ctx.stats.decode_error();
                        log::warn!("Invalid message from {}: {}", peer_label, e);
                    }
                }
            }
            Err(e) => {
                if *shutdown.borrow() {
                    log::debug!("Read from {} interrupted by shutdown: {}", peer_label, e);
                } else {
                    log::warn!("Read error from {}: {}", peer_label, e);
                }
                break;
            }
        }
    }

    drop(reader);
    ctx.stats.connection_closed();
    log::info!("Client disconnected: {} ({} samples)", peer_label, pushed);
    pushed
}
