//! TCP Listener - accepts producers, one handler task per connection
//!
//! Accept waits are bounded and raced against the shutdown signal. Concurrent
//! handlers are capped by a semaphore; once the cap is hit new connections
//! wait in the kernel backlog until a handler finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};

use super::connection::handle_connection;
use crate::logic::context::PipelineContext;

/// Pause after an accept error (e.g. fd exhaustion) before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run_listener(
    listener: TcpListener,
    ctx: Arc<PipelineContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    let poll = ctx.config.accept_poll_interval;
    let limiter = Arc::new(Semaphore::new(ctx.config.max_connections));

    log::info!("Server listening on {}", local);

    loop {
        if *shutdown.borrow() {
            break;
        }

        let permit = tokio::select! {
            _ = shutdown.changed() => break,
            permit = Arc::clone(&limiter).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let accepted = tokio::select! {
            _ = shutdown.changed() => break,
            result = tokio::time::timeout(poll, listener.accept()) => result,
        };

        match accepted {
            // Poll interval elapsed with no traffic
            Err(_) => continue,
            Ok(Ok((stream, peer))) => {
                let ctx = Arc::clone(&ctx);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    handle_connection(stream, Some(peer), ctx, shutdown).await;
                    drop(permit);
                });
            }
            Ok(Err(e)) => {
                if *shutdown.borrow() {
                    log::debug!("Accept interrupted by shutdown: {}", e);
                    break;
                }
                log::error!("Error accepting client: {}", e);
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    drop(listener);
    log::info!("Listener on {} stopped", local);
}
