//! TCP accept loop and per-connection sessions
//!
//! One line in, one line out. Each connection gets its own task; the
//! number of concurrently served sessions is capped by a semaphore. A
//! permit is taken before `accept`, so a saturated pool delays
//! acceptance of new connections instead of admitting sessions it
//! cannot serve.

use crate::dispatch::{self, AppState};
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Serves connections until the shutdown future resolves. In-flight
/// sessions are left to their own tasks; only the accept loop stops.
pub async fn run(
    listener: TcpListener,
    state: AppState,
    workers: usize,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let pool = Arc::new(Semaphore::new(workers.max(1)));
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = pool.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            },
        };
        debug!(%peer, "client connected");
        let state = state.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = session(stream, &state).await {
                debug!(%peer, error = %e, "session ended with error");
            } else {
                debug!(%peer, "client disconnected");
            }
        });
    }

    info!("accept loop stopped");
    Ok(())
}

/// Reads request lines until the client closes the connection. Every
/// line gets exactly one response line, malformed input included.
async fn session(stream: TcpStream, state: &AppState) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = dispatch::handle_line(state, &line).await;
        write_half.write_all(reply.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }
    Ok(())
}
