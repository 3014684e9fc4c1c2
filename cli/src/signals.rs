//! Turns SIGINT / SIGTERM into a cancelled token.

use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancel `token` on the first interrupt or terminate signal.
///
/// Handlers are installed before this returns, so a signal delivered right
/// after the call is not lost.
#[cfg(unix)]
pub fn listen_for_shutdown(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!("Received {name}");
        token.cancel();
    }))
}

/// Cancel `token` on the first Ctrl-C.
#[cfg(not(unix))]
pub fn listen_for_shutdown(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                token.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {e}"),
        }
    }))
}
