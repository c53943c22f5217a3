use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The dispatcher watches the token and kills every outstanding
/// child before returning, since stopped children would otherwise outlive the
/// scheduler, frozen forever. Both streams are installed here, before any
/// job is launched, so a failure is a startup error rather than a silently
/// missing handler.
pub fn install_shutdown_handler() -> Result<CancellationToken> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, stopping dispatch");
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, stopping dispatch");
            }
        }

        token_clone.cancel();
    });

    Ok(token)
}
