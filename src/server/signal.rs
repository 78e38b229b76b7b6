// Signal handling module
//
// SIGTERM and SIGINT both request a graceful stop.

/// Wait until the process is asked to terminate
#[cfg(unix)]
pub async fn wait_for_shutdown() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("[SIGNAL] SIGTERM received, shutting down"),
        _ = sigint.recv() => tracing::info!("[SIGNAL] SIGINT received, shutting down"),
    }
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("[SIGNAL] Ctrl+C received, shutting down");
    Ok(())
}
