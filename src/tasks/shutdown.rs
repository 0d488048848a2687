//! # Termination-signal wait for the coordinated-shutdown path.
//!
//! On Unix this completes on `SIGINT`, `SIGTERM`, or `SIGQUIT`; elsewhere on
//! Ctrl-C. Each call registers fresh listeners.

/// Completes when the process receives a termination signal.
///
/// Returns `Err` only if listener registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
    Ok(())
}

/// Completes when the process receives a termination signal.
///
/// Returns `Err` only if listener registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
