use tokio::signal;

/// Resolves on Ctrl+C or SIGTERM, whichever arrives first.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        _ = ctrl_c => "ctrl_c",
        _ = terminate => "sigterm",
    };

    tracing::info!(source, "Shutdown signal received; draining in-flight requests");
}
