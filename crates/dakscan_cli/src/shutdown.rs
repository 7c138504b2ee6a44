use console::Term;

/// Resolve when the user presses Ctrl+C.
///
/// Never resolves if the signal handler cannot be installed.
pub(crate) async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }

    if Term::stdout().is_term() {
        eprintln!("\n\nInterrupted, saving finished checks...");
    } else {
        tracing::warn!("Interrupted, saving finished checks");
    }
}
