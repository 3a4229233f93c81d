use anyhow::Result;
use autoreply_application::ReplyService;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Resolves and prints a reply; Ctrl-C interrupts a pending resolution.
pub async fn run(service: &ReplyService, sender: &str, message: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning reply resolution");
            on_ctrl_c.cancel();
        }
    });

    let result = service
        .resolve_for_incoming_cancellable(sender, message, &cancel)
        .await;
    watcher.abort();

    println!("{}", result?);
    Ok(())
}
