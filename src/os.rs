use tokio::{sync::watch, task::JoinError};

// Resolve once SIGINT, SIGTERM or SIGQUIT arrives.
#[cfg(unix)]
pub async fn handle_shutdown() {
    use tokio::signal::unix;

    let (mut sigquit_signal, mut sigterm_signal, mut sigint_signal) = match (
        unix::signal(unix::SignalKind::quit()),
        unix::signal(unix::SignalKind::terminate()),
        unix::signal(unix::SignalKind::interrupt()),
    ) {
        (Ok(quit), Ok(term), Ok(int)) => (quit, term, int),
        _ => {
            log::warn!("Failed to install unix signal handlers, falling back to ctrl-c");
            return handle_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigquit_signal.recv() => {
            log::info!("Received SIGQUIT signal");
        }
        _ = sigterm_signal.recv() => {
            log::info!("Received SIGTERM signal");
        }
        _ = sigint_signal.recv() => {
            log::info!("Received SIGINT signal");
        }
    };
}

#[cfg(not(unix))]
pub async fn handle_shutdown() {
    handle_ctrl_c().await
}

async fn handle_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Received ctrl-c"),
        Err(e) => {
            log::error!("Failed to listen for shutdown signal: {}", e);
            // never resolve, the process keeps serving
            std::future::pending::<()>().await
        }
    }
}

// Flip the shared stop flag once a shutdown signal arrives.
pub fn spawn_shutdown_listener(sender: watch::Sender<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        handle_shutdown().await;

        if sender.send(true).is_err() {
            log::debug!("No task is listening for shutdown");
        }
    })
}

// Log how a background task ended. Returns false when it panicked or was cancelled.
pub fn report_task_end(task: &str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => {
            log::info!("{} stopped", task);
            true
        }
        Err(e) => {
            log::error!("{} task failed: {}", task, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::report_task_end;

    #[tokio::test]
    async fn test_report_task_end_flags_panics() {
        let finished = tokio::spawn(async {});
        let panicked = tokio::spawn(async { panic!("sweeper blew up") });

        assert!(report_task_end("finished", finished.await));
        assert!(!report_task_end("panicked", panicked.await));
    }
}
