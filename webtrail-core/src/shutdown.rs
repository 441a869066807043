use tokio::sync::watch;

/// Cooperative shutdown signal shared between the signal handler and the
/// scheduler loop. Cloning hands out additional trigger handles; receivers
/// come from [`ShutdownHandle::subscribe`].
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn signal(&self) {
        let _ = self.tx.send(true);
        tracing::info!("shutdown signaled");
    }

    /// Blocks until SIGINT or SIGTERM, then signals shutdown.
    pub async fn install_signal_handler(&self) -> anyhow::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => tracing::info!("SIGINT received"),
            _ = terminate.recv() => tracing::info!("SIGTERM received"),
        }

        self.signal();
        Ok(())
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}
