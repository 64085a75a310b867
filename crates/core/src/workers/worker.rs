use std::future::Future;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// A background stage fed through an inbox until shutdown or until every
/// sender is gone.
pub trait Worker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;

    type Job: Send + 'static;

    fn handle(&mut self, job: Self::Job) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn run(
        mut self,
        mut inbox: mpsc::Receiver<Self::Job>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> impl Future<Output = ()> + Send {
        async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    job = inbox.recv() => match job {
                        Some(job) => {
                            if let Err(e) = self.handle(job).await {
                                warn!(worker = Self::SUBSCRIBER_ID, error = %e, "job failed");
                            }
                        }
                        None => break,
                    },
                }
            }
            debug!(worker = Self::SUBSCRIBER_ID, "worker stopped");
        }
    }
}
