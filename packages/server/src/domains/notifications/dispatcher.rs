//! Off-loaded mail delivery.
//!
//! The mail transport blocks for a full network round trip. Requests are
//! queued to a worker task that runs each send on the blocking pool, so the
//! runtime never stalls on SMTP. Sends are independent: a slow relay for one
//! incident doesn't hold up the next.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::kernel::{BaseMailer, OutgoingMessage};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Terminal result of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

struct DispatchJob {
    message: OutgoingMessage,
    reply: oneshot::Sender<DispatchOutcome>,
}

/// Handle for submitting messages. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<DispatchJob>,
}

/// Receives queued jobs and hands each to the blocking pool.
pub struct DispatchWorker {
    receiver: mpsc::Receiver<DispatchJob>,
    mailer: Arc<dyn BaseMailer>,
}

impl NotificationDispatcher {
    /// Create a dispatcher and its (not yet running) worker.
    pub fn channel(mailer: Arc<dyn BaseMailer>, capacity: usize) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, DispatchWorker { receiver, mailer })
    }

    /// Create a dispatcher and spawn its worker on the current runtime.
    pub fn spawn(mailer: Arc<dyn BaseMailer>) -> (Self, JoinHandle<()>) {
        let (dispatcher, worker) = Self::channel(mailer, DEFAULT_QUEUE_CAPACITY);
        let handle = tokio::spawn(worker.run());
        (dispatcher, handle)
    }

    /// Deliver one message and wait for the outcome.
    ///
    /// Waits for queue space if the worker is backed up. Never returns an
    /// error: transport failures and a stopped worker are both reported as
    /// [`DispatchOutcome::Failed`].
    pub async fn send(&self, contact: &str, subject: &str, body: &str) -> DispatchOutcome {
        let (job, outcome) = DispatchJob::new(contact, subject, body);

        if self.sender.send(job).await.is_err() {
            error!(contact = %contact, "Notification worker is not running");
            return failed("notification worker is not running");
        }

        outcome
            .await
            .unwrap_or_else(|_| failed("notification worker dropped the message"))
    }
}

impl DispatchJob {
    fn new(
        contact: &str,
        subject: &str,
        body: &str,
    ) -> (Self, oneshot::Receiver<DispatchOutcome>) {
        let (reply, outcome) = oneshot::channel();
        let job = Self {
            message: OutgoingMessage {
                to: contact.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            },
            reply,
        };
        (job, outcome)
    }
}

fn failed(reason: &str) -> DispatchOutcome {
    DispatchOutcome::Failed {
        reason: reason.to_string(),
    }
}

impl DispatchWorker {
    /// Run until every dispatcher handle is dropped.
    pub async fn run(mut self) {
        info!("Notification worker started");
        while let Some(job) = self.receiver.recv().await {
            let mailer = self.mailer.clone();
            tokio::spawn(async move {
                let outcome = deliver(mailer, job.message).await;
                let _ = job.reply.send(outcome);
            });
        }
        info!("Notification worker stopped");
    }
}

async fn deliver(mailer: Arc<dyn BaseMailer>, message: OutgoingMessage) -> DispatchOutcome {
    let to = message.to.clone();
    let result = tokio::task::spawn_blocking(move || mailer.send(&message)).await;

    match result {
        Ok(Ok(())) => {
            info!(contact = %to, "Incident report delivered");
            DispatchOutcome::Delivered
        }
        Ok(Err(e)) => {
            warn!(contact = %to, error = %e, "Incident report delivery failed");
            DispatchOutcome::Failed {
                reason: e.to_string(),
            }
        }
        Err(e) => {
            error!(contact = %to, error = %e, "Mail task panicked");
            DispatchOutcome::Failed {
                reason: format!("mail task failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::kernel::MockMailer;

    #[tokio::test]
    async fn test_delivered_message_reaches_mailer() {
        let mailer = Arc::new(MockMailer::new());
        let (dispatcher, _worker) = NotificationDispatcher::spawn(mailer.clone());

        let outcome = dispatcher
            .send("police@krakow.gov.pl", "112 Alert: theft", "{}")
            .await;

        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(
            mailer.sent(),
            vec![OutgoingMessage {
                to: "police@krakow.gov.pl".to_string(),
                subject: "112 Alert: theft".to_string(),
                body: "{}".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_outcome() {
        let mailer = Arc::new(MockMailer::failing());
        let (dispatcher, _worker) = NotificationDispatcher::spawn(mailer.clone());

        let outcome = dispatcher.send("a@b.pl", "s", "b").await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(mailer.attempts(), 1);
    }

    #[tokio::test]
    async fn test_stopped_worker_fails_instead_of_hanging() {
        let mailer: Arc<dyn BaseMailer> = Arc::new(MockMailer::new());
        let (dispatcher, worker) = NotificationDispatcher::channel(mailer, 4);
        drop(worker);

        let outcome = dispatcher.send("a@b.pl", "s", "b").await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_sends_run_concurrently() {
        let mailer = Arc::new(MockMailer::new().with_delay(Duration::from_millis(300)));
        let (dispatcher, _worker) = NotificationDispatcher::spawn(mailer.clone());

        let started = Instant::now();
        let (a, b, c) = tokio::join!(
            dispatcher.send("a@b.pl", "s", "1"),
            dispatcher.send("b@b.pl", "s", "2"),
            dispatcher.send("c@b.pl", "s", "3"),
        );

        assert!(a.is_delivered() && b.is_delivered() && c.is_delivered());
        assert!(started.elapsed() < Duration::from_millis(850));
        assert_eq!(mailer.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_runtime_stays_responsive_during_send() {
        let mailer = Arc::new(MockMailer::new().with_delay(Duration::from_millis(300)));
        let (dispatcher, _worker) = NotificationDispatcher::spawn(mailer);

        let send = tokio::spawn(async move { dispatcher.send("a@b.pl", "s", "b").await });

        // A current-thread runtime would starve this timer if the send blocked it.
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(250));

        assert!(send.await.unwrap().is_delivered());
    }
}
