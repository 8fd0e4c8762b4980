//! Client registry and fan-out worker

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::watcher::ChangeSignal;

/// Identity of one live-update connection
pub type ClientId = Uuid;

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Clients whose queue accepted the payload
    pub delivered: usize,
    /// Clients removed because their queue was full or closed
    pub reaped: usize,
}

/// The receiving half handed to a connection on registration
pub struct ClientSubscription {
    pub id: ClientId,
    receiver: mpsc::Receiver<String>,
}

impl ClientSubscription {
    /// Next payload; `None` once the hub dropped this client
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

/// Registry of connected live clients
///
/// Each client gets a bounded outbound queue. Fan-out never waits on a
/// client: a queue that is full or closed gets its client removed, which
/// closes the queue and ends that connection.
#[derive(Clone)]
pub struct BroadcastHub {
    clients: Arc<DashMap<ClientId, mpsc::Sender<String>>>,
    queue_capacity: usize,
}

impl BroadcastHub {
    /// Create a hub whose clients buffer at most `queue_capacity` payloads
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a client and return its queue
    pub fn register(&self) -> ClientSubscription {
        let id = Uuid::now_v7();
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        self.clients.insert(id, sender);
        ClientSubscription { id, receiver }
    }

    /// Remove a client; returns false if it was already gone
    pub fn unregister(&self, id: &ClientId) -> bool {
        self.clients.remove(id).is_some()
    }

    /// Whether a client is still registered
    pub fn is_registered(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    /// Number of registered clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Push `payload` to every client, reaping the ones that cannot take it
    pub fn on_signal(&self, payload: &str) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut failed = Vec::new();

        for client in self.clients.iter() {
            match client.value().try_send(payload.to_owned()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::info!("Client {} is not keeping up; disconnecting", client.key());
                    failed.push(*client.key());
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Client {} already gone", client.key());
                    failed.push(*client.key());
                }
            }
        }

        // Removal happens after iteration to avoid holding shard locks
        for id in failed {
            if self.clients.remove(&id).is_some() {
                report.reaped += 1;
            }
        }

        report
    }

    /// Drop every client, closing all queues
    pub fn close_all(&self) {
        self.clients.clear();
    }

    /// Spawn the fan-out worker fed by the watcher
    ///
    /// The worker exits when `shutdown` is cancelled or the signal channel
    /// closes; on exit all clients are dropped.
    pub fn spawn(
        &self,
        mut signals: mpsc::Receiver<ChangeSignal>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let hub = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,

                    signal = signals.recv() => match signal {
                        Some(signal) => {
                            let payload = match signal.payload() {
                                Ok(payload) => payload,
                                Err(e) => {
                                    tracing::error!("Error encoding change signal: {}", e);
                                    continue;
                                }
                            };
                            let report = hub.on_signal(&payload);
                            tracing::debug!(
                                delivered = report.delivered,
                                reaped = report.reaped,
                                "Broadcast change signal"
                            );
                        }
                        None => break,
                    }
                }
            }
            hub.close_all();
            tracing::debug!("Broadcast worker stopped");
        })
    }
}
