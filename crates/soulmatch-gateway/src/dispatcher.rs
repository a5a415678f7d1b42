use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use soulmatch_bot::Bot;
use soulmatch_types::events::InboundEvent;
use soulmatch_types::models::ExternalId;
use soulmatch_types::transport::ChatTransport;

/// A worker with nothing to do for this long shuts down, and any profile
/// dialogue its user left half-finished goes with it.
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Fans inbound events out to one worker task per identity: events from the
/// same user run strictly in arrival order, different users run concurrently.
pub struct Dispatcher<T> {
    inner: Arc<DispatcherInner<T>>,
}

struct DispatcherInner<T> {
    bot: Arc<Bot<T>>,

    /// Per-identity queues: tg_id -> sender feeding that identity's worker
    queues: RwLock<HashMap<ExternalId, Queue>>,

    /// Set by `shutdown`; later events are dropped
    closed: AtomicBool,
}

struct Queue {
    tx: mpsc::UnboundedSender<InboundEvent>,
    worker: JoinHandle<()>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ChatTransport> Dispatcher<T> {
    pub fn new(bot: Arc<Bot<T>>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                bot,
                queues: RwLock::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Queue an event behind any earlier events from the same sender.
    pub async fn dispatch(&self, event: InboundEvent) {
        let who = event.sender_id();

        // Fast path: the worker is already running
        let event = {
            let queues = self.inner.queues.read().await;
            match queues.get(&who) {
                Some(queue) => match queue.tx.send(event) {
                    Ok(()) => return,
                    // Worker died; fall through and replace it
                    Err(mpsc::error::SendError(event)) => event,
                },
                None => event,
            }
        };

        let mut queues = self.inner.queues.write().await;
        if self.inner.closed.load(Ordering::Acquire) {
            warn!("Dropping event from tg_id {}: shutting down", who);
            return;
        }

        let event = match queues.get(&who) {
            Some(queue) => match queue.tx.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // rx is alive, this can't fail
        let _ = tx.send(event);

        // The worker can't touch the map before we release the write lock
        let worker = tokio::spawn(run_worker(self.clone(), who, rx));
        queues.insert(who, Queue { tx, worker });
        debug!("Started worker for tg_id {}", who);
    }

    /// Number of identities with a live worker.
    pub async fn active_workers(&self) -> usize {
        self.inner.queues.read().await.len()
    }

    /// Stop accepting events and wait for every worker to finish what is
    /// already queued.
    pub async fn shutdown(&self) {
        let drained: Vec<Queue> = {
            let mut queues = self.inner.queues.write().await;
            self.inner.closed.store(true, Ordering::Release);
            queues.drain().map(|(_, queue)| queue).collect()
        };

        info!("Draining {} event workers", drained.len());
        for Queue { tx, worker } in drained {
            // Closing the queue lets the worker exit once it is empty
            drop(tx);
            if let Err(e) = worker.await {
                error!("Event worker ended abnormally: {}", e);
            }
        }
    }

    async fn process(&self, event: InboundEvent) {
        let who = event.sender_id();
        if let Err(e) = self.inner.bot.handle(event).await {
            error!("Event from tg_id {} failed: {}", who, e);
        }
    }
}

async fn run_worker<T: ChatTransport>(
    dispatcher: Dispatcher<T>,
    who: ExternalId,
    mut rx: mpsc::UnboundedReceiver<InboundEvent>,
) {
    loop {
        match tokio::time::timeout(WORKER_IDLE_TIMEOUT, rx.recv()).await {
            Ok(Some(event)) => dispatcher.process(event).await,
            Ok(None) => break,
            Err(_) => {
                // Senders only push while holding the map lock, so with the
                // write lock held the queue can't grow behind our back.
                let mut queues = dispatcher.inner.queues.write().await;
                match rx.try_recv() {
                    Ok(event) => {
                        drop(queues);
                        dispatcher.process(event).await;
                    }
                    Err(_) => {
                        // Still under the lock: a new worker for this user
                        // can't start until the dialogue is gone.
                        dispatcher.inner.bot.abandon_dialogue(who).await;
                        queues.remove(&who);
                        debug!("Worker for tg_id {} retired after idling", who);
                        break;
                    }
                }
            }
        }
    }
}
