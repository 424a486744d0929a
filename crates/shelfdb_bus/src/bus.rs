//! The event bus: worker pool, queue, and completion signaling.

use crate::error::{BusError, BusResult};
use crate::handler::{ErasedHandler, EventHandler, TypedHandler};
use crate::ticket::{Ticket, TicketSequence};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type HandlerList<R> = Vec<Arc<dyn ErasedHandler<R>>>;
type HandlerRegistry<R> = Arc<RwLock<HashMap<TypeId, HandlerList<R>>>>;

/// One queued publish: the event plus its completion signal.
///
/// The reply sender travels with the event, so a publish and its
/// resolution are paired by construction and can never collide.
struct Envelope<R> {
    ticket: Ticket,
    type_id: TypeId,
    event_type: &'static str,
    event: Arc<dyn Any + Send + Sync>,
    reply: oneshot::Sender<BusResult<R>>,
}

/// Completion signal for one publish call.
///
/// Resolves once a handler for the event finishes (or fails), or
/// immediately when no handler is registered or the bus is closed.
#[derive(Debug)]
pub struct Receipt<R> {
    ticket: Ticket,
    reply: oneshot::Receiver<BusResult<R>>,
}

impl<R> Receipt<R> {
    /// Returns the ticket assigned to this publish.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Waits for the publish to resolve.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, [`BusError::NoHandler`] when nothing
    /// was registered for the event type, or [`BusError::Dropped`] if
    /// the bus went away before resolution.
    pub async fn wait(self) -> BusResult<R> {
        self.reply.await.map_err(|_| BusError::Dropped)?
    }
}

/// A typed publish/subscribe dispatcher.
///
/// A fixed pool of worker tasks continuously pulls events from an
/// unbounded queue. Each event is dispatched to every handler registered
/// for its concrete type; the first handler to finish resolves the
/// publish's [`Receipt`], the rest still run to completion. There is no
/// cancellation: once published, an event always runs to completion or
/// failure.
///
/// Must be constructed inside a tokio runtime; workers are spawned on
/// the current runtime and live until [`shutdown`](Self::shutdown).
pub struct EventBus<R> {
    handlers: HandlerRegistry<R>,
    queue: mpsc::UnboundedSender<Envelope<R>>,
    tickets: TicketSequence,
    workers: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> EventBus<R> {
    /// Creates a bus backed by `workers` dispatch tasks (at least one).
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let handlers: HandlerRegistry<R> = Arc::new(RwLock::new(HashMap::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                let handlers = Arc::clone(&handlers);
                tokio::spawn(Self::worker_loop(rx, handlers))
            })
            .collect();

        Self {
            handlers,
            queue: tx,
            tickets: TicketSequence::new(),
            workers,
        }
    }

    /// Registers a handler for events of type `E`.
    ///
    /// Several handlers may be registered for the same type; all of them
    /// run for every matching event.
    pub fn register<E, H>(&self, handler: H)
    where
        E: Any + Send + Sync,
        H: EventHandler<E, R>,
    {
        self.handlers
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Arc::new(TypedHandler::<E, H>::new(handler)));
    }

    /// Publishes an event, returning its completion signal.
    ///
    /// Never blocks: the queue is unbounded. Publishing after
    /// [`shutdown`](Self::shutdown) resolves the receipt with
    /// [`BusError::Closed`].
    pub fn publish<E>(&self, event: E) -> Receipt<R>
    where
        E: Any + Send + Sync,
    {
        let ticket = self.tickets.next();
        let (reply_tx, reply_rx) = oneshot::channel();

        let envelope = Envelope {
            ticket,
            type_id: TypeId::of::<E>(),
            event_type: std::any::type_name::<E>(),
            event: Arc::new(event),
            reply: reply_tx,
        };

        debug!("publish {} ({})", ticket, envelope.event_type);
        if let Err(rejected) = self.queue.send(envelope) {
            let _ = rejected.0.reply.send(Err(BusError::Closed));
        }

        Receipt {
            ticket,
            reply: reply_rx,
        }
    }

    /// Closes the queue and waits for the workers to drain it.
    ///
    /// Events already queued are still dispatched; receipts of anything
    /// published afterwards resolve with [`BusError::Closed`].
    pub async fn shutdown(mut self) {
        drop(self.queue);
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
    }

    async fn worker_loop(
        rx: Arc<Mutex<mpsc::UnboundedReceiver<Envelope<R>>>>,
        handlers: HandlerRegistry<R>,
    ) {
        loop {
            // Hold the receiver lock only for the dequeue itself, so the
            // other workers keep draining while this event is handled.
            let envelope = rx.lock().await.recv().await;
            let Some(envelope) = envelope else {
                break;
            };
            Self::dispatch(envelope, &handlers).await;
        }
    }

    async fn dispatch(envelope: Envelope<R>, handlers: &HandlerRegistry<R>) {
        let registered: HandlerList<R> = handlers
            .read()
            .get(&envelope.type_id)
            .cloned()
            .unwrap_or_default();

        let Envelope {
            ticket,
            event_type,
            event,
            reply,
            ..
        } = envelope;

        if registered.is_empty() {
            warn!("{}: no handler registered for {}", ticket, event_type);
            let _ = reply.send(Err(BusError::NoHandler { event_type }));
            return;
        }

        let mut reply = Some(reply);
        for handler in registered {
            let result = handler.call(&event).await;
            if let Some(tx) = reply.take() {
                // The publisher may have dropped its receipt; fine.
                let _ = tx.send(result);
            }
        }
        debug!("{} resolved", ticket);
    }
}

impl<R> std::fmt::Debug for EventBus<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("workers", &self.workers.len())
            .field("event_types", &self.handlers.read().len())
            .finish_non_exhaustive()
    }
}
