//! Event handler traits and type erasure.

use crate::error::{BusError, BusResult};
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by an event handler.
pub type HandlerFuture<R> = Pin<Box<dyn Future<Output = BusResult<R>> + Send + 'static>>;

/// Processes events of one concrete type, producing replies of type `R`.
///
/// Handlers receive the event behind an `Arc` because several handlers
/// may be registered for the same event type.
pub trait EventHandler<E, R>: Send + Sync + 'static {
    /// Handles one event. The returned future's resolution resolves the
    /// publish-level completion signal.
    fn handle(&self, event: Arc<E>) -> HandlerFuture<R>;
}

/// Object-safe wrapper invoked by bus workers.
pub(crate) trait ErasedHandler<R>: Send + Sync {
    fn call(&self, event: &Arc<dyn Any + Send + Sync>) -> HandlerFuture<R>;
}

/// Pairs a concrete handler with the event type it was registered for.
pub(crate) struct TypedHandler<E, H> {
    handler: H,
    _marker: PhantomData<fn(E)>,
}

impl<E, H> TypedHandler<E, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<E, R, H> ErasedHandler<R> for TypedHandler<E, H>
where
    E: Any + Send + Sync,
    R: Send + 'static,
    H: EventHandler<E, R>,
{
    fn call(&self, event: &Arc<dyn Any + Send + Sync>) -> HandlerFuture<R> {
        match Arc::clone(event).downcast::<E>() {
            Ok(event) => self.handler.handle(event),
            // Unreachable through EventBus: events are queued under their own TypeId.
            Err(_) => Box::pin(std::future::ready(Err(BusError::TypeMismatch))),
        }
    }
}
