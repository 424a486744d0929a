//! Textual query parsing and routing.
//!
//! Queries follow the grammar `destination:action:key:payload`, split
//! into at most four parts so the payload may itself contain colons.
//! Destination and action are required; at least one of key and payload
//! must be present. Malformed queries and unconvertible payloads are
//! rejected in the handler before any store work is dispatched.

use crate::external::ExternalPayload;
use crate::registry::{DatumStore, StoreRegistry};
use shelfdb_bus::{BusError, BusResult, EventHandler, HandlerFuture};
use shelfdb_codec::datum::Datum;
use shelfdb_codec::Record;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while parsing or validating a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query has no destination part.
    #[error("query is missing a destination")]
    MissingDestination,

    /// The query has no action part.
    #[error("query is missing an action")]
    MissingAction,

    /// Neither a key nor a payload was given.
    #[error("query needs at least a key or a payload")]
    MissingKeyAndPayload,

    /// The action needs a payload but none was given.
    #[error("{action} requires a payload")]
    MissingPayload {
        /// The action name.
        action: &'static str,
    },

    /// The action needs a key but none was given.
    #[error("{action} requires a key")]
    MissingKey {
        /// The action name.
        action: &'static str,
    },
}

/// The verb of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Insert a record built from the payload.
    Add,
    /// Replace the record under the key.
    Update,
    /// Tombstone the record under the key.
    Delete,
    /// Fetch the record under the key.
    Read,
    /// Anything else: routed to the extensibility hook.
    Extension(String),
}

impl Action {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "read" => Self::Read,
            other => Self::Extension(other.to_string()),
        }
    }
}

/// A query broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// The target store's registered name.
    pub destination: String,
    /// The verb.
    pub action: Action,
    /// The record key, if given.
    pub key: Option<String>,
    /// The raw payload, if given.
    pub payload: Option<String>,
}

impl ParsedQuery {
    /// Parses `destination:action:key:payload`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] when destination or action is missing,
    /// or when neither key nor payload is present.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let mut parts = query.splitn(4, ':');

        let destination = parts.next().unwrap_or("").trim();
        if destination.is_empty() {
            return Err(QueryError::MissingDestination);
        }

        let action = parts
            .next()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .ok_or(QueryError::MissingAction)?;

        let key = parts
            .next()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from);
        let payload = parts
            .next()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from);

        if key.is_none() && payload.is_none() {
            return Err(QueryError::MissingKeyAndPayload);
        }

        Ok(Self {
            destination: destination.to_string(),
            action: Action::parse(action),
            key,
            payload,
        })
    }
}

/// A query published on the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    /// The raw query text.
    pub query: String,
}

impl QueryEvent {
    /// Wraps a query string.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// What a routed query resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// add/update/delete: whether the store operation succeeded.
    Done(bool),
    /// read hit: the stored datum.
    Entry(Box<Datum>),
    /// read miss: nothing stored under the key.
    NotFound,
    /// read failure: the store errored.
    ReadError,
    /// An extension action with nothing wired up.
    Empty,
}

/// Routes [`QueryEvent`]s to registered stores.
///
/// Parsing, destination resolution, and payload conversion happen in
/// the handler itself; the store call then runs on the blocking pool.
/// Mutating actions resolve to [`QueryOutcome::Done`] — `false` when the
/// store failed — and reads resolve to the datum or a miss/error
/// outcome.
pub struct QueryHandler {
    stores: Arc<StoreRegistry>,
}

impl QueryHandler {
    /// Creates a handler over a store registry.
    #[must_use]
    pub fn new(stores: Arc<StoreRegistry>) -> Self {
        Self { stores }
    }

    async fn process(
        stores: Arc<StoreRegistry>,
        event: Arc<QueryEvent>,
    ) -> BusResult<QueryOutcome> {
        let parsed = ParsedQuery::parse(&event.query)
            .map_err(|err| BusError::handler(err.to_string()))?;
        let store = stores
            .resolve(&parsed.destination)
            .map_err(|err| BusError::handler(err.to_string()))?;
        let datum = parsed
            .payload
            .as_deref()
            .map(Self::decode_payload)
            .transpose()?;

        debug!("route {:?} -> {}", parsed.action, parsed.destination);
        match &parsed.action {
            Action::Add => {
                let datum = Self::require_payload(datum, "add")?;
                Ok(Self::dispatch_add(store, datum).await)
            }
            Action::Update => {
                let datum = Self::require_payload(datum, "update")?;
                let key = parsed.key.unwrap_or_else(|| datum.id());
                Ok(Self::dispatch_update(store, key, datum).await)
            }
            Action::Delete => {
                let key = Self::require_key(parsed.key, "delete")?;
                Ok(Self::dispatch_delete(store, key).await)
            }
            Action::Read => {
                let key = Self::require_key(parsed.key, "read")?;
                Ok(Self::dispatch_read(store, key).await)
            }
            Action::Extension(name) => Ok(Self::handle_extension(name, &parsed)),
        }
    }

    fn decode_payload(payload: &str) -> BusResult<Datum> {
        let external: ExternalPayload = serde_json::from_str(payload)
            .map_err(|err| BusError::handler(format!("unsupported payload: {err}")))?;
        Datum::try_from(external).map_err(|err| BusError::handler(err.to_string()))
    }

    fn require_payload(datum: Option<Datum>, action: &'static str) -> BusResult<Datum> {
        datum.ok_or_else(|| BusError::handler(QueryError::MissingPayload { action }.to_string()))
    }

    fn require_key(key: Option<String>, action: &'static str) -> BusResult<String> {
        key.ok_or_else(|| BusError::handler(QueryError::MissingKey { action }.to_string()))
    }

    async fn dispatch_add(store: Arc<dyn DatumStore>, datum: Datum) -> QueryOutcome {
        let outcome =
            tokio::task::spawn_blocking(move || store.add(Record::new(datum.id(), datum))).await;
        match outcome {
            Ok(Ok(())) => QueryOutcome::Done(true),
            Ok(Err(err)) => {
                warn!("add failed: {err}");
                QueryOutcome::Done(false)
            }
            Err(err) => {
                warn!("add task failed: {err}");
                QueryOutcome::Done(false)
            }
        }
    }

    async fn dispatch_update(
        store: Arc<dyn DatumStore>,
        key: String,
        datum: Datum,
    ) -> QueryOutcome {
        let outcome = tokio::task::spawn_blocking(move || {
            let record = Record::new(key.clone(), datum);
            store.update(&key, record)
        })
        .await;
        match outcome {
            Ok(Ok(())) => QueryOutcome::Done(true),
            Ok(Err(err)) => {
                warn!("update failed: {err}");
                QueryOutcome::Done(false)
            }
            Err(err) => {
                warn!("update task failed: {err}");
                QueryOutcome::Done(false)
            }
        }
    }

    async fn dispatch_delete(store: Arc<dyn DatumStore>, key: String) -> QueryOutcome {
        let outcome = tokio::task::spawn_blocking(move || store.delete(&key)).await;
        match outcome {
            Ok(Ok(())) => QueryOutcome::Done(true),
            Ok(Err(err)) => {
                warn!("delete failed: {err}");
                QueryOutcome::Done(false)
            }
            Err(err) => {
                warn!("delete task failed: {err}");
                QueryOutcome::Done(false)
            }
        }
    }

    async fn dispatch_read(store: Arc<dyn DatumStore>, key: String) -> QueryOutcome {
        let outcome = tokio::task::spawn_blocking(move || store.read(&key)).await;
        match outcome {
            Ok(Ok(Some(record))) => match record.entry {
                Some(datum) => QueryOutcome::Entry(Box::new(datum)),
                None => QueryOutcome::NotFound,
            },
            Ok(Ok(None)) => QueryOutcome::NotFound,
            Ok(Err(err)) => {
                warn!("read failed: {err}");
                QueryOutcome::ReadError
            }
            Err(err) => {
                warn!("read task failed: {err}");
                QueryOutcome::ReadError
            }
        }
    }

    /// Hook for store-specific verbs. Nothing is wired up yet.
    fn handle_extension(action: &str, _parsed: &ParsedQuery) -> QueryOutcome {
        debug!("extension action {action:?} ignored");
        QueryOutcome::Empty
    }
}

impl EventHandler<QueryEvent, QueryOutcome> for QueryHandler {
    fn handle(&self, event: Arc<QueryEvent>) -> HandlerFuture<QueryOutcome> {
        let stores = Arc::clone(&self.stores);
        Box::pin(Self::process(stores, event))
    }
}

impl std::fmt::Debug for QueryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHandler")
            .field("stores", &self.stores)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use shelfdb_codec::datum::ItemDatum;

    #[test]
    fn parse_full_query() {
        let parsed = ParsedQuery::parse("items:add:41:{\"kind\":\"item\"}").unwrap();
        assert_eq!(parsed.destination, "items");
        assert_eq!(parsed.action, Action::Add);
        assert_eq!(parsed.key.as_deref(), Some("41"));
        assert_eq!(parsed.payload.as_deref(), Some("{\"kind\":\"item\"}"));
    }

    #[test]
    fn payload_keeps_embedded_colons() {
        let parsed = ParsedQuery::parse("items:add::{\"location\":\"B:12\"}").unwrap();
        assert_eq!(parsed.key, None);
        assert_eq!(parsed.payload.as_deref(), Some("{\"location\":\"B:12\"}"));
    }

    #[test]
    fn action_is_case_insensitive() {
        let parsed = ParsedQuery::parse("items:READ:41").unwrap();
        assert_eq!(parsed.action, Action::Read);
    }

    #[test]
    fn unknown_action_becomes_extension() {
        let parsed = ParsedQuery::parse("items:reindex:41").unwrap();
        assert_eq!(parsed.action, Action::Extension("reindex".to_string()));
    }

    #[test]
    fn rejects_query_without_separator() {
        assert_eq!(
            ParsedQuery::parse("invalidFormat"),
            Err(QueryError::MissingAction)
        );
    }

    #[test]
    fn rejects_missing_destination() {
        assert_eq!(
            ParsedQuery::parse(":add:1"),
            Err(QueryError::MissingDestination)
        );
    }

    #[test]
    fn rejects_missing_key_and_payload() {
        assert_eq!(
            ParsedQuery::parse("items:read"),
            Err(QueryError::MissingKeyAndPayload)
        );
        assert_eq!(
            ParsedQuery::parse("items:read::"),
            Err(QueryError::MissingKeyAndPayload)
        );
    }

    fn item_registry() -> Arc<StoreRegistry> {
        let registry = StoreRegistry::new();
        registry.register_typed::<_, ItemDatum>("items", MemoryStore::new());
        Arc::new(registry)
    }

    async fn run(handler: &QueryHandler, query: &str) -> BusResult<QueryOutcome> {
        handler.handle(Arc::new(QueryEvent::new(query))).await
    }

    #[tokio::test]
    async fn add_then_read_roundtrip() {
        let handler = QueryHandler::new(item_registry());

        let added = run(
            &handler,
            r#"items:add::{"kind":"item","id":41,"title":"Dune","author":"Herbert","enabled":true}"#,
        )
        .await
        .unwrap();
        assert_eq!(added, QueryOutcome::Done(true));

        let read = run(&handler, "items:read:41").await.unwrap();
        let QueryOutcome::Entry(datum) = read else {
            panic!("expected an entry, got {read:?}");
        };
        assert_eq!(datum.id(), "41");
    }

    #[tokio::test]
    async fn unknown_destination_fails_before_dispatch() {
        let handler = QueryHandler::new(item_registry());
        let result = run(&handler, "nowhere:read:1").await;
        assert!(matches!(result, Err(BusError::Handler { .. })));
    }

    #[tokio::test]
    async fn malformed_payload_fails_before_dispatch() {
        let handler = QueryHandler::new(item_registry());
        let result = run(&handler, "items:add::not json at all").await;
        assert!(matches!(result, Err(BusError::Handler { .. })));
    }

    #[tokio::test]
    async fn wrong_variant_resolves_to_failure_outcome() {
        let handler = QueryHandler::new(item_registry());
        // A course payload offered to the item store: the conversion to
        // Datum succeeds, the store rejects the variant.
        let outcome = run(
            &handler,
            r#"items:add::{"kind":"course","id":9,"title":"OS"}"#,
        )
        .await
        .unwrap();
        assert_eq!(outcome, QueryOutcome::Done(false));
    }

    #[tokio::test]
    async fn read_miss_is_not_found() {
        let handler = QueryHandler::new(item_registry());
        // MemoryStore read is a ceiling match; an empty store misses.
        let outcome = run(&handler, "items:read:7").await.unwrap();
        assert_eq!(outcome, QueryOutcome::NotFound);
    }

    #[tokio::test]
    async fn delete_requires_key() {
        let handler = QueryHandler::new(item_registry());
        let result = run(&handler, r#"items:delete::{"kind":"item","id":1}"#).await;
        assert!(matches!(result, Err(BusError::Handler { .. })));
    }

    #[tokio::test]
    async fn extension_action_resolves_empty() {
        let handler = QueryHandler::new(item_registry());
        let outcome = run(&handler, "items:reindex:41").await.unwrap();
        assert_eq!(outcome, QueryOutcome::Empty);
    }
}
