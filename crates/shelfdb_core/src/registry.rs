//! Named-store registry and the datum-level store facade.

use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use shelfdb_codec::datum::{ContractDatum, CourseDatum, Datum, ItemDatum, UserDatum};
use shelfdb_codec::Record;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type that is one variant of [`Datum`].
///
/// The conversion boundary between the router's tagged payloads and the
/// typed stores: exhaustive matching, a wrong variant is a
/// [`CoreError::DatumMismatch`].
pub trait DatumVariant: Into<Datum> + Sized {
    /// The variant name, for diagnostics.
    const KIND: &'static str;

    /// Extracts this variant from a datum.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatumMismatch`] for any other variant.
    fn from_datum(datum: Datum) -> CoreResult<Self>;
}

macro_rules! datum_variant {
    ($type:ty, $variant:ident, $kind:literal) => {
        impl DatumVariant for $type {
            const KIND: &'static str = $kind;

            fn from_datum(datum: Datum) -> CoreResult<Self> {
                match datum {
                    Datum::$variant(inner) => Ok(inner),
                    other => Err(CoreError::DatumMismatch {
                        expected: Self::KIND,
                        actual: other.kind(),
                    }),
                }
            }
        }
    };
}

datum_variant!(UserDatum, User, "user");
datum_variant!(ItemDatum, Item, "item");
datum_variant!(CourseDatum, Course, "course");
datum_variant!(ContractDatum, Contract, "contract");

// A store may also hold the sum type directly (e.g. a MemoryStore of
// mixed records); conversion is then the identity.
impl DatumVariant for Datum {
    const KIND: &'static str = "datum";

    fn from_datum(datum: Datum) -> CoreResult<Self> {
        Ok(datum)
    }
}

/// Object-safe store surface operating on the [`Datum`] sum type.
///
/// What the query router dispatches against: every registered store,
/// whatever its concrete record type, looks the same behind this trait.
pub trait DatumStore: Send + Sync {
    /// Adds a record.
    ///
    /// # Errors
    ///
    /// Returns an error on variant mismatch or store failure.
    fn add(&self, record: Record<Datum>) -> CoreResult<()>;

    /// Replaces the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error on variant mismatch or store failure.
    fn update(&self, key: &str, record: Record<Datum>) -> CoreResult<()>;

    /// Deletes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    fn delete(&self, key: &str) -> CoreResult<()>;

    /// Looks up a record by key.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    fn read(&self, key: &str) -> CoreResult<Option<Record<Datum>>>;

    /// Returns every live record.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    fn read_all(&self) -> CoreResult<Vec<Record<Datum>>>;

    /// Makes buffered mutations visible.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    fn flush(&self) -> CoreResult<()>;
}

/// Adapts a typed store to the [`DatumStore`] surface.
///
/// Incoming datums are narrowed to the store's variant (mismatches
/// error), outgoing records widen back into the sum type.
pub struct VariantStore<S, T> {
    inner: S,
    _marker: PhantomData<fn(T)>,
}

impl<S, T> VariantStore<S, T> {
    /// Wraps a typed store.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns the wrapped store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, T> DatumStore for VariantStore<S, T>
where
    S: Database<T>,
    T: DatumVariant + Send + Sync + 'static,
{
    fn add(&self, record: Record<Datum>) -> CoreResult<()> {
        self.inner.add(record.try_map(T::from_datum)?)
    }

    fn update(&self, key: &str, record: Record<Datum>) -> CoreResult<()> {
        self.inner.update(key, record.try_map(T::from_datum)?)
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.inner.delete(key)
    }

    fn read(&self, key: &str) -> CoreResult<Option<Record<Datum>>> {
        Ok(self.inner.read(key)?.map(|record| record.map(Into::into)))
    }

    fn read_all(&self) -> CoreResult<Vec<Record<Datum>>> {
        Ok(self
            .inner
            .read_all()?
            .into_iter()
            .map(|record| record.map(Into::into))
            .collect())
    }

    fn flush(&self) -> CoreResult<()> {
        self.inner.flush()
    }
}

/// Maps destination names to store instances.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn DatumStore>>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` under `name`, replacing any previous store with
    /// that name.
    pub fn register(&self, name: impl Into<String>, store: Arc<dyn DatumStore>) {
        self.stores.write().insert(name.into(), store);
    }

    /// Registers a typed store under `name` behind a [`VariantStore`]
    /// adapter.
    pub fn register_typed<S, T>(&self, name: impl Into<String>, store: S)
    where
        S: Database<T> + 'static,
        T: DatumVariant + Send + Sync + 'static,
    {
        self.register(name, Arc::new(VariantStore::new(store)));
    }

    /// Resolves a destination name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownStore`] if nothing is registered
    /// under `name`.
    pub fn resolve(&self, name: &str) -> CoreResult<Arc<dyn DatumStore>> {
        self.stores
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownStore {
                name: name.to_string(),
            })
    }

    /// Returns the registered destination names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.stores.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn item(id: u64) -> ItemDatum {
        ItemDatum {
            item_id: id,
            title: format!("Item {id}"),
            enabled: true,
            ..ItemDatum::default()
        }
    }

    #[test]
    fn variant_store_narrows_and_widens() {
        let store: VariantStore<MemoryStore<ItemDatum>, ItemDatum> =
            VariantStore::new(MemoryStore::new());

        store
            .add(Record::new("41", Datum::Item(item(41))))
            .unwrap();

        let found = store.read("41").unwrap().unwrap();
        assert_eq!(found.entry, Some(Datum::Item(item(41))));
    }

    #[test]
    fn wrong_variant_is_rejected() {
        let store: VariantStore<MemoryStore<ItemDatum>, ItemDatum> =
            VariantStore::new(MemoryStore::new());

        let course = Datum::Course(CourseDatum::default());
        let result = store.add(Record::new("1", course));

        assert!(matches!(
            result,
            Err(CoreError::DatumMismatch {
                expected: "item",
                actual: "course",
            })
        ));
    }

    #[test]
    fn registry_resolves_registered_names() {
        let registry = StoreRegistry::new();
        registry.register_typed::<_, ItemDatum>("items", MemoryStore::new());

        assert!(registry.resolve("items").is_ok());
        assert!(matches!(
            registry.resolve("nowhere"),
            Err(CoreError::UnknownStore { .. })
        ));
    }

    #[test]
    fn datum_identity_variant() {
        let store: VariantStore<MemoryStore<Datum>, Datum> = VariantStore::new(MemoryStore::new());
        store
            .add(Record::new("1", Datum::Contract(ContractDatum::default())))
            .unwrap();
        store.add(Record::new("2", Datum::Item(item(2)))).unwrap();

        assert_eq!(store.read_all().unwrap().len(), 2);
    }
}
