//! Fault-injecting stores for Applicator tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::InMemoryObjectStore;
use crate::domain::{Object, ObjectKey, ResourceVersion};
use crate::ports::{ObjectStore, StoreError};

/// Rejects every update with a version conflict.
pub struct AlwaysConflictStore {
    inner: InMemoryObjectStore,
    updates: AtomicU32,
}

impl AlwaysConflictStore {
    pub fn new(inner: InMemoryObjectStore) -> Self {
        Self {
            inner,
            updates: AtomicU32::new(0),
        }
    }

    pub fn update_calls(&self) -> u32 {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for AlwaysConflictStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        self.inner.get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        self.inner.create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        Err(StoreError::Conflict {
            key: object.key(),
            expected: expected.clone(),
            actual: ResourceVersion::new(format!("{expected}-moved-{n}")),
        })
    }
}

/// Before the first update goes through, lets another writer modify the
/// object, so that update loses the race.
pub struct InterferingStore<F> {
    inner: Arc<InMemoryObjectStore>,
    interfere: F,
    fired: AtomicBool,
}

impl<F> InterferingStore<F>
where
    F: Fn(&mut Object) + Send + Sync,
{
    pub fn new(inner: Arc<InMemoryObjectStore>, interfere: F) -> Self {
        Self {
            inner,
            interfere,
            fired: AtomicBool::new(false),
        }
    }

    pub fn interference_count(&self) -> u32 {
        u32::from(self.fired.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl<F> ObjectStore for InterferingStore<F>
where
    F: Fn(&mut Object) + Send + Sync,
{
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        self.inner.get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        self.inner.create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        let first = self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first && let Some(mut current) = self.inner.get(&object.key()).await? {
            let version = current
                .resource_version()
                .cloned()
                .unwrap_or_else(|| ResourceVersion::new(""));
            (self.interfere)(&mut current);
            self.inner.update(&current, &version).await?;
        }
        self.inner.update(object, expected).await
    }
}

/// The first read reports the object as missing even when it exists, as if
/// another creator won between the read and the create.
pub struct HidingStore {
    inner: Arc<InMemoryObjectStore>,
    hidden: AtomicBool,
}

impl HidingStore {
    pub fn new(inner: Arc<InMemoryObjectStore>) -> Self {
        Self {
            inner,
            hidden: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ObjectStore for HidingStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        let first = self
            .hidden
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            return Ok(None);
        }
        self.inner.get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        self.inner.create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        self.inner.update(object, expected).await
    }
}

/// Deletes the object right before the first update reaches the store.
pub struct DeletingStore {
    inner: Arc<InMemoryObjectStore>,
    deleted: AtomicBool,
}

impl DeletingStore {
    pub fn new(inner: Arc<InMemoryObjectStore>) -> Self {
        Self {
            inner,
            deleted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ObjectStore for DeletingStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        self.inner.get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        self.inner.create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        let first = self
            .deleted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            self.inner.delete(&object.key()).await?;
        }
        self.inner.update(object, expected).await
    }
}

/// Delays every read.
pub struct SlowStore {
    inner: InMemoryObjectStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(inner: InMemoryObjectStore, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl ObjectStore for SlowStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        self.inner.create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        self.inner.update(object, expected).await
    }
}

/// Every call fails as if the store could not be reached.
#[derive(Default)]
pub struct UnavailableStore {
    gets: AtomicU32,
}

impl UnavailableStore {
    pub fn get_calls(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for UnavailableStore {
    async fn get(&self, _key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn create(&self, _object: &Object) -> Result<Object, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update(
        &self,
        _object: &Object,
        _expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
