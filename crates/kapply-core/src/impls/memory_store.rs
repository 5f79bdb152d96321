//! InMemoryObjectStore - 開発用・テスト用の object store
//!
//! # 実装詳細
//! - HashMap<ObjectKey, Object> を tokio::sync::Mutex で保護
//! - resourceVersion は store 全体で単調増加するカウンタ
//! - update は expected version と一致しなければ Conflict
//! - 書き込みのたびに Defaulter を適用（server 側 defaulting の再現）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use super::defaulting::{BuiltinDefaulter, Defaulter};
use crate::domain::{Object, ObjectKey, ResourceKind, ResourceVersion};
use crate::ports::{Clock, ObjectStore, StoreError, SystemClock, UidGenerator, UlidGenerator};

struct StoreState {
    objects: HashMap<ObjectKey, Object>,
    last_version: u64,
}

impl StoreState {
    fn next_version(&mut self) -> ResourceVersion {
        self.last_version += 1;
        ResourceVersion::from(self.last_version)
    }
}

pub struct InMemoryObjectStore {
    state: Mutex<StoreState>,
    defaulter: Arc<dyn Defaulter>,
    clock: Arc<dyn Clock>,
    uids: Arc<dyn UidGenerator>,
}

impl InMemoryObjectStore {
    /// Store with system time, ULID uids and the built-in defaulting.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(BuiltinDefaulter),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    pub fn with_parts(
        defaulter: Arc<dyn Defaulter>,
        clock: Arc<dyn Clock>,
        uids: Arc<dyn UidGenerator>,
    ) -> Self {
        Self {
            state: Mutex::new(StoreState {
                objects: HashMap::new(),
                last_version: 0,
            }),
            defaulter,
            clock,
            uids,
        }
    }

    pub fn with_defaulter(defaulter: Arc<dyn Defaulter>) -> Self {
        Self::with_parts(
            defaulter,
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    /// Removes an object, as an external caller would.
    pub async fn delete(&self, key: &ObjectKey) -> Result<Object, StoreError> {
        let mut state = self.state.lock().await;
        state
            .objects
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// All objects of `kind`, ordered by namespace and name.
    pub async fn list(&self, kind: &ResourceKind) -> Vec<Object> {
        let state = self.state.lock().await;
        let mut objects: Vec<Object> = state
            .objects
            .iter()
            .filter(|(key, _)| &key.kind == kind)
            .map(|(_, object)| object.clone())
            .collect();
        objects.sort_by(|a, b| a.key().cmp(&b.key()));
        objects
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(object: &Object) -> Result<(), StoreError> {
    if object.metadata.name.is_empty() {
        return Err(StoreError::Invalid("metadata.name is required".into()));
    }
    if object.kind.is_empty() || object.api_version.is_empty() {
        return Err(StoreError::Invalid("apiVersion and kind are required".into()));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.objects.get(key).cloned())
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        validate(object)?;
        let key = object.key();
        let mut state = self.state.lock().await;
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let mut stored = object.clone();
        self.defaulter.apply_defaults(&mut stored);
        stored.metadata.uid = Some(self.uids.generate_uid());
        stored.metadata.creation_timestamp = Some(self.clock.now());
        stored.metadata.generation = Some(1);
        stored.metadata.resource_version = Some(state.next_version());

        trace!(%key, version = ?stored.metadata.resource_version, "created");
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        validate(object)?;
        let key = object.key();
        let mut state = self.state.lock().await;
        let Some(current) = state.objects.get(&key) else {
            return Err(StoreError::NotFound(key));
        };

        let actual = current
            .metadata
            .resource_version
            .clone()
            .unwrap_or_else(|| ResourceVersion::new(""));
        if &actual != expected {
            return Err(StoreError::Conflict {
                key,
                expected: expected.clone(),
                actual,
            });
        }

        let mut stored = object.clone();
        self.defaulter.apply_defaults(&mut stored);
        let generation = current.metadata.generation.unwrap_or(1);
        stored.metadata.generation = Some(if stored.fields == current.fields {
            generation
        } else {
            generation + 1
        });
        stored.metadata.uid = current.metadata.uid.clone();
        stored.metadata.creation_timestamp = current.metadata.creation_timestamp;
        stored.metadata.resource_version = Some(state.next_version());

        trace!(%key, version = ?stored.metadata.resource_version, "updated");
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }
}
