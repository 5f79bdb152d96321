//! ObjectStore port - クラスタの object store
//!
//! Applicator が必要とする能力はこの 3 つだけです：
//! - get: identity で現在の状態を読む（存在しなければ `Ok(None)`）
//! - create: 新規作成（既に存在すれば `AlreadyExists`）
//! - update: resourceVersion を precondition にした条件付き書き込み（不一致なら `Conflict`）

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{Object, ObjectKey, ResourceVersion};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(ObjectKey),

    #[error("{0} already exists")]
    AlreadyExists(ObjectKey),

    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        key: ObjectKey,
        expected: ResourceVersion,
        actual: ResourceVersion,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid object: {0}")]
    Invalid(String),
}

/// ObjectStore は object の正本（source of truth）
///
/// # 設計原則
/// - 書き込みは全て store 側で resourceVersion を進める
/// - update は `expected` と現在の version が一致した時のみ受理（楽観的並行制御）
/// - 返り値は永続化後のオブジェクト（store の defaulting や version 付与を反映）
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError>;

    async fn create(&self, object: &Object) -> Result<Object, StoreError>;

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, StoreError> {
        (**self).get(key).await
    }

    async fn create(&self, object: &Object) -> Result<Object, StoreError> {
        (**self).create(object).await
    }

    async fn update(
        &self,
        object: &Object,
        expected: &ResourceVersion,
    ) -> Result<Object, StoreError> {
        (**self).update(object, expected).await
    }
}
