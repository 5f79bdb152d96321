//! Applicator - desired object を live state に三方向 merge で反映する
//!
//! # フロー（1 attempt）
//! 1. get: live object を読む（なければ create path）
//! 2. merge: last-applied + live + desired → merged
//! 3. write: live の resourceVersion を precondition にして update
//! 4. conflict なら 1 からやり直す（回数は ConflictRetryPolicy で上限あり）
//!
//! # 並行性
//! - プロセス内のロックは持たない。正しさは store の条件付き書き込みだけに依存
//! - 毎 attempt で live を読み直すので、merge は常に上書き対象の version に対して行われる

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::config::ApplicatorConfig;
use super::deadline::Deadline;
use super::last_applied::{LastAppliedRecord, LastAppliedTracker};
use super::retry::ConflictRetryPolicy;
use crate::domain::{ApplyError, Object, ObjectKey, StoreOp};
use crate::merge::{MergeStrategy, SchemaRegistry, StrategyClassifier, three_way_merge};
use crate::ports::{ObjectStore, StoreError};

/// What a successful apply did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    /// The merged result already matched the live object; nothing was written.
    Unchanged,
}

/// Result of a successful apply: the outcome and the object as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub outcome: ApplyOutcome,
    pub object: Object,
}

enum Attempt {
    Done(Applied),
    Conflict,
}

/// Applicator は 1 つの applier identity の Apply を実行する
///
/// 異なる ObjectKey に対する Apply は完全に独立。
/// 同じ ObjectKey への同時 Apply も安全（conflict → 再読み込み → 再 merge）。
pub struct Applicator<S> {
    store: S,
    classifier: Arc<dyn StrategyClassifier>,
    tracker: LastAppliedTracker,
    retry: ConflictRetryPolicy,
    config: ApplicatorConfig,
}

impl<S: ObjectStore> Applicator<S> {
    /// Default configuration with the built-in structural kinds.
    pub fn new(store: S) -> Self {
        Self::from_parts(
            store,
            Arc::new(SchemaRegistry::with_builtin_kinds()),
            ApplicatorConfig::default(),
        )
    }

    pub(crate) fn from_parts(
        store: S,
        classifier: Arc<dyn StrategyClassifier>,
        config: ApplicatorConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            tracker: LastAppliedTracker::new(config.last_applied_annotation.clone()),
            retry: config.retry_policy(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ApplicatorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &LastAppliedTracker {
        &self.tracker
    }

    /// Applies `desired`, bounded by the configured apply timeout if any.
    pub async fn apply(&self, desired: &Object) -> Result<Applied, ApplyError> {
        let deadline = match self.config.apply_timeout() {
            Some(timeout) => Deadline::after(timeout),
            None => Deadline::none(),
        };
        self.apply_with_deadline(desired, deadline).await
    }

    /// Applies `desired`; every store call and backoff sleep is cut off at
    /// `deadline`.
    pub async fn apply_with_deadline(
        &self,
        desired: &Object,
        deadline: Deadline,
    ) -> Result<Applied, ApplyError> {
        let key = desired.key();
        let span = info_span!("apply", key = %key);
        self.apply_inner(&key, desired, deadline).instrument(span).await
    }

    async fn apply_inner(
        &self,
        key: &ObjectKey,
        desired: &Object,
        deadline: Deadline,
    ) -> Result<Applied, ApplyError> {
        let record = LastAppliedRecord::from_desired(desired, self.tracker.annotation())
            .map_err(|source| ApplyError::Encode {
                key: key.clone(),
                source,
            })?;
        let strategy = self.classifier.classify(&key.kind);
        let max_attempts = self.retry.attempts();

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(key, &record, &strategy, deadline).await? {
                Attempt::Done(applied) => {
                    info!(outcome = ?applied.outcome, attempts, "applied");
                    return Ok(applied);
                }
                Attempt::Conflict if attempts >= max_attempts => {
                    warn!(attempts, "giving up after repeated write conflicts");
                    return Err(ApplyError::Conflict {
                        key: key.clone(),
                        attempts,
                    });
                }
                Attempt::Conflict => {
                    let delay = self.retry.next_delay(attempts);
                    debug!(attempts, ?delay, "write conflict, re-reading live state");
                    deadline
                        .sleep(delay)
                        .await
                        .map_err(|_| deadline_exceeded(key))?;
                }
            }
        }
    }

    async fn attempt(
        &self,
        key: &ObjectKey,
        record: &LastAppliedRecord,
        strategy: &MergeStrategy,
        deadline: Deadline,
    ) -> Result<Attempt, ApplyError> {
        let live = deadline
            .run(self.store.get(key))
            .await
            .map_err(|_| deadline_exceeded(key))?
            .map_err(|source| store_error(StoreOp::Get, key, source))?;

        match live {
            None => self.create(key, record, deadline).await,
            Some(live) => self.update(key, live, record, strategy, deadline).await,
        }
    }

    async fn create(
        &self,
        key: &ObjectKey,
        record: &LastAppliedRecord,
        deadline: Deadline,
    ) -> Result<Attempt, ApplyError> {
        let object = Object::from_user_fields(record.fields().clone())
            .and_then(|object| self.tracker.store(object, record))
            .map_err(|source| encode_error(key, source))?;

        let created = deadline
            .run(self.store.create(&object))
            .await
            .map_err(|_| deadline_exceeded(key))?;

        match created {
            Ok(created) => {
                check_identity(key, &created)?;
                Ok(Attempt::Done(Applied {
                    outcome: ApplyOutcome::Created,
                    object: created,
                }))
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!("lost the create race, falling through to update");
                Ok(Attempt::Conflict)
            }
            Err(source) => Err(store_error(StoreOp::Create, key, source)),
        }
    }

    async fn update(
        &self,
        key: &ObjectKey,
        live: Object,
        record: &LastAppliedRecord,
        strategy: &MergeStrategy,
        deadline: Deadline,
    ) -> Result<Attempt, ApplyError> {
        check_identity(key, &live)?;
        let Some(expected) = live.resource_version().cloned() else {
            return Err(store_error(
                StoreOp::Get,
                key,
                StoreError::Invalid("live object carries no resourceVersion".into()),
            ));
        };

        let base = self.tracker.load(&live);
        let live_fields = live
            .user_fields(self.tracker.annotation())
            .map_err(|source| encode_error(key, source))?;
        let merged_fields = three_way_merge(
            base.as_ref().map(LastAppliedRecord::fields),
            &live_fields,
            record.fields(),
            strategy,
        )
        .map_err(|source| ApplyError::Merge {
            key: key.clone(),
            source,
        })?;

        let mut merged =
            Object::from_user_fields(merged_fields).map_err(|source| encode_error(key, source))?;
        merged.inherit_server_metadata(&live);
        let merged = self
            .tracker
            .store(merged, record)
            .map_err(|source| encode_error(key, source))?;

        if merged == live {
            return Ok(Attempt::Done(Applied {
                outcome: ApplyOutcome::Unchanged,
                object: live,
            }));
        }

        let written = deadline
            .run(self.store.update(&merged, &expected))
            .await
            .map_err(|_| deadline_exceeded(key))?;

        match written {
            Ok(updated) => {
                check_identity(key, &updated)?;
                Ok(Attempt::Done(Applied {
                    outcome: ApplyOutcome::Updated,
                    object: updated,
                }))
            }
            Err(StoreError::Conflict { .. }) => Ok(Attempt::Conflict),
            Err(StoreError::NotFound(_)) => {
                debug!("object deleted between read and write");
                Ok(Attempt::Conflict)
            }
            Err(source) => Err(store_error(StoreOp::Update, key, source)),
        }
    }
}

fn check_identity(key: &ObjectKey, object: &Object) -> Result<(), ApplyError> {
    let returned = object.key();
    if &returned == key {
        Ok(())
    } else {
        Err(ApplyError::IdentityMismatch {
            key: key.clone(),
            returned,
        })
    }
}

fn store_error(op: StoreOp, key: &ObjectKey, source: StoreError) -> ApplyError {
    ApplyError::Store {
        op,
        key: key.clone(),
        source,
    }
}

fn encode_error(key: &ObjectKey, source: serde_json::Error) -> ApplyError {
    ApplyError::Encode {
        key: key.clone(),
        source,
    }
}

fn deadline_exceeded(key: &ObjectKey) -> ApplyError {
    ApplyError::DeadlineExceeded { key: key.clone() }
}
