//! kapply-core
//!
//! Declarative apply for objects in a shared cluster store: a caller's desired
//! object is reconciled against live state with a three-way merge, so fields
//! the caller dropped are cleared, fields other appliers own are left alone,
//! and concurrent writers are resolved by optimistic concurrency.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ObjectKey, Object, ResourceVersion, errors）
//! - **ports**: 抽象化レイヤー（ObjectStore, Clock, UidGenerator）
//! - **merge**: 三方向 merge と kind ごとの戦略（SchemaRegistry）
//! - **app**: Applicator, LastAppliedTracker, 設定とリトライ
//! - **impls**: 実装（InMemoryObjectStore, Defaulter）

pub mod app;
pub mod domain;
pub mod impls;
pub mod merge;
pub mod ports;

pub use app::{Applicator, ApplicatorBuilder, ApplicatorConfig, Applied, ApplyOutcome, Deadline};
pub use domain::{ApplyError, Object, ObjectKey, ResourceKind};
pub use ports::{ObjectStore, StoreError};
