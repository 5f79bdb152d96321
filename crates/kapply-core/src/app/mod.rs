//! App - アプリケーション層
//!
//! ports と merge を組み合わせて Apply を実装します。
//!
//! # 主要コンポーネント
//! - **Applicator**: fetch → merge → write（conflict 時は再読み込みしてやり直す）
//! - **LastAppliedTracker**: 前回 desired の保存 / 読み出し
//! - **ApplicatorBuilder**: 構築と起動時検証
//! - **ApplicatorConfig / ConflictRetryPolicy / Deadline**: リトライ上限と打ち切り

pub mod applicator;
pub mod builder;
pub mod config;
pub mod deadline;
pub mod last_applied;
pub mod retry;

pub use self::applicator::{Applicator, Applied, ApplyOutcome};
pub use self::builder::{ApplicatorBuilder, BuildError};
pub use self::config::{ApplicatorConfig, DEFAULT_LAST_APPLIED_ANNOTATION};
pub use self::deadline::{Deadline, DeadlineElapsed};
pub use self::last_applied::{LastAppliedRecord, LastAppliedTracker};
pub use self::retry::{ConflictRetryPolicy, MAX_CONFLICT_BACKOFF};
