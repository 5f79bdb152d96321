//! Errors - エラー型と分類

use thiserror::Error;

use super::identity::ObjectKey;
use crate::merge::MergeError;
use crate::ports::StoreError;

/// ErrorKind は Apply エラーの運用分類
///
/// - Transient: 呼び出し側が Apply をやり直せば通る可能性がある（conflict, deadline）
/// - Permanent: 入力が悪い（merge できない manifest など）
/// - Infrastructure: store の障害（リトライ方針は呼び出し側が決める）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Store operation that failed, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Create,
    Update,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            StoreOp::Get => "get",
            StoreOp::Create => "create",
            StoreOp::Update => "update",
        };
        f.write_str(op)
    }
}

/// ApplyError は Applicator::apply の失敗
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("apply {key}: write conflict persisted after {attempts} attempts")]
    Conflict { key: ObjectKey, attempts: u32 },

    #[error("apply {key}: store {op} failed: {source}")]
    Store {
        op: StoreOp,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("apply {key}: {source}")]
    Merge {
        key: ObjectKey,
        #[source]
        source: MergeError,
    },

    #[error("apply {key}: cannot encode object: {source}")]
    Encode {
        key: ObjectKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("apply {key}: deadline exceeded")]
    DeadlineExceeded { key: ObjectKey },

    #[error("apply {key}: store returned object {returned}")]
    IdentityMismatch { key: ObjectKey, returned: ObjectKey },
}

impl ApplyError {
    /// True when the caller may simply invoke Apply again.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApplyError::Conflict { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplyError::Conflict { .. } | ApplyError::DeadlineExceeded { .. } => {
                ErrorKind::Transient
            }
            ApplyError::Store { .. } | ApplyError::IdentityMismatch { .. } => {
                ErrorKind::Infrastructure
            }
            ApplyError::Merge { .. } | ApplyError::Encode { .. } => {
                ErrorKind::Permanent
            }
        }
    }
}
