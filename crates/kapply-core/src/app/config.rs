//! ApplicatorConfig - Applicator の設定
//!
//! JSON などから serde で読み込める。全フィールドに default がある。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::ConflictRetryPolicy;

/// Annotation that holds the last-applied record.
pub const DEFAULT_LAST_APPLIED_ANNOTATION: &str = "kapply.dev/last-applied-configuration";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicatorConfig {
    /// Total fetch-merge-write attempts before a conflict is surfaced.
    pub max_attempts: u32,

    /// Backoff before the second attempt.
    pub retry_base_delay_ms: u64,

    pub retry_multiplier: f64,

    /// Upper bound for one whole apply call (all attempts included).
    pub apply_timeout_ms: Option<u64>,

    pub last_applied_annotation: String,
}

impl Default for ApplicatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_base_delay_ms: 10,
            retry_multiplier: 2.0,
            apply_timeout_ms: None,
            last_applied_annotation: DEFAULT_LAST_APPLIED_ANNOTATION.to_string(),
        }
    }
}

impl ApplicatorConfig {
    pub fn retry_policy(&self) -> ConflictRetryPolicy {
        ConflictRetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            multiplier: self.retry_multiplier,
        }
    }

    pub fn apply_timeout(&self) -> Option<Duration> {
        self.apply_timeout_ms.map(Duration::from_millis)
    }
}
