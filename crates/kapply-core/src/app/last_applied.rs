//! LastAppliedTracker - 前回 Apply した desired state の保存と読み出し
//!
//! # 保存形式
//! - desired object の user-field view（server metadata と annotation 自身を除いたもの）
//! - キー順ソート済みの compact JSON（version 情報を持たない安定した形式）
//! - object の annotation（既定: `kapply.dev/last-applied-configuration`）に格納
//!
//! # 壊れた record
//! - decode できない record は「record なし」として扱う（Apply 全体は失敗させない）
//! - merge base が失われるだけで、結果は安全側（live の値を残す方向）に倒れる

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::Object;

/// Snapshot of what this applier declared on its last successful apply.
#[derive(Debug, Clone, PartialEq)]
pub struct LastAppliedRecord {
    fields: Map<String, Value>,
}

impl LastAppliedRecord {
    /// Captures the user-field view of `desired`, leaving out the `annotation`
    /// slot itself.
    pub fn from_desired(desired: &Object, annotation: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            fields: desired.user_fields(annotation)?,
        })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self { fields })
    }
}

/// Reads and writes the last-applied annotation of an object.
#[derive(Debug, Clone)]
pub struct LastAppliedTracker {
    annotation: String,
}

impl LastAppliedTracker {
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
        }
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// The record stored on `live`, or `None` when absent or unreadable.
    pub fn load(&self, live: &Object) -> Option<LastAppliedRecord> {
        let raw = live.metadata.annotations.get(&self.annotation)?;
        match LastAppliedRecord::decode(raw) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(
                    annotation = %self.annotation,
                    %error,
                    "ignoring unreadable last-applied record, merging without a base"
                );
                None
            }
        }
    }

    /// Embeds `record` into `object`'s annotation slot.
    pub fn store(
        &self,
        mut object: Object,
        record: &LastAppliedRecord,
    ) -> Result<Object, serde_json::Error> {
        let encoded = record.encode()?;
        object
            .metadata
            .annotations
            .insert(self.annotation.clone(), encoded);
        Ok(object)
    }
}
