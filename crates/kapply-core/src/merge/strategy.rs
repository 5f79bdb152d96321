//! Strategy classification (structural vs. generic merge).
//!
//! # 設計
//! - kind ごとの振る舞いは型階層ではなくテーブル（SchemaRegistry）で表現
//! - 新しい kind を structural にするのは `register()` の 1 行で済む
//! - 分類は状態を持たない読み取り専用の処理

use std::collections::HashMap;
use std::sync::Arc;

use super::schema::{KindSchema, builtin_schemas};
use crate::domain::ResourceKind;

/// MergeStrategy は 1 回の Apply で使う merge の種類
#[derive(Debug, Clone)]
pub enum MergeStrategy {
    /// Keyed lists from the schema merge per element.
    Structural(Arc<KindSchema>),
    /// No structural knowledge: every list is atomic.
    Generic,
}

impl MergeStrategy {
    pub fn schema(&self) -> Option<&KindSchema> {
        match self {
            MergeStrategy::Structural(schema) => Some(schema.as_ref()),
            MergeStrategy::Generic => None,
        }
    }
}

/// StrategyClassifier は kind から MergeStrategy を選ぶ
pub trait StrategyClassifier: Send + Sync {
    fn classify(&self, kind: &ResourceKind) -> MergeStrategy;
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema for kind '{kind}' in group '{group}' is already registered")]
    AlreadyRegistered { group: String, kind: String },
}

/// SchemaRegistry は (group, kind) → KindSchema の対応表
///
/// version は見ない（`apps/v1` と `apps/v1beta2` の Deployment は同じ schema）。
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<(String, String), Arc<KindSchema>>,
}

impl SchemaRegistry {
    /// Empty registry: every kind merges generically.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::new();
        for schema in builtin_schemas() {
            let key = (schema.group().to_string(), schema.kind().to_string());
            registry.schemas.insert(key, Arc::new(schema));
        }
        registry
    }

    pub fn register(&mut self, schema: KindSchema) -> Result<(), SchemaError> {
        let key = (schema.group().to_string(), schema.kind().to_string());
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::AlreadyRegistered {
                group: key.0,
                kind: key.1,
            });
        }
        self.schemas.insert(key, Arc::new(schema));
        Ok(())
    }

    pub fn registered_kinds(&self) -> Vec<(String, String)> {
        let mut kinds: Vec<(String, String)> = self.schemas.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl StrategyClassifier for SchemaRegistry {
    fn classify(&self, kind: &ResourceKind) -> MergeStrategy {
        let key = (kind.group().to_string(), kind.kind.clone());
        match self.schemas.get(&key) {
            Some(schema) => MergeStrategy::Structural(Arc::clone(schema)),
            None => MergeStrategy::Generic,
        }
    }
}
