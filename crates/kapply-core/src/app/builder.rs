//! ApplicatorBuilder - Applicator の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 設定値の矛盾（空の annotation 名など）は build() 時に BuildError
//! - 追加 schema の二重登録は register_schema() 時に SchemaError

use std::sync::Arc;

use super::applicator::Applicator;
use super::config::ApplicatorConfig;
use crate::merge::{KindSchema, SchemaError, SchemaRegistry, StrategyClassifier};
use crate::ports::ObjectStore;

/// ApplicatorBuilder は Applicator を構築
///
/// # 使用例
/// ```ignore
/// let applicator = ApplicatorBuilder::new()
///     .config(config)
///     .register_schema(KindSchema::new("example.com", "Widget").keyed("spec.parts", "id"))?
///     .build(store)?;
/// ```
pub struct ApplicatorBuilder {
    registry: SchemaRegistry,
    classifier: Option<Arc<dyn StrategyClassifier>>,
    config: ApplicatorConfig,
}

/// BuildError は Applicator 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("last_applied_annotation must not be empty")]
    EmptyAnnotation,

    #[error("retry_multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),
}

impl ApplicatorBuilder {
    /// Starts from the default config and the built-in structural kinds.
    pub fn new() -> Self {
        Self {
            registry: SchemaRegistry::with_builtin_kinds(),
            classifier: None,
            config: ApplicatorConfig::default(),
        }
    }

    pub fn config(mut self, config: ApplicatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a structurally-aware kind on top of the built-in ones.
    pub fn register_schema(mut self, schema: KindSchema) -> Result<Self, SchemaError> {
        self.registry.register(schema)?;
        Ok(self)
    }

    /// Replaces the schema registry with a custom classifier.
    pub fn classifier(mut self, classifier: Arc<dyn StrategyClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn build<S: ObjectStore>(self, store: S) -> Result<Applicator<S>, BuildError> {
        if self.config.last_applied_annotation.trim().is_empty() {
            return Err(BuildError::EmptyAnnotation);
        }
        let multiplier = self.config.retry_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(BuildError::InvalidMultiplier(multiplier));
        }

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::new(self.registry),
        };
        Ok(Applicator::from_parts(store, classifier, self.config))
    }
}

impl Default for ApplicatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Object, ResourceKind};
    use crate::impls::InMemoryObjectStore;
    use crate::merge::MergeStrategy;
    use serde_json::json;

    struct EverythingGeneric;

    impl StrategyClassifier for EverythingGeneric {
        fn classify(&self, _kind: &ResourceKind) -> MergeStrategy {
            MergeStrategy::Generic
        }
    }

    #[test]
    fn test_build_success() {
        let applicator = ApplicatorBuilder::new().build(InMemoryObjectStore::new());
        assert!(applicator.is_ok());
    }

    #[test]
    fn test_build_rejects_empty_annotation() {
        let config = ApplicatorConfig {
            last_applied_annotation: " ".into(),
            ..ApplicatorConfig::default()
        };
        let result = ApplicatorBuilder::new()
            .config(config)
            .build(InMemoryObjectStore::new());
        assert!(matches!(result, Err(BuildError::EmptyAnnotation)));
    }

    #[test]
    fn test_build_rejects_shrinking_backoff() {
        let config = ApplicatorConfig {
            retry_multiplier: 0.5,
            ..ApplicatorConfig::default()
        };
        let result = ApplicatorBuilder::new()
            .config(config)
            .build(InMemoryObjectStore::new());
        assert!(matches!(result, Err(BuildError::InvalidMultiplier(m)) if m == 0.5));
    }

    #[test]
    fn test_register_builtin_kind_twice() {
        let result = ApplicatorBuilder::new().register_schema(KindSchema::new("apps", "Deployment"));
        assert!(matches!(result, Err(SchemaError::AlreadyRegistered { .. })));
    }

    #[tokio::test]
    async fn test_registered_schema_is_used() {
        let applicator = ApplicatorBuilder::new()
            .register_schema(KindSchema::new("example.com", "Widget").keyed("spec.parts", "id"))
            .unwrap()
            .build(InMemoryObjectStore::new())
            .unwrap();

        let widget = |parts: serde_json::Value| {
            Object::new(ResourceKind::new("example.com/v1", "Widget"), "default", "w")
                .with_field("spec", json!({ "parts": parts }))
        };
        applicator.apply(&widget(json!([{ "id": 1 }]))).await.unwrap();

        // a foreign part appears
        let mut live = applicator.store().get(&widget(json!([])).key()).await.unwrap().unwrap();
        let version = live.resource_version().cloned().unwrap();
        live.set_field("spec.parts", json!([{ "id": 1 }, { "id": 2 }]));
        applicator.store().update(&live, &version).await.unwrap();

        let applied = applicator
            .apply(&widget(json!([{ "id": 1, "size": 3 }])))
            .await
            .unwrap();
        assert_eq!(
            applied.object.field("spec.parts"),
            Some(&json!([{ "id": 1, "size": 3 }, { "id": 2 }]))
        );
    }

    #[tokio::test]
    async fn test_custom_classifier_replaces_registry() {
        let applicator = ApplicatorBuilder::new()
            .classifier(Arc::new(EverythingGeneric))
            .build(InMemoryObjectStore::new())
            .unwrap();

        let deployment = |containers: serde_json::Value| {
            Object::new(ResourceKind::new("apps/v1", "Deployment"), "default", "d").with_field(
                "spec",
                json!({ "template": { "spec": { "containers": containers } } }),
            )
        };
        applicator
            .apply(&deployment(json!([{ "name": "a" }])))
            .await
            .unwrap();

        let mut live = applicator.store().get(&deployment(json!([])).key()).await.unwrap().unwrap();
        let version = live.resource_version().cloned().unwrap();
        live.set_field(
            "spec.template.spec.containers",
            json!([{ "name": "a" }, { "name": "sidecar" }]),
        );
        applicator.store().update(&live, &version).await.unwrap();

        // generic merge replaces the whole list
        let applied = applicator
            .apply(&deployment(json!([{ "name": "a", "image": "x" }])))
            .await
            .unwrap();
        assert_eq!(
            applied.object.field("spec.template.spec.containers"),
            Some(&json!([{ "name": "a", "image": "x" }]))
        );
    }
}
