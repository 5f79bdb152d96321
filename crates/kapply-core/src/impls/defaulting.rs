//! Defaulter - store 側の defaulting を再現する
//!
//! 実際のクラスタでは、省略されたフィールドに server が既定値を入れる kind がある
//! （例: Deployment の `spec.replicas` → 1）。Applicator 自身は既定値を作らない。
//! ここでの defaulting は InMemoryObjectStore が書き込み時に適用する。

use serde_json::json;

use crate::domain::Object;

pub trait Defaulter: Send + Sync {
    fn apply_defaults(&self, object: &mut Object);
}

/// No defaulting at all (custom kinds without a schema).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl Defaulter for NoDefaults {
    fn apply_defaults(&self, _object: &mut Object) {}
}

/// Defaults the replica count of the built-in replicated workloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDefaulter;

const REPLICATED_KINDS: &[(&str, &str)] = &[
    ("apps", "Deployment"),
    ("apps", "StatefulSet"),
    ("apps", "ReplicaSet"),
];

impl Defaulter for BuiltinDefaulter {
    fn apply_defaults(&self, object: &mut Object) {
        let kind = object.resource_kind();
        let replicated = REPLICATED_KINDS
            .iter()
            .any(|(group, name)| kind.group() == *group && kind.kind == *name);
        if replicated && object.field("spec.replicas").is_none() {
            object.set_field("spec.replicas", json!(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;

    #[test]
    fn deployment_replicas_default_to_one() {
        let mut object = Object::new(ResourceKind::new("apps/v1", "Deployment"), "ns", "d")
            .with_field("spec", json!({}));
        BuiltinDefaulter.apply_defaults(&mut object);
        assert_eq!(object.field("spec.replicas"), Some(&json!(1)));
    }

    #[test]
    fn explicit_replicas_are_kept() {
        let mut object = Object::new(ResourceKind::new("apps/v1", "StatefulSet"), "ns", "s")
            .with_field("spec", json!({ "replicas": 4 }));
        BuiltinDefaulter.apply_defaults(&mut object);
        assert_eq!(object.field("spec.replicas"), Some(&json!(4)));
    }

    #[test]
    fn custom_kinds_get_nothing() {
        let mut object = Object::new(
            ResourceKind::new("standard.oam.dev/v1alpha1", "PodSpecWorkload"),
            "ns",
            "p",
        )
        .with_field("spec", json!({}));
        BuiltinDefaulter.apply_defaults(&mut object);
        assert_eq!(object.field("spec.replicas"), None);

        let mut deployment = Object::new(ResourceKind::new("apps/v1", "Deployment"), "ns", "d");
        NoDefaults.apply_defaults(&mut deployment);
        assert_eq!(deployment.field("spec.replicas"), None);
    }
}
