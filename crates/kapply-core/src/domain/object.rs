//! Object model: a JSON-shaped manifest with typed metadata.
//!
//! `Object` は desired / live / merged の全てに使う共通表現です。
//! apiVersion / kind / metadata 以外のトップレベルフィールド（spec, data, status など）は
//! `fields` にそのまま保持します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::identity::{ObjectKey, ResourceKind};

/// Metadata keys assigned by the store. They never take part in user-field merge.
pub const SERVER_METADATA_FIELDS: &[&str] =
    &["uid", "resourceVersion", "generation", "creationTimestamp"];

/// ResourceVersion は楽観的並行制御の precondition に使うトークン
///
/// 中身は不透明（store が決める）。比較は完全一致のみ。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(String);

impl ResourceVersion {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ResourceVersion {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Server-assigned unique id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Version token of the persisted object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<ResourceVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Metadata this model does not name (ownerReferences, finalizers, ...),
    /// carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Object は 1 つのリソースの manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Object {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: kind.api_version,
            kind: kind.kind,
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..ObjectMeta::default()
            },
            fields: Map::new(),
        }
    }

    /// Builder-style setter for a top-level field such as `spec`.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::new(self.api_version.clone(), self.kind.clone())
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(
            self.resource_kind(),
            self.metadata.namespace.clone(),
            self.metadata.name.clone(),
        )
    }

    /// Looks up a dotted path below the top-level fields, e.g. `spec.replicas`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Sets a dotted path, creating intermediate maps as needed.
    ///
    /// Returns `false` when an intermediate segment exists but is not a map.
    pub fn set_field(&mut self, path: &str, value: Value) -> bool {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };
        let mut current = &mut self.fields;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(map) => current = map,
                _ => return false,
            }
        }
        current.insert(last.to_string(), value);
        true
    }

    pub fn resource_version(&self) -> Option<&ResourceVersion> {
        self.metadata.resource_version.as_ref()
    }

    /// The user-facing field tree: the object as JSON without server-assigned
    /// metadata and without the `exclude_annotation` slot.
    ///
    /// `null` values are dropped, so an explicit null reads the same as an
    /// omitted field.
    pub fn user_fields(&self, exclude_annotation: &str) -> Result<Map<String, Value>, serde_json::Error> {
        let mut root = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(Value::Object(metadata)) = root.get_mut("metadata") {
            for field in SERVER_METADATA_FIELDS {
                metadata.remove(*field);
            }
            let now_empty = match metadata.get_mut("annotations") {
                Some(Value::Object(annotations)) => {
                    annotations.remove(exclude_annotation);
                    annotations.is_empty()
                }
                _ => false,
            };
            if now_empty {
                metadata.remove("annotations");
            }
        }
        strip_nulls(&mut root);
        Ok(root)
    }

    /// Rebuilds an object from a user-field tree (see [`Object::user_fields`]).
    pub fn from_user_fields(fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(fields))
    }

    /// Copies store-assigned metadata from `other` (typically the live object).
    pub fn inherit_server_metadata(&mut self, other: &Object) {
        self.metadata.uid = other.metadata.uid.clone();
        self.metadata.resource_version = other.metadata.resource_version.clone();
        self.metadata.generation = other.metadata.generation;
        self.metadata.creation_timestamp = other.metadata.creation_timestamp;
    }
}

fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        strip_nulls_in(value);
    }
}

fn strip_nulls_in(value: &mut Value) {
    match value {
        Value::Object(map) => strip_nulls(map),
        Value::Array(items) => items.iter_mut().for_each(strip_nulls_in),
        _ => {}
    }
}
