//! Structural schemas for well-known kinds.
//!
//! A schema only records which list fields have a per-element identity (a
//! merge key). Every list not named here is replaced atomically.

/// A list field whose elements are identified by `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedList {
    /// Dotted path from the object root; `[]` marks a list element,
    /// e.g. `spec.template.spec.containers[].env`.
    pub path: String,
    pub key: String,
}

/// KindSchema は 1 つの kind の構造情報（keyed list の一覧）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSchema {
    group: String,
    kind: String,
    keyed_lists: Vec<KeyedList>,
}

impl KindSchema {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            keyed_lists: Vec::new(),
        }
    }

    /// Declares `path` as a list keyed by the element field `key`.
    pub fn keyed(mut self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.keyed_lists.push(KeyedList {
            path: path.into(),
            key: key.into(),
        });
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn keyed_lists(&self) -> &[KeyedList] {
        &self.keyed_lists
    }

    /// Merge key of the list at `path`, if the list is keyed.
    pub fn list_key(&self, path: &str) -> Option<&str> {
        self.keyed_lists
            .iter()
            .find(|list| list.path == path)
            .map(|list| list.key.as_str())
    }

    fn with_pod_spec(mut self, prefix: &str) -> Self {
        for (path, key) in POD_SPEC_LISTS {
            self = self.keyed(format!("{prefix}{path}"), *key);
        }
        self
    }
}

/// Keyed lists inside a pod spec. `volumes` is deliberately absent: it is
/// treated as an atomic list.
const POD_SPEC_LISTS: &[(&str, &str)] = &[
    ("containers", "name"),
    ("containers[].env", "name"),
    ("containers[].ports", "containerPort"),
    ("containers[].volumeMounts", "mountPath"),
    ("initContainers", "name"),
    ("initContainers[].env", "name"),
    ("initContainers[].ports", "containerPort"),
    ("initContainers[].volumeMounts", "mountPath"),
    ("imagePullSecrets", "name"),
];

const POD_TEMPLATE_KINDS: &[(&str, &str)] = &[
    ("apps", "Deployment"),
    ("apps", "StatefulSet"),
    ("apps", "DaemonSet"),
    ("apps", "ReplicaSet"),
    ("batch", "Job"),
];

/// The built-in kinds that merge structurally.
pub fn builtin_schemas() -> Vec<KindSchema> {
    let mut schemas: Vec<KindSchema> = POD_TEMPLATE_KINDS
        .iter()
        .map(|(group, kind)| KindSchema::new(*group, *kind).with_pod_spec("spec.template.spec."))
        .collect();

    schemas.push(
        KindSchema::new("batch", "CronJob").with_pod_spec("spec.jobTemplate.spec.template.spec."),
    );
    schemas.push(KindSchema::new("", "Pod").with_pod_spec("spec."));
    schemas.push(KindSchema::new("", "Service").keyed("spec.ports", "port"));
    schemas.push(KindSchema::new("", "ConfigMap"));
    schemas.push(KindSchema::new("", "Secret"));
    schemas
}
