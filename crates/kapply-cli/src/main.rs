mod cli;
mod config;
mod logging;

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use tracing::info;

use kapply_core::impls::InMemoryObjectStore;
use kapply_core::merge::SchemaRegistry;
use kapply_core::{ApplicatorBuilder, Object, ObjectStore};

use crate::cli::{ApplyArgs, Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.override_logging(cli.log_level, cli.log_format);
    config.logging.init();

    match cli.command {
        Commands::Apply(args) => apply(config, args).await,
        Commands::Kinds => {
            for (group, kind) in SchemaRegistry::with_builtin_kinds().registered_kinds() {
                if group.is_empty() {
                    println!("{kind}");
                } else {
                    println!("{kind}.{group}");
                }
            }
            Ok(())
        }
    }
}

async fn apply(config: Config, args: ApplyArgs) -> anyhow::Result<()> {
    let applicator = ApplicatorBuilder::new()
        .config(config.applicator)
        .build(InMemoryObjectStore::new())?;

    let mut touched = Vec::new();
    for file in &args.files {
        for desired in read_manifests(file)? {
            let applied = applicator
                .apply(&desired)
                .await
                .with_context(|| format!("applying {} from {}", desired.key(), file.display()))?;
            info!(key = %desired.key(), outcome = ?applied.outcome, file = %file.display(), "manifest applied");
            let key = desired.key();
            if !touched.contains(&key) {
                touched.push(key);
            }
        }
    }

    let mut live = Vec::with_capacity(touched.len());
    for key in &touched {
        if let Some(object) = applicator.store().get(key).await? {
            live.push(object);
        }
    }
    println!("{}", serde_json::to_string_pretty(&live)?);
    Ok(())
}

/// A manifest file holds either one object or an array of objects.
fn read_manifests(path: &Path) -> anyhow::Result<Vec<Object>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    parse_manifests(&raw).with_context(|| format!("parsing manifest {}", path.display()))
}

fn parse_manifests(raw: &str) -> anyhow::Result<Vec<Object>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let objects = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        _ => vec![serde_json::from_value(value)?],
    };
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_and_array_manifests() {
        let single = parse_manifests(
            r#"{ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "a" } }"#,
        )
        .unwrap();
        assert_eq!(single.len(), 1);

        let many = parse_manifests(
            r#"[
                { "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "a" } },
                { "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "b" } }
            ]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].metadata.name, "b");
    }

    #[test]
    fn manifest_without_kind_is_rejected() {
        assert!(parse_manifests(r#"{ "metadata": { "name": "a" } }"#).is_err());
    }
}
