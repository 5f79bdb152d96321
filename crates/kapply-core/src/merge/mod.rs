//! Merge - three-way merge と kind ごとの merge 戦略
//!
//! - **engine**: (last-applied, live, desired) の三方向 merge
//! - **schema**: 構造を知っている kind の keyed list 定義
//! - **strategy**: kind → structural / generic の分類（SchemaRegistry）

pub mod engine;
pub mod schema;
pub mod strategy;

pub use self::engine::{MergeError, three_way_merge};
pub use self::schema::{KeyedList, KindSchema, builtin_schemas};
pub use self::strategy::{MergeStrategy, SchemaError, SchemaRegistry, StrategyClassifier};
