//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryObjectStore**: 楽観的並行制御つきの object store
//! - **Defaulter**: store 側 defaulting の再現（BuiltinDefaulter / NoDefaults）

pub mod defaulting;
pub mod memory_store;

#[cfg(test)]
pub(crate) mod faulty;

pub use self::defaulting::{BuiltinDefaulter, Defaulter, NoDefaults};
pub use self::memory_store::InMemoryObjectStore;
