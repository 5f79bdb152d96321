//! Ports - 抽象化レイヤー
//!
//! Applicator が外部に要求する能力を trait として定義します。
//! - ObjectStore: クラスタの object store（get / create / update with precondition）
//! - Clock / UidGenerator: store 実装が使う時刻と ID（テストで差し替え可能）

pub mod clock;
pub mod id_generator;
pub mod object_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{UidGenerator, UlidGenerator};
pub use self::object_store::{ObjectStore, StoreError};
