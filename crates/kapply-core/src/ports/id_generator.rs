//! UidGenerator port - object uid 生成の抽象化
//!
//! store が新規オブジェクトに割り当てる uid を生成します。
//! テスト容易性のために、trait として抽象化しています。

use crate::ports::Clock;
use ulid::Ulid;

/// UidGenerator は分散環境で衝突しない uid を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の Apply から同時に使われる）
pub trait UidGenerator: Send + Sync {
    fn generate_uid(&self) -> String;
}

/// UlidGenerator は ULID ベースの uid 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// これにより、テスト時に FixedClock を使って timestamp 部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> UidGenerator for UlidGenerator<C> {
    fn generate_uid(&self) -> String {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ulid.to_string().to_lowercase()
    }
}
