//! NonceGenerator port - nonce 生成の抽象化
//!
//! リクエストに nonce がない場合と、round 2 トリガーを送る場合に使う。
//!
//! # 実装
//! - **UlidNonceGenerator**: ULID ベース（時刻でソート可能、調整不要）

use crate::domain::Nonce;
use crate::ports::Clock;
use ulid::Ulid;

pub trait NonceGenerator: Send + Sync {
    fn generate(&self) -> Nonce;
}

/// UlidNonceGenerator は Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時に FixedClock を使えば timestamp 部分が決定的になります。
pub struct UlidNonceGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidNonceGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> NonceGenerator for UlidNonceGenerator<C> {
    fn generate(&self) -> Nonce {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        Nonce::from_ulid(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generates_unique_nonces() {
        let id_gen = UlidNonceGenerator::new(SystemClock);

        let n1 = id_gen.generate();
        let n2 = id_gen.generate();
        let n3 = id_gen.generate();

        assert_ne!(n1, n2);
        assert_ne!(n2, n3);
        assert_ne!(n1, n3);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_part() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidNonceGenerator::new(FixedClock::new(fixed_time));

        let n1 = id_gen.generate();
        let n2 = id_gen.generate();

        // ランダム部分があるので nonce 自体は異なる
        assert_ne!(n1, n2);

        // ULID の先頭 10 文字が timestamp
        assert_eq!(n1.as_str()[..10], n2.as_str()[..10]);
        let parsed = Ulid::from_string(&n1.as_str().to_ascii_uppercase()).unwrap();
        assert_eq!(parsed.timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }
}
