//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。外部システム（ホスティング、git、
//! HTTP コールバック、テキスト生成サービス）への境界を trait として定義し、
//! パイプラインはこれらの trait にだけ依存する。

pub mod clock;
pub mod content;
pub mod handler;
pub mod hosting;
pub mod id_generator;
pub mod notifier;
pub mod queue;
pub mod vcs;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::content::{ContentContext, ContentStrategy, TextGenerator};
pub use self::handler::TaskHandler;
pub use self::hosting::{HostingProvider, Provisioned};
pub use self::id_generator::{NonceGenerator, UlidNonceGenerator};
pub use self::notifier::{Notifier, NotifyOutcome};
pub use self::queue::{TaskLease, TaskQueue};
pub use self::vcs::VersionControl;
