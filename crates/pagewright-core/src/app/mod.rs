//! App - アプリケーション層
//!
//! ports を組み合わせて 1 タスク分の処理とその受け口を実装する。
//!
//! # 主要コンポーネント
//! - **AppBuilder / App**: 設定からのワイヤリング
//! - **ingress**: HTTP ルーター（secret 確認 → enqueue → ack）
//! - **WorkerGroup**: キューを消化するワーカー群
//! - **TaskPipeline**: workspace → 添付 → コンテンツ → メタデータ → publish → 通知
//! - **ArtifactPublisher**: ラウンドごとの create / update

pub mod attachments;
pub mod builder;
pub mod config;
pub mod content;
pub mod ingress;
pub mod metadata;
pub mod pipeline;
pub mod publisher;
pub mod worker_loop;
pub mod workspace;

// 主要な型を再エクスポート
pub use self::attachments::AttachmentMaterializer;
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::config::{Config, TextGenerationConfig};
pub use self::content::{ContentGenerator, GeneratedPage};
pub use self::ingress::IngressState;
pub use self::metadata::MetadataStamper;
pub use self::pipeline::{PipelineReport, TaskPipeline};
pub use self::publisher::ArtifactPublisher;
pub use self::worker_loop::WorkerGroup;
pub use self::workspace::Workspace;
