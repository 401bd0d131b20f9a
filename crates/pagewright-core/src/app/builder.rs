//! AppBuilder - 設定から App を組み立てる
//!
//! # Fail-fast 設計
//! - `build()` の最初に `Config::validate()` を通す
//! - adapter は差し替え可能（テストでは fake を渡す）。未指定なら本番実装を使う

use std::sync::Arc;

use axum::Router;
use tracing::info;

use super::config::Config;
use super::content::ContentGenerator;
use super::ingress::{self, IngressState};
use super::metadata::MetadataStamper;
use super::pipeline::TaskPipeline;
use super::publisher::ArtifactPublisher;
use super::worker_loop::WorkerGroup;
use crate::domain::ConfigError;
use crate::impls::{
    CommitIdentity, GitCli, GitHubProvider, HttpNotifier, InMemoryTaskQueue, OpenAiTextGenerator,
};
use crate::ports::{
    Clock, HostingProvider, NonceGenerator, Notifier, SystemClock, TaskHandler, TaskQueue,
    TextGenerator,
    UlidNonceGenerator, VersionControl,
};

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("http client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub struct AppBuilder {
    config: Config,
    hosting: Option<Arc<dyn HostingProvider>>,
    vcs: Option<Arc<dyn VersionControl>>,
    notifier: Option<Arc<dyn Notifier>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    nonces: Option<Arc<dyn NonceGenerator>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hosting: None,
            vcs: None,
            notifier: None,
            text_generator: None,
            clock: None,
            nonces: None,
        }
    }

    pub fn with_hosting(mut self, hosting: Arc<dyn HostingProvider>) -> Self {
        self.hosting = Some(hosting);
        self
    }

    pub fn with_version_control(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Overrides the generator built from `Config::text_generation`.
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_nonce_generator(mut self, nonces: Arc<dyn NonceGenerator>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let config = Arc::new(self.config);

        let client = reqwest::Client::builder()
            .user_agent(concat!("pagewright/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let hosting = self.hosting.unwrap_or_else(|| {
            Arc::new(GitHubProvider::new(
                client.clone(),
                &config.github_api_base,
                &config.owner,
                &config.token,
            )) as Arc<dyn HostingProvider>
        });
        let vcs = self
            .vcs
            .unwrap_or_else(|| {
                Arc::new(GitCli::new(CommitIdentity::for_owner(&config.owner))) as Arc<dyn VersionControl>
            });
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(HttpNotifier::new(client.clone())) as Arc<dyn Notifier>);
        let text_generator = self.text_generator.or_else(|| {
            config.text_generation.as_ref().map(|tg| {
                Arc::new(OpenAiTextGenerator::new(
                    client.clone(),
                    &tg.base_url,
                    &tg.api_key,
                    &tg.model,
                )) as Arc<dyn TextGenerator>
            })
        });
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let nonces = self
            .nonces
            .unwrap_or_else(|| Arc::new(UlidNonceGenerator::new(SystemClock)) as Arc<dyn NonceGenerator>);

        let queue = Arc::new(InMemoryTaskQueue::new(config.queue_capacity));
        let content = ContentGenerator::with_defaults(text_generator);
        info!(
            queue_capacity = queue.capacity(),
            strategies = ?content.strategy_names(),
            "application wired"
        );
        let pipeline = Arc::new(TaskPipeline::new(
            Arc::clone(&config),
            content,
            MetadataStamper::new(config.owner.clone(), clock),
            ArtifactPublisher::new(hosting, vcs, config.branch.clone()),
            notifier,
            Arc::clone(&nonces),
        ));
        let router = ingress::router(IngressState {
            config: Arc::clone(&config),
            queue: queue.clone(),
            nonces,
        });

        Ok(App {
            config,
            queue,
            pipeline,
            router,
        })
    }
}

/// Wired application: HTTP router plus the pieces the workers need.
pub struct App {
    pub config: Arc<Config>,
    pub queue: Arc<InMemoryTaskQueue>,
    pub pipeline: Arc<TaskPipeline>,
    pub router: Router,
}

impl App {
    pub fn start_workers(&self) -> WorkerGroup {
        WorkerGroup::spawn(
            self.config.workers,
            Arc::clone(&self.queue) as Arc<dyn TaskQueue>,
            Arc::clone(&self.pipeline) as Arc<dyn TaskHandler>,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::testing::{FixedNonces, RecordingNotifier};
    use crate::app::publisher::testing::{FakeHosting, FakeVcs};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = Config::new("S", "me", "tok", "/tmp/pw");
        config.workers = 0;
        let err = AppBuilder::new(config).build().err().unwrap();
        assert!(matches!(err, BuildError::Config(ConfigError::Zero("workers"))));
    }

    #[tokio::test]
    async fn queue_is_sized_from_config() {
        let mut config = Config::new("S", "me", "tok", "/tmp/pw");
        config.queue_capacity = 7;
        let app = AppBuilder::new(config)
            .with_hosting(Arc::new(FakeHosting::new("remote")))
            .with_version_control(Arc::new(FakeVcs::default()))
            .build()
            .unwrap();
        assert_eq!(app.queue.capacity(), 7);
    }

    #[tokio::test]
    async fn accepted_request_flows_through_workers() {
        let base = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let app = AppBuilder::new(Config::new("S", "me", "tok", base.path()))
            .with_hosting(Arc::new(FakeHosting::new("remote")))
            .with_version_control(Arc::new(FakeVcs::default()))
            .with_notifier(notifier.clone())
            .with_nonce_generator(Arc::new(FixedNonces("n1")))
            .build()
            .unwrap();
        let workers = app.start_workers();

        let req = Request::builder()
            .method("POST")
            .uri(ingress::paths::TASKS)
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"secret":"S","task":"t1","brief":"captcha solver","evaluation_url":"http://grader.test/cb"}"#,
            ))
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        for _ in 0..200 {
            if app.queue.counts().await.succeeded == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        workers.shutdown_and_join().await;

        assert_eq!(app.queue.counts().await.succeeded, 1);
        assert!(base.path().join("t1_n1_app/index.html").is_file());
        let posts = notifier.posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].1["round"], 1);
        assert_eq!(posts[1].1["round"], 2);
    }
}
