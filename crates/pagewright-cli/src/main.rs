//! pagewright - タスク webhook を受けて静的アプリを生成・公開するサーバー
//!
//! ```bash
//! STUDENT_SECRET=... GITHUB_USERNAME=... GITHUB_TOKEN=... pagewright --bind 0.0.0.0:8000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pagewright_core::app::config::{
    DEFAULT_BRANCH, DEFAULT_MAX_BODY_BYTES, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS,
};
use pagewright_core::app::{AppBuilder, Config, TextGenerationConfig};
use pagewright_core::impls::{github, openai};

/// Command-line arguments. Every option falls back to an environment variable.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shared secret callers must present
    #[arg(long, env = "STUDENT_SECRET", hide_env_values = true)]
    secret: String,

    /// Owner of the hosted repositories
    #[arg(long, env = "GITHUB_USERNAME")]
    github_username: String,

    /// Access token for the hosting provider
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// Directory under which per-task workspaces are created
    #[arg(long, env = "BASE_REPO_DIR", default_value = "tmp")]
    base_dir: PathBuf,

    /// Enables the text-generation content strategy
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = openai::DEFAULT_MODEL)]
    openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = openai::DEFAULT_BASE_URL)]
    openai_base_url: String,

    #[arg(long, env = "GITHUB_API_BASE", default_value = github::DEFAULT_API_BASE)]
    github_api_base: String,

    #[arg(long, env = "PAGEWRIGHT_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    #[arg(long, env = "PAGEWRIGHT_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    #[arg(long, env = "PAGEWRIGHT_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    #[arg(long, env = "PAGEWRIGHT_BRANCH", default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Largest accepted task body in bytes (attachments arrive inline as data URIs)
    #[arg(long, env = "PAGEWRIGHT_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::new(
            self.secret,
            self.github_username,
            self.github_token,
            self.base_dir,
        );
        config.branch = self.branch;
        config.workers = self.workers;
        config.queue_capacity = self.queue_capacity;
        config.max_body_bytes = self.max_body_bytes;
        config.github_api_base = self.github_api_base;
        config.text_generation = self
            .openai_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| TextGenerationConfig {
                api_key: key,
                model: self.openai_model,
                base_url: self.openai_base_url,
            });
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let bind = args.bind;
    let config = args.into_config();

    tokio::fs::create_dir_all(&config.base_dir)
        .await
        .with_context(|| format!("creating workspace base {}", config.base_dir.display()))?;

    let app = AppBuilder::new(config)
        .build()
        .context("building application")?;
    info!(
        owner = %app.config.owner,
        base_dir = %app.config.base_dir.display(),
        workers = app.config.workers,
        max_body_bytes = app.config.max_body_bytes,
        text_generation = app.config.text_generation.is_some(),
        "configuration loaded"
    );

    let workers = app.start_workers();

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(%bind, "listening");

    axum::serve(listener, app.router.clone())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    info!("draining workers");
    workers.shutdown_and_join().await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable, waiting for ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_map_onto_config() {
        let args = Args::try_parse_from([
            "pagewright",
            "--secret",
            "S",
            "--github-username",
            "me",
            "--github-token",
            "tok",
            "--openai-api-key",
            "sk-test",
            "--workers",
            "2",
        ])
        .unwrap();
        let config = args.into_config();

        assert_eq!(config.secret, "S");
        assert_eq!(config.owner, "me");
        assert_eq!(config.workers, 2);
        assert_eq!(config.branch, "main");
        assert_eq!(config.base_dir, PathBuf::from("tmp"));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        let tg = config.text_generation.as_ref().unwrap();
        assert_eq!(tg.model, openai::DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_api_key_disables_text_generation() {
        let args = Args::try_parse_from([
            "pagewright",
            "--secret",
            "S",
            "--github-username",
            "me",
            "--github-token",
            "tok",
            "--openai-api-key",
            " ",
        ])
        .unwrap();
        assert!(args.into_config().text_generation.is_none());
    }

    #[test]
    fn body_limit_flag_overrides_default() {
        let args = Args::try_parse_from([
            "pagewright",
            "--secret",
            "S",
            "--github-username",
            "me",
            "--github-token",
            "tok",
            "--max-body-bytes",
            "1024",
        ])
        .unwrap();
        assert_eq!(args.into_config().max_body_bytes, 1024);
    }
}
