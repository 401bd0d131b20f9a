//! ContentGenerator - strategy を優先順に試して `index.html` を作る
//!
//! 失敗した strategy は warn を出して次に回す。最後は brief テンプレートに落ちるので
//! `generate` 自体は失敗しない。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ContentError;
use crate::impls::strategies::{
    BriefTemplate, CaptchaSolver, GeneratedApp, GitHubUserLookup, MarkdownRenderer, SalesSummary,
};
use crate::ports::{ContentContext, ContentStrategy, TextGenerator};

pub const INDEX_FILE: &str = "index.html";

/// Rendered page plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub strategy: &'static str,
    pub html: String,
}

pub struct ContentGenerator {
    strategies: Vec<Arc<dyn ContentStrategy>>,
}

impl ContentGenerator {
    pub fn new(strategies: Vec<Arc<dyn ContentStrategy>>) -> Self {
        Self { strategies }
    }

    /// Built-in order. The text-generation strategy is only present when a
    /// generator is supplied.
    pub fn with_defaults(text_generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let mut strategies: Vec<Arc<dyn ContentStrategy>> = vec![
            Arc::new(CaptchaSolver),
            Arc::new(SalesSummary),
            Arc::new(MarkdownRenderer),
            Arc::new(GitHubUserLookup),
        ];
        if let Some(generator) = text_generator {
            strategies.push(Arc::new(GeneratedApp::new(generator)));
        }
        strategies.push(Arc::new(BriefTemplate));
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn generate(&self, ctx: &ContentContext) -> GeneratedPage {
        for strategy in &self.strategies {
            if !strategy.can_handle(ctx) {
                continue;
            }
            match strategy.render(ctx).await {
                Ok(html) => {
                    return GeneratedPage {
                        strategy: strategy.name(),
                        html,
                    };
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), error = %err, "content strategy failed, falling through");
                }
            }
        }
        debug!("no strategy produced content, using brief template");
        GeneratedPage {
            strategy: "brief",
            html: BriefTemplate::render_brief(&ctx.brief),
        }
    }

    /// Generate and write `index.html` into `dir`.
    pub async fn write_index(
        &self,
        dir: &Path,
        brief: &str,
        attachments: &[PathBuf],
    ) -> Result<PathBuf, ContentError> {
        let ctx = ContentContext {
            brief: brief.to_string(),
            dir: dir.to_path_buf(),
            attachments: attachments.to_vec(),
        };
        let page = self.generate(&ctx).await;
        let path = dir.join(INDEX_FILE);
        tokio::fs::write(&path, page.html.as_bytes())
            .await
            .map_err(|source| ContentError::Io {
                path: path.clone(),
                source,
            })?;
        info!(strategy = page.strategy, path = %path.display(), "index.html written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rstest::rstest;

    struct Failing;

    #[async_trait]
    impl ContentStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn can_handle(&self, _ctx: &ContentContext) -> bool {
            true
        }
        async fn render(&self, _ctx: &ContentContext) -> Result<String, ContentError> {
            Err(ContentError::Generation("boom".to_string()))
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ContentError> {
            Ok("```html\n<html>generated</html>\n```".to_string())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl TextGenerator for Unavailable {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ContentError> {
            Err(ContentError::Generation("service down".to_string()))
        }
    }

    fn ctx(brief: &str) -> ContentContext {
        ContentContext {
            brief: brief.to_string(),
            dir: PathBuf::from("/nonexistent"),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn default_order() {
        assert_eq!(
            ContentGenerator::with_defaults(None).strategy_names(),
            vec!["captcha", "sales-summary", "markdown", "github-user", "brief"]
        );
        assert_eq!(
            ContentGenerator::with_defaults(Some(Arc::new(Echo))).strategy_names(),
            vec!["captcha", "sales-summary", "markdown", "github-user", "text-generation", "brief"]
        );
    }

    #[rstest]
    #[case("Make a captcha page", "captcha")]
    #[case("compute sum-of-sales", "sales-summary")]
    #[case("render markdown nicely", "markdown")]
    #[case("look up a GitHub user", "github-user")]
    #[case("a todo list", "brief")]
    #[tokio::test]
    async fn keyword_selects_strategy(#[case] brief: &str, #[case] expected: &str) {
        let page = ContentGenerator::with_defaults(None).generate(&ctx(brief)).await;
        assert_eq!(page.strategy, expected);
    }

    #[tokio::test]
    async fn generated_app_is_used_when_configured() {
        let page = ContentGenerator::with_defaults(Some(Arc::new(Echo)))
            .generate(&ctx("a todo list"))
            .await;
        assert_eq!(page.strategy, "text-generation");
        assert_eq!(page.html, "<html>generated</html>");
    }

    #[tokio::test]
    async fn generation_failure_falls_through_to_brief() {
        let page = ContentGenerator::with_defaults(Some(Arc::new(Unavailable)))
            .generate(&ctx("a todo list"))
            .await;
        assert_eq!(page.strategy, "brief");
        assert!(page.html.contains("a todo list"));
    }

    #[tokio::test]
    async fn all_failing_strategies_still_produce_a_page() {
        let generator = ContentGenerator::new(vec![Arc::new(Failing)]);
        let page = generator.generate(&ctx("<b>hi</b>")).await;
        assert_eq!(page.strategy, "brief");
        assert!(page.html.contains("&lt;b&gt;hi&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn index_is_written_to_the_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let path = ContentGenerator::with_defaults(None)
            .write_index(dir.path(), "Captcha please", &[])
            .await
            .unwrap();
        assert_eq!(path, dir.path().join(INDEX_FILE));
        assert!(std::fs::read_to_string(path).unwrap().contains("captcha-img"));
    }
}
