//! Content ports - webpage content strategies and the text-generation service.
//!
//! Strategies are tried in priority order; the first one that claims the
//! brief and renders successfully wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::ContentError;

/// Everything a strategy may look at.
#[derive(Debug, Clone)]
pub struct ContentContext {
    pub brief: String,
    /// Workspace directory holding the saved attachments.
    pub dir: PathBuf,
    /// Saved attachment paths (inside `dir`).
    pub attachments: Vec<PathBuf>,
}

impl ContentContext {
    pub fn brief_mentions(&self, keyword: &str) -> bool {
        self.brief.to_lowercase().contains(keyword)
    }

    /// First attachment with the given extension (case-insensitive).
    pub fn attachment_with_extension(&self, ext: &str) -> Option<&Path> {
        self.attachments
            .iter()
            .find(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .map(PathBuf::as_path)
    }
}

#[async_trait]
pub trait ContentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, ctx: &ContentContext) -> bool;

    /// Render a complete `index.html` document.
    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError>;
}

/// External text-generation service (chat completion style).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        let ctx = ContentContext {
            brief: "Sum Of Sales".to_string(),
            dir: PathBuf::from("/w"),
            attachments: vec![PathBuf::from("/w/notes.txt"), PathBuf::from("/w/DATA.CSV")],
        };
        assert_eq!(
            ctx.attachment_with_extension("csv"),
            Some(Path::new("/w/DATA.CSV"))
        );
        assert!(ctx.attachment_with_extension("md").is_none());
        assert!(ctx.brief_mentions("sum of sales"));
    }
}
