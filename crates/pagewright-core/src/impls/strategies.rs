//! Built-in content strategies, in the order the generator tries them.
//!
//! Keyword matching is done on the lowercased brief. Every template is a
//! complete single-file page.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pulldown_cmark::{Options, Parser, html};

use crate::domain::ContentError;
use crate::ports::{ContentContext, ContentStrategy, TextGenerator};

/// Minimal HTML escaping for text placed inside element bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n{head_extra}</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

async fn read_text(path: &Path) -> Result<String, ContentError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub struct CaptchaSolver;

#[async_trait]
impl ContentStrategy for CaptchaSolver {
    fn name(&self) -> &'static str {
        "captcha"
    }

    fn can_handle(&self, ctx: &ContentContext) -> bool {
        ctx.brief_mentions("captcha")
    }

    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError> {
        // 添付画像があればそれを既定の ?url にする
        let default_image = ["png", "jpg", "jpeg", "gif", "webp"]
            .iter()
            .find_map(|ext| ctx.attachment_with_extension(ext))
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("sample.png")
            .to_string();
        let body = format!(
            r#"<h2>Captcha Solver</h2>
<img id="captcha-img" src="" alt="Captcha">
<div id="captcha-text">Loading...</div>
<script>
  const params = new URLSearchParams(window.location.search);
  const url = params.get('url') || {default_image:?};
  document.getElementById('captcha-img').src = url;
  document.getElementById('captcha-text').textContent = 'Solved: ' + url.split('/').pop();
</script>"#
        );
        Ok(page("Captcha Solver", "", &body))
    }
}

pub struct SalesSummary;

/// Sum the `sales` column of a CSV document. Cells that do not parse count
/// as zero; a missing column sums to zero.
pub fn sum_sales_column(text: &str) -> f64 {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let Some(column) = reader
        .headers()
        .ok()
        .and_then(|headers| headers.iter().position(|h| h.eq_ignore_ascii_case("sales")))
    else {
        return 0.0;
    };
    reader
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| record.get(column)?.parse::<f64>().ok())
        .sum()
}

#[async_trait]
impl ContentStrategy for SalesSummary {
    fn name(&self) -> &'static str {
        "sales-summary"
    }

    fn can_handle(&self, ctx: &ContentContext) -> bool {
        ctx.brief_mentions("sum-of-sales") || ctx.attachment_with_extension("csv").is_some()
    }

    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError> {
        let total = match ctx.attachment_with_extension("csv") {
            Some(path) => sum_sales_column(&read_text(path).await?),
            None => 0.0,
        };
        let body = format!(
            "<h2>Sales Summary</h2>\n<div id=\"total-sales\">{total}</div>"
        );
        Ok(page("Sales Summary", "", &body))
    }
}

pub struct MarkdownRenderer;

#[async_trait]
impl ContentStrategy for MarkdownRenderer {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn can_handle(&self, ctx: &ContentContext) -> bool {
        ctx.brief_mentions("markdown") || ctx.attachment_with_extension("md").is_some()
    }

    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError> {
        let source = match ctx.attachment_with_extension("md") {
            Some(path) => read_text(path).await?,
            None => String::new(),
        };
        let mut rendered = String::new();
        html::push_html(&mut rendered, Parser::new_ext(&source, Options::all()));

        let head = "<link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.8.0/styles/default.min.css\">\n\
                    <script src=\"https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.8.0/highlight.min.js\"></script>\n";
        let body = format!(
            "<div id=\"markdown-output\">\n{rendered}</div>\n\
             <script>document.querySelectorAll('pre code').forEach((el) => hljs.highlightElement(el));</script>"
        );
        Ok(page("Markdown Renderer", head, &body))
    }
}

pub struct GitHubUserLookup;

#[async_trait]
impl ContentStrategy for GitHubUserLookup {
    fn name(&self) -> &'static str {
        "github-user"
    }

    fn can_handle(&self, ctx: &ContentContext) -> bool {
        ctx.brief_mentions("github")
    }

    async fn render(&self, _ctx: &ContentContext) -> Result<String, ContentError> {
        let body = r#"<form id="github-user-form">
  Username: <input id="username" type="text">
  <button type="submit">Lookup</button>
</form>
<div id="github-created-at"></div>
<script>
  document.getElementById('github-user-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const user = document.getElementById('username').value;
    const resp = await fetch('https://api.github.com/users/' + encodeURIComponent(user));
    const data = await resp.json();
    document.getElementById('github-created-at').textContent = data.created_at || 'Not found';
  });
</script>"#;
        Ok(page("GitHub User Lookup", "", body))
    }
}

const GENERATOR_SYSTEM_PROMPT: &str = "You are a professional web app code generator.";

/// Strip a surrounding ``` fence (with optional language tag) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Delegates to the external text-generation service.
pub struct GeneratedApp {
    generator: Arc<dyn TextGenerator>,
}

impl GeneratedApp {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ContentStrategy for GeneratedApp {
    fn name(&self) -> &'static str {
        "text-generation"
    }

    fn can_handle(&self, ctx: &ContentContext) -> bool {
        !ctx.brief.trim().is_empty()
    }

    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError> {
        let prompt = format!(
            "Generate a single-page static web app (index.html) for this brief:\n---\n{}\n---\n\
             The app should be functional and runnable as static HTML (no backend).\n\
             Do not include explanations. Output only valid HTML code.",
            ctx.brief
        );
        let raw = self.generator.generate(GENERATOR_SYSTEM_PROMPT, &prompt).await?;
        let html = strip_code_fence(&raw);
        if html.is_empty() {
            return Err(ContentError::Generation("empty document".to_string()));
        }
        Ok(html.to_string())
    }
}

/// Always applies; shows the brief.
pub struct BriefTemplate;

impl BriefTemplate {
    pub fn render_brief(brief: &str) -> String {
        let body = format!("<h1>Task Brief</h1>\n<p>{}</p>", escape_html(brief));
        page("Generated App", "", &body)
    }
}

#[async_trait]
impl ContentStrategy for BriefTemplate {
    fn name(&self) -> &'static str {
        "brief"
    }

    fn can_handle(&self, _ctx: &ContentContext) -> bool {
        true
    }

    async fn render(&self, ctx: &ContentContext) -> Result<String, ContentError> {
        Ok(Self::render_brief(&ctx.brief))
    }
}
