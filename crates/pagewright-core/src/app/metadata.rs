//! MetadataStamper - LICENSE と README.md を workspace に書く

use std::path::Path;
use std::sync::Arc;

use chrono::Datelike;
use tracing::debug;

use crate::domain::{PipelineError, TaskName};
use crate::ports::Clock;

pub const LICENSE_FILE: &str = "LICENSE";
pub const README_FILE: &str = "README.md";

pub fn mit_license(year: i32, holder: &str) -> String {
    format!(
        "MIT License

Copyright (c) {year} {holder}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"
    )
}

pub fn readme(name: &TaskName, brief: &str, pages_url: &str) -> String {
    let brief = if brief.trim().is_empty() {
        "No brief was provided."
    } else {
        brief.trim()
    };
    format!(
        "# {name}

{brief}

## Live page

{pages_url}

## Usage

Open `index.html` in a browser, or visit the live page above. The app is a
static single page and needs no build step.

## License

MIT. See [LICENSE](LICENSE).
"
    )
}

pub struct MetadataStamper {
    holder: String,
    clock: Arc<dyn Clock>,
}

impl MetadataStamper {
    pub fn new(holder: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            holder: holder.into(),
            clock,
        }
    }

    pub async fn stamp(
        &self,
        dir: &Path,
        name: &TaskName,
        brief: &str,
        pages_url: &str,
    ) -> Result<(), PipelineError> {
        let year = self.clock.now().year();
        write(dir, LICENSE_FILE, mit_license(year, &self.holder)).await?;
        write(dir, README_FILE, readme(name, brief, pages_url)).await?;
        debug!(dir = %dir.display(), "metadata files written");
        Ok(())
    }
}

async fn write(dir: &Path, file: &str, contents: String) -> Result<(), PipelineError> {
    let path = dir.join(file);
    tokio::fs::write(&path, contents)
        .await
        .map_err(|source| PipelineError::Metadata { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn writes_license_and_readme() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2031, 5, 1, 0, 0, 0).unwrap()));
        let stamper = MetadataStamper::new("octocat", clock);
        let name = TaskName::new("captcha-solver").unwrap();

        stamper
            .stamp(dir.path(), &name, "Solve captchas", "https://octocat.github.io/captcha-solver/")
            .await
            .unwrap();

        let license = std::fs::read_to_string(dir.path().join(LICENSE_FILE)).unwrap();
        assert!(license.starts_with("MIT License"));
        assert!(license.contains("Copyright (c) 2031 octocat"));

        let readme = std::fs::read_to_string(dir.path().join(README_FILE)).unwrap();
        assert!(readme.starts_with("# captcha-solver"));
        assert!(readme.contains("Solve captchas"));
        assert!(readme.contains("https://octocat.github.io/captcha-solver/"));
    }

    #[test]
    fn empty_brief_gets_a_placeholder() {
        let name = TaskName::new("t").unwrap();
        assert!(readme(&name, "  ", "u").contains("No brief was provided."));
    }
}
