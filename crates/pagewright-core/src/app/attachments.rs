//! AttachmentMaterializer - 添付ファイルを workspace に書き出す
//!
//! - inline `data:` URI だけを扱う（base64 / 生データ）
//! - remote URL や壊れたエントリは warn を出してスキップ
//! - ファイル名は最後の通常コンポーネントだけを使う（workspace の外に書かない）

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, warn};

use crate::domain::{Attachment, AttachmentError, AttachmentSource, DataUri};

/// padding の有無を問わない STANDARD alphabet
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reduce an attachment name to a single safe file name.
///
/// Separators of either style are honoured and only the last non-empty
/// component is kept. `.`, `..`, `.git` and names with NUL bytes are rejected.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let last = normalized
        .rsplit('/')
        .map(str::trim)
        .find(|segment| !segment.is_empty())?;
    if matches!(last, "." | ".." | ".git") || last.contains('\0') {
        return None;
    }
    Some(last.to_string())
}

fn decode(name: &str, uri: &DataUri<'_>) -> Result<Vec<u8>, AttachmentError> {
    if !uri.base64 {
        return Ok(uri.data.as_bytes().to_vec());
    }
    let compact: String = uri.data.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT_BASE64
        .decode(compact)
        .map_err(|source| AttachmentError::Decode {
            name: name.to_string(),
            source,
        })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AttachmentMaterializer;

impl AttachmentMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// Write every inline attachment into `dir` and return the saved paths in
    /// request order. Only I/O failures abort; unusable entries are skipped.
    pub async fn materialize(
        &self,
        dir: &Path,
        attachments: &[Attachment],
    ) -> Result<Vec<PathBuf>, AttachmentError> {
        let mut saved = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            match self.materialize_one(dir, attachment).await {
                Ok(Some(path)) => saved.push(path),
                Ok(None) => {}
                Err(err @ AttachmentError::Io { .. }) => return Err(err),
                Err(err) => warn!(attachment = %attachment.name, error = %err, "attachment skipped"),
            }
        }
        Ok(saved)
    }

    async fn materialize_one(
        &self,
        dir: &Path,
        attachment: &Attachment,
    ) -> Result<Option<PathBuf>, AttachmentError> {
        let uri = match attachment.source() {
            AttachmentSource::Inline(uri) => uri,
            AttachmentSource::Remote(url) => {
                warn!(attachment = %attachment.name, url, "remote attachment not fetched");
                return Ok(None);
            }
            AttachmentSource::MalformedInline => {
                return Err(AttachmentError::MalformedDataUri(attachment.name.clone()));
            }
        };
        let file_name = sanitize_file_name(&attachment.name)
            .ok_or_else(|| AttachmentError::InvalidName(attachment.name.clone()))?;
        let bytes = decode(&attachment.name, &uri)?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| AttachmentError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), media_type = uri.media_type, "attachment saved");
        Ok(Some(path))
    }
}
