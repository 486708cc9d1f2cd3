use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;
use crate::upload::flags::UploadIntent;

const BOM: char = '\u{feff}';

/// Where the changelog text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogSource<'a> {
    Inline(&'a str),
    File(PathBuf),
    Stdin,
}

impl UploadIntent {
    pub fn changelog_source(&self) -> Result<ChangelogSource<'_>> {
        self.validate_changelog_sources()?;

        let file = self.changelog_file.trim();
        Ok(if !file.is_empty() {
            ChangelogSource::File(PathBuf::from(file))
        } else if self.changelog_stdin {
            ChangelogSource::Stdin
        } else {
            ChangelogSource::Inline(&self.changelog)
        })
    }
}

/// Strip a leading byte-order mark and turn CRLF line endings into LF.
///
/// Carriage returns that do not end a line are kept as they are.
pub fn normalize_changelog(raw: &str) -> String {
    let text = raw.trim_start_matches(BOM);
    let mut out = String::with_capacity(text.len());
    let mut pending_cr = 0usize;

    for ch in text.chars() {
        match ch {
            '\r' => pending_cr += 1,
            '\n' => {
                pending_cr = 0;
                out.push('\n');
            }
            other => {
                out.extend(std::iter::repeat('\r').take(pending_cr));
                pending_cr = 0;
                out.push(other);
            }
        }
    }
    out.extend(std::iter::repeat('\r').take(pending_cr));
    out
}

/// Produce the final changelog text for an upload.
pub async fn resolve_changelog<R>(intent: &UploadIntent, stdin: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    match intent.changelog_source()? {
        ChangelogSource::File(path) => {
            tracing::debug!("Reading changelog from {}", path.display());
            let raw = tokio::fs::read(&path).await?;
            Ok(normalize_changelog(&String::from_utf8_lossy(&raw)))
        }
        ChangelogSource::Stdin => {
            tracing::debug!("Reading changelog from standard input");
            let mut raw = Vec::new();
            stdin.read_to_end(&mut raw).await?;
            Ok(normalize_changelog(&String::from_utf8_lossy(&raw)))
        }
        ChangelogSource::Inline(text) => Ok(normalize_changelog(text)),
    }
}
