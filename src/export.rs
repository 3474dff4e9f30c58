//! Text file export of a generated outline

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::format::format_outline;
use crate::outline::Outline;

const SLUG_MAX_CHARS: usize = 50;
const FILE_SUFFIX: &str = "-outline.txt";

/// Topic slug: lower-cased, cut to 50 characters, every character outside
/// `[a-z0-9]` replaced by `-`.
pub fn slugify(topic: &str) -> String {
    topic
        .to_lowercase()
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Download file name for a topic, e.g. `how-to-bake-bread-outline.txt`
pub fn export_file_name(topic: &str) -> String {
    format!("{}{}", slugify(topic), FILE_SUFFIX)
}

/// Write the formatted outline into `dir` and return the written path.
pub async fn write_export(dir: &Path, topic: &str, outline: &Outline) -> Result<PathBuf> {
    let path = dir.join(export_file_name(topic));
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, format_outline(outline)).await?;
    tracing::info!("outline exported to {}", path.display());
    Ok(path)
}
