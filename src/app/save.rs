//! Writing downloaded payloads to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use media_transfer::transfer::filename::{FALLBACK_NAME, sanitize_filename};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const MAX_SUFFIX: usize = 1000;

/// Writes `payload` into `dir` as `name`, never overwriting an existing file.
///
/// Collisions get `_2`, `_3`, ... inserted before the extension.
pub(crate) async fn save_payload(dir: &Path, name: &str, payload: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;

    let filename = safe_filename(name);
    for candidate in candidate_names(&filename) {
        let path = dir.join(&candidate);
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create '{}'", path.display()));
            }
        };
        file.write_all(payload)
            .await
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = payload.len(), "payload saved");
        return Ok(path);
    }
    bail!(
        "No free file name for '{}' in '{}'",
        filename,
        dir.display()
    )
}

fn safe_filename(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.contains('/') || sanitized.contains('\\') || sanitized.trim_matches('_').is_empty()
    {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// `name`, then `stem_2.ext`, `stem_3.ext`, ...
fn candidate_names(filename: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };
    std::iter::once(filename.to_string())
        .chain((2..MAX_SUFFIX).map(move |i| format!("{stem}_{i}{ext}")))
}
