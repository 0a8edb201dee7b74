//! Audio download and transcode
//!
//! yt-dlp downloads the best audio stream into a per-filename scratch
//! directory and its ffmpeg postprocessor encodes it to 192 kbps MP3. The
//! scratch tree is a sibling of the downloads directory, so an in-flight
//! partial file is never reachable under the public downloads mount; the
//! finished file is renamed into the downloads directory (same filesystem,
//! atomic), and the scratch directory is removed whether the download
//! succeeded or not.

use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::{YoutubeClient, YTDLP_BIN};
use crate::error::{Result, ServiceError};
use crate::models::StoredFile;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Target encoding.
const AUDIO_FORMAT: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";

impl YoutubeClient {
    /// Download `video_url` and encode it to MP3 under the sanitized
    /// `filename_base`.
    ///
    /// Idempotent: if the target file already exists it is reused without
    /// invoking yt-dlp again.
    pub async fn fetch_and_encode(
        &self,
        video_url: &str,
        filename_base: &str,
    ) -> Result<StoredFile> {
        let stem = sanitize_filename(filename_base);
        if stem.is_empty() {
            return Err(ServiceError::InvalidReference(format!(
                "filename base {:?} contains no usable characters",
                filename_base
            )));
        }
        let filename = format!("{}.{}", stem, AUDIO_FORMAT);

        // Serialize concurrent requests for the same target filename across
        // the exists-check, download and rename.
        let lock = self.filename_lock(&filename);
        let guard = lock.lock().await;

        let result = self.fetch_locked(video_url, &stem, &filename).await;

        drop(guard);
        drop(lock);
        self.release_filename_lock(&filename);

        result
    }

    async fn fetch_locked(
        &self,
        video_url: &str,
        stem: &str,
        filename: &str,
    ) -> Result<StoredFile> {
        let final_path = self.output_dir().join(filename);
        if final_path.exists() {
            tracing::debug!("reusing existing file {}", final_path.display());
            return Ok(StoredFile {
                filename: filename.to_string(),
                path: final_path,
            });
        }

        let work_dir = self.scratch_dir(stem);
        tokio::fs::create_dir_all(&work_dir).await?;

        let result = download_into(video_url, &work_dir, &final_path).await;
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            tracing::warn!("failed to remove scratch dir {}: {}", work_dir.display(), e);
        }

        result?;
        tracing::info!("stored {}", final_path.display());
        Ok(StoredFile {
            filename: filename.to_string(),
            path: final_path,
        })
    }
}

async fn download_into(video_url: &str, work_dir: &Path, final_path: &Path) -> Result<()> {
    let template = format!("{}/%(id)s.%(ext)s", work_dir.display());

    let mut command = Command::new(YTDLP_BIN);
    command
        .args([
            "--extract-audio",
            "--audio-format",
            AUDIO_FORMAT,
            "--audio-quality",
            AUDIO_QUALITY,
            "--no-playlist",
            "--quiet",
            "--output",
            &template,
            "--",
            video_url,
        ])
        .kill_on_drop(true);

    let output = tokio::time::timeout(DOWNLOAD_TIMEOUT, command.output())
        .await
        .map_err(|_| {
            ServiceError::Download(format!(
                "download timed out after {}s",
                DOWNLOAD_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| ServiceError::Download(format!("failed to run {}: {}", YTDLP_BIN, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ServiceError::Download(format!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    // The output template is id-based; find the encoded result.
    let mut entries = tokio::fs::read_dir(work_dir).await?;
    let mut produced = None;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(AUDIO_FORMAT) {
            produced = Some(path);
            break;
        }
    }
    let produced = produced.ok_or_else(|| {
        ServiceError::Download("yt-dlp reported success but produced no audio file".to_string())
    })?;

    tokio::fs::rename(&produced, final_path).await?;
    Ok(())
}

/// Reduce a display name to the filesystem-safe subset: alphanumerics,
/// space, `.`, `-`, `_`, `(`, `)`. Leading and trailing whitespace is
/// trimmed.
pub fn sanitize_filename(base: &str) -> String {
    base.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}
