//! YouTube search and audio fetch
//!
//! Both operations shell out to `yt-dlp`, which carries its own ffmpeg
//! postprocessor for the MP3 transcode. Search and download each run under an
//! explicit deadline and are attempted exactly once; there are no retries.

pub mod fetch;
pub mod search;

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Binary invoked for search and download.
pub(crate) const YTDLP_BIN: &str = "yt-dlp";

const SERVICE: &str = "youtube";

/// Client for the external video platform.
///
/// Holds the downloads directory plus one async lock per target filename, so
/// concurrent requests producing the same file serialize on check + download
/// + rename instead of racing.
pub struct YoutubeClient {
    output_dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl YoutubeClient {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            locks: DashMap::new(),
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Scratch tree for in-flight downloads: a sibling of the downloads
    /// directory, so nothing half-written is ever reachable through the
    /// public downloads mount, while the final rename stays on the same
    /// filesystem and therefore atomic.
    pub(crate) fn scratch_dir(&self, stem: &str) -> PathBuf {
        let name = self
            .output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("downloads");
        self.output_dir
            .with_file_name(format!("{}.work", name))
            .join(stem)
    }

    pub(crate) fn filename_lock(&self, filename: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(filename.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a filename's lock entry once no other request holds or awaits
    /// it, so the map does not grow for the life of the process.
    pub(crate) fn release_filename_lock(&self, filename: &str) {
        self.locks
            .remove_if(filename, |_, lock| Arc::strong_count(lock) == 1);
    }
}
