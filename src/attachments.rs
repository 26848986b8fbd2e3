//! Job file attachments.
//!
//! Local files are ingested as self-contained `data:` URIs; external URLs
//! are linked as-is with a MIME type derived from their declared kind.
//! Ingestion runs as a cancellable async task keyed by the target job, so a
//! read that outlives its context is dropped rather than written onto
//! whichever job is open by the time it completes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::models::FileAttachment;

/// Declared kind of an externally linked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Still image
    Image,
    /// Video
    Video,
    /// PDF document
    Pdf,
    /// Anything else
    Other,
}

impl FileKind {
    /// The MIME type recorded for a linked file of this kind.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Video => "video/mp4",
            Self::Pdf => "application/pdf",
            Self::Other => "application/octet-stream",
        }
    }
}

/// Guess a MIME type from a file name's extension.
///
/// Covers the formats the shop actually attaches; everything else is an
/// opaque octet stream.
#[must_use]
pub fn mime_from_extension(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Extract the video id from a YouTube URL in any of its common shapes
/// (watch, short link, embed, shorts, live).
#[must_use]
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let patterns = [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)",
        r"youtube\.com/shorts/([^&\n?#]+)",
        r"youtube\.com/live/([^&\n?#]+)",
    ];

    for pattern in patterns {
        if let Some(captures) = Regex::new(pattern).ok()?.captures(url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }
    }

    None
}

/// Thumbnail URL YouTube serves for a video id.
#[must_use]
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/0.jpg")
}

/// Build an attachment for an externally linked URL.
///
/// Images thumbnail themselves; YouTube videos get the service thumbnail;
/// everything else has no preview.
#[must_use]
pub fn linked_attachment(id: i64, url: &str, kind: FileKind) -> FileAttachment {
    let name = url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Archivo externo")
        .to_string();

    let thumbnail = match kind {
        FileKind::Image => Some(url.to_string()),
        FileKind::Video => extract_youtube_id(url).map(|id| youtube_thumbnail_url(&id)),
        _ => None,
    };

    FileAttachment {
        id,
        name,
        mime_type: kind.mime().to_string(),
        url: url.to_string(),
        thumbnail,
        is_local: false,
    }
}

/// Encode raw bytes as a self-contained data URI.
#[must_use]
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

/// Source of attachment bytes, async so reads never block the caller.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Read the full contents of a file.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// The real filesystem source.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

#[async_trait]
impl AttachmentSource for FsSource {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }
}

struct LoaderState {
    /// Job the attachment UI is currently targeting, if any
    current: Option<i64>,
    /// In-flight reads keyed by target job
    pending: HashMap<i64, Vec<AbortHandle>>,
}

/// Runs attachment reads as single-shot tasks keyed by the target job.
///
/// A read started for a job that is no longer the focused context by the
/// time it completes is discarded, and refocusing aborts reads that were
/// targeting a different job.
pub struct AttachmentLoader<S: AttachmentSource> {
    source: Arc<S>,
    state: Arc<Mutex<LoaderState>>,
}

impl<S: AttachmentSource> Clone for AttachmentLoader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for AttachmentLoader<FsSource> {
    fn default() -> Self {
        Self::new(FsSource)
    }
}

impl<S: AttachmentSource + 'static> AttachmentLoader<S> {
    /// Create a loader over the given byte source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(LoaderState {
                current: None,
                pending: HashMap::new(),
            })),
        }
    }

    /// Focus on a job: pending reads for any other job are aborted.
    pub fn focus(&self, job_id: i64) {
        let mut state = self.lock();
        state.current = Some(job_id);
        let stale: Vec<i64> = state
            .pending
            .keys()
            .copied()
            .filter(|pending_id| *pending_id != job_id)
            .collect();
        for id in stale {
            if let Some(handles) = state.pending.remove(&id) {
                for handle in handles {
                    handle.abort();
                }
                debug!(job_id = id, "aborted stale attachment reads");
            }
        }
    }

    /// Leave the current context, aborting every pending read.
    pub fn blur(&self) {
        let mut state = self.lock();
        state.current = None;
        for (id, handles) in state.pending.drain() {
            for handle in handles {
                handle.abort();
            }
            debug!(job_id = id, "aborted attachment reads on blur");
        }
    }

    /// Read a local file for a job and package it as a data-URI attachment.
    ///
    /// Returns `Ok(None)` when the read finished after the job stopped being
    /// the focused context; the caller must not attach anything in that
    /// case.
    pub async fn ingest(
        &self,
        job_id: i64,
        attachment_id: i64,
        path: &Path,
    ) -> Result<Option<FileAttachment>> {
        if self.lock().current != Some(job_id) {
            warn!(job_id, "attachment read requested outside its context");
            return Ok(None);
        }

        let source = Arc::clone(&self.source);
        let owned_path: PathBuf = path.to_path_buf();
        let reader = tokio::spawn(async move { source.read(&owned_path).await });

        // Register with focus()/blur() so a context change cancels the read.
        self.lock()
            .pending
            .entry(job_id)
            .or_default()
            .push(reader.abort_handle());

        let outcome = reader.await;
        self.lock().pending.remove(&job_id);

        let bytes = match outcome {
            Ok(result) => result?,
            Err(join_error) if join_error.is_cancelled() => return Ok(None),
            Err(join_error) => return Err(LedgerError::Other(join_error.to_string())),
        };

        if self.lock().current != Some(job_id) {
            debug!(job_id, "attachment read completed after context change");
            return Ok(None);
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("archivo")
            .to_string();
        let mime_type = mime_from_extension(&name).to_string();
        let url = data_uri(&mime_type, &bytes);
        let thumbnail = mime_type
            .starts_with("image/")
            .then(|| url.clone());

        Ok(Some(FileAttachment {
            id: attachment_id,
            name,
            mime_type,
            url,
            thumbnail,
            is_local: true,
        }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoaderState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id_variants() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=abc123&t=10"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/xyz789"),
            Some("xyz789".to_string())
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/shorts/short1"),
            Some("short1".to_string())
        );
        assert_eq!(extract_youtube_id("https://vimeo.com/12345"), None);
    }

    #[test]
    fn test_linked_image_thumbnails_itself() {
        let attachment = linked_attachment(1, "https://example.com/foto.jpg", FileKind::Image);
        assert_eq!(attachment.name, "foto.jpg");
        assert_eq!(attachment.mime_type, "image/jpeg");
        assert_eq!(attachment.thumbnail.as_deref(), Some("https://example.com/foto.jpg"));
        assert!(!attachment.is_local);
    }

    #[test]
    fn test_data_uri_encoding() {
        assert_eq!(data_uri("text/plain", b"hola"), "data:text/plain;base64,aG9sYQ==");
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("logo.PNG"), "image/png");
        assert_eq!(mime_from_extension("manual.pdf"), "application/pdf");
        assert_eq!(mime_from_extension("datos.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_ingest_requires_focus() {
        let loader = AttachmentLoader::default();
        let result = loader.ingest(1, 10, Path::new("/tmp/nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_stale_read_is_dropped() {
        struct SlowSource;

        #[async_trait]
        impl AttachmentSource for SlowSource {
            async fn read(&self, _path: &Path) -> Result<Vec<u8>> {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(b"bytes".to_vec())
            }
        }

        let loader = AttachmentLoader::new(SlowSource);
        loader.focus(1);
        let pending = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.ingest(1, 10, Path::new("f.png")).await })
        };

        // Context moves to another job while the read is still in flight.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        loader.focus(2);

        let result = pending.await.unwrap().unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ingest_builds_data_uri() {
        struct FixedSource;

        #[async_trait]
        impl AttachmentSource for FixedSource {
            async fn read(&self, _path: &Path) -> Result<Vec<u8>> {
                Ok(b"img".to_vec())
            }
        }

        let loader = AttachmentLoader::new(FixedSource);
        loader.focus(7);
        let attachment = loader
            .ingest(7, 11, Path::new("foto.png"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(attachment.mime_type, "image/png");
        assert!(attachment.url.starts_with("data:image/png;base64,"));
        assert_eq!(attachment.thumbnail, Some(attachment.url.clone()));
        assert!(attachment.is_local);
    }
}
