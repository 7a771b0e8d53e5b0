// crates/indexer/src/ingest/mod.rs
pub mod batch;
pub mod uploader;
pub mod wal;

use batch::Batch;
use uploader::BatchUploader;

use crate::config::IndexerConfig;
use anyhow::{Context, Result};
use podgrep_segment::naming::is_transcript_file;
use podgrep_segment::{parse_transcript, Document, EpisodeKey, WindowSegmenter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Итоги прогона.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub files_failed: usize,
    pub segments_skipped: usize,
    pub documents: usize,
    pub batches: usize,
}

/// Драйвер: файл за файлом -> окна -> батч -> uploader.
///
/// Файлы обрабатываются строго последовательно; сброс батча ждём до конца,
/// прежде чем резать следующий файл. Ошибка uploader'а завершает прогон.
pub struct Ingestor<U> {
    segmenter: WindowSegmenter,
    uploader: U,
    index: String,
    batch: Batch,
    skip_bad_files: bool,
    stats: IngestStats,
}

impl<U: BatchUploader> Ingestor<U> {
    pub fn new(cfg: &IndexerConfig, uploader: U) -> Self {
        Self {
            segmenter: WindowSegmenter::new(cfg.window()),
            uploader,
            index: cfg.index.clone(),
            batch: Batch::with_cap(cfg.batch_size),
            skip_bad_files: cfg.skip_bad_files,
            stats: IngestStats::default(),
        }
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Обойти каталог, нарезать все эпизоды и сбросить остаток.
    pub async fn ingest_dir(&mut self, root: &Path) -> Result<IngestStats> {
        let files = transcript_files(root)?;
        info!(root = %root.display(), files = files.len(), "ingest started");

        for path in &files {
            match self.ingest_file(path).await {
                Ok(()) => {}
                Err(err) if self.skip_bad_files && !is_upload_error(&err) => {
                    error!(path = %path.display(), error = ?err, "transcript file rejected");
                    self.stats.files_failed += 1;
                }
                Err(err) => return Err(err),
            }
        }
        self.finish().await
    }

    /// Один эпизод: ключ из пути, разбор, нарезка, документы в батч.
    /// Файл разбирается целиком до первого документа, так что битый файл
    /// не оставляет в батче половину эпизода.
    pub async fn ingest_file(&mut self, path: &Path) -> Result<()> {
        let key = EpisodeKey::from_path(path)?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let transcript =
            parse_transcript(&data).with_context(|| format!("parse {}", path.display()))?;

        let docs = self.segmenter.segment(&key, &transcript.segments);
        debug!(
            path = %path.display(),
            segments = transcript.segments.len(),
            skipped = transcript.skipped,
            documents = docs.len(),
            "episode segmented"
        );

        self.stats.files += 1;
        self.stats.segments_skipped += transcript.skipped;
        for doc in docs {
            self.push(doc).await?;
        }
        Ok(())
    }

    async fn push(&mut self, doc: Document) -> Result<()> {
        self.stats.documents += 1;
        if self.batch.push(doc) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Сбросить неполный батч (конец ввода) и вернуть итоги.
    pub async fn finish(&mut self) -> Result<IngestStats> {
        if !self.batch.is_empty() {
            self.flush().await?;
        }
        info!(
            files = self.stats.files,
            files_failed = self.stats.files_failed,
            documents = self.stats.documents,
            batches = self.stats.batches,
            "ingest finished"
        );
        Ok(self.stats.clone())
    }

    async fn flush(&mut self) -> Result<()> {
        let docs = self.batch.take();
        self.uploader
            .upload(&self.index, &docs)
            .await
            .map_err(|e| e.context(UploadFailed { docs: docs.len() }))?;
        self.stats.batches += 1;
        debug!(docs = docs.len(), index = %self.index, "batch flushed");
        Ok(())
    }
}

/// Маркер ошибки bulk-записи: такие ошибки никогда не пропускаются.
#[derive(Debug)]
struct UploadFailed {
    docs: usize,
}

impl std::fmt::Display for UploadFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bulk upload of {} documents failed", self.docs)
    }
}

fn is_upload_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<UploadFailed>().is_some()
}

/// Все *.json под корнем, в стабильном порядке (по пути).
pub fn transcript_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if entry.file_type().is_file() && is_transcript_file(entry.path()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}
