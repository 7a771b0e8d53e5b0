// path: crates/indexer/src/ingest/wal.rs
use super::uploader::BatchUploader;

use anyhow::Context;
use async_trait::async_trait;
use podgrep_segment::bulk::encode_bulk;
use podgrep_segment::mapping::index_mapping;
use podgrep_segment::Document;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncReadExt;
use tokio::{fs, io::AsyncWriteExt};
use xxhash_rust::xxh3::xxh3_64;

/// Режим durability из env PG_BULK_FSYNC.
///
/// - `Always`: sync данных, сайдкара и каталога после rename;
/// - `Batch`: sync только данных батча перед rename;
/// - `Disabled`: без sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsyncMode {
    Always,
    Batch,
    Disabled,
}

impl FsyncMode {
    pub fn parse(v: Option<&str>) -> Self {
        match v {
            Some("always") => FsyncMode::Always,
            Some("disabled") => FsyncMode::Disabled,
            _ => FsyncMode::Batch,
        }
    }
}

fn fsync_mode_from_env() -> FsyncMode {
    FsyncMode::parse(std::env::var("PG_BULK_FSYNC").ok().as_deref())
}

/// Uploader, который пишет каждый батч отдельным NDJSON-файлом в формате `_bulk`.
/// Файл потом можно отправить в backend как есть (`POST /_bulk`).
pub struct BulkFileUploader {
    dir: PathBuf,
    fsync_mode: FsyncMode,
}

impl BulkFileUploader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().into(),
            fsync_mode: fsync_mode_from_env(),
        }
    }

    pub fn with_fsync(mut self, mode: FsyncMode) -> Self {
        self.fsync_mode = mode;
        self
    }

    /// Пишет батч атомарно: .tmp -> sync -> rename,
    /// рядом кладёт *.xxh3 с checksum содержимого.
    pub async fn write_batch(&self, index: &str, docs: &[Document]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create {}", self.dir.display()))?;

        // предсказуемые имена: <ts>-<rand>.ndjson, сортируются по времени
        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let base = format!("{ts:016}-{}", nanoid::nanoid!());
        let path_tmp = self.dir.join(format!("{base}.ndjson.tmp"));
        let path_fin = self.dir.join(format!("{base}.ndjson"));
        let path_sum = self.dir.join(format!("{base}.xxh3"));

        let body = encode_bulk(index, docs)?;

        let mut f = fs::File::create(&path_tmp).await?;
        f.write_all(body.as_bytes()).await?;
        f.flush().await?;

        if self.fsync_mode != FsyncMode::Disabled {
            f.sync_data().await?;
        }

        // Windows: закрыть дескриптор перед rename
        drop(f);

        fs::rename(&path_tmp, &path_fin).await?;

        let sum = xxh3_64(body.as_bytes());
        let mut sf = fs::File::create(&path_sum).await?;
        sf.write_all(format!("{sum:016x}").as_bytes()).await?;
        sf.flush().await?;

        if self.fsync_mode == FsyncMode::Always {
            sf.sync_data().await?;
            sync_dir(&self.dir).await?;
        }

        tracing::debug!(path = %path_fin.display(), docs = docs.len(), "bulk batch written");
        Ok(path_fin)
    }

    /// Кладёт маппинг индекса рядом с bulk-файлами: <index>.mapping.json
    pub async fn write_mapping(&self, index: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{index}.mapping.json"));
        let body = serde_json::to_vec_pretty(&index_mapping())?;
        fs::write(&path, body).await?;
        Ok(path)
    }

    /// Сверка файла с сайдкаром *.xxh3.
    pub async fn validate_checksum<P: AsRef<Path>>(path: P) -> anyhow::Result<bool> {
        let p = path.as_ref();
        let sum_path = p.with_extension("xxh3");
        let mut rf = fs::File::open(p).await?;
        let mut data = Vec::new();
        rf.read_to_end(&mut data).await?;
        let sum = xxh3_64(&data);
        let want = fs::read_to_string(&sum_path).await?.trim().to_string();
        Ok(format!("{sum:016x}") == want)
    }
}

/// rename и новые имена в каталоге переживают сбой только после sync каталога.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> anyhow::Result<()> {
    let d = fs::File::open(dir)
        .await
        .with_context(|| format!("open dir {}", dir.display()))?;
    d.sync_all().await?;
    Ok(())
}

// Windows: каталог как файл не открыть, полагаемся на sync данных
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[async_trait]
impl BatchUploader for BulkFileUploader {
    async fn upload(&self, index: &str, docs: &[Document]) -> anyhow::Result<()> {
        self.write_batch(index, docs).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::FsyncMode;

    #[test]
    fn fsync_mode_defaults_to_batch() {
        assert_eq!(FsyncMode::parse(Some("always")), FsyncMode::Always);
        assert_eq!(FsyncMode::parse(Some("disabled")), FsyncMode::Disabled);
        assert_eq!(FsyncMode::parse(Some("batch")), FsyncMode::Batch);
        assert_eq!(FsyncMode::parse(Some("weird")), FsyncMode::Batch);
        assert_eq!(FsyncMode::parse(None), FsyncMode::Batch);
    }
}
