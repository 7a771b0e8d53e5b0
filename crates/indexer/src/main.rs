// Файл: crates/indexer/src/main.rs
use std::path::Path;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use indexer::config::IndexerConfig;
use indexer::ingest::wal::BulkFileUploader;
use indexer::ingest::Ingestor;

#[tokio::main]
async fn main() -> Result<()> {
    // .env рядом с бинарём: необязателен
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = IndexerConfig::from_env()?;
    tracing::info!(
        data_dir = %cfg.data_dir,
        bulk_dir = %cfg.bulk_dir,
        index = %cfg.index,
        window_secs = cfg.window_secs,
        mode = %cfg.window_mode,
        batch_size = cfg.batch_size,
        "indexer starting"
    );

    let uploader = BulkFileUploader::new(&cfg.bulk_dir);
    let mapping = uploader.write_mapping(&cfg.index).await?;
    tracing::info!(path = %mapping.display(), "index mapping written");

    let mut ingestor = Ingestor::new(&cfg, uploader);
    let stats = ingestor.ingest_dir(Path::new(&cfg.data_dir)).await?;
    println!("{}", serde_json::json!({
        "ok": true,
        "files": stats.files,
        "files_failed": stats.files_failed,
        "segments_skipped": stats.segments_skipped,
        "documents": stats.documents,
        "batches": stats.batches,
    }));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}
