// path: crates/indexer/tests/bulk_files.rs
use indexer::ingest::wal::{BulkFileUploader, FsyncMode};
use indexer::ingest::Ingestor;
use podgrep_segment::bulk::decode_bulk;
use podgrep_segment::{Document, EpisodeKey};

mod helpers;
use helpers::{even_parts, test_config, write_episode};

fn docs(n: usize) -> Vec<Document> {
    let key = EpisodeKey::new("demo", "ep1").unwrap();
    (0..n)
        .map(|i| Document::new(&key, i as f64 * 30.0, (i + 1) as f64 * 30.0, format!("window {i}")))
        .collect()
}

fn ndjson_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut v: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("ndjson"))
        .collect();
    v.sort();
    v
}

#[tokio::test]
async fn batch_file_has_sidecar_and_decodes_back() {
    let tmp = tempfile::tempdir().unwrap();
    let up = BulkFileUploader::new(tmp.path()).with_fsync(FsyncMode::Disabled);
    let batch = docs(3);

    let path = up.write_batch("podcast", &batch).await.unwrap();
    assert!(path.exists());
    assert!(path.with_extension("xxh3").exists());
    assert!(!tmp.path().read_dir().unwrap().any(|e| {
        e.unwrap().path().to_string_lossy().ends_with(".tmp")
    }));
    assert!(BulkFileUploader::validate_checksum(&path).await.unwrap());

    let body = std::fs::read_to_string(&path).unwrap();
    assert_eq!(body.lines().count(), 6);
    let decoded = decode_bulk(&body).unwrap();
    assert!(decoded.iter().all(|(index, _)| index == "podcast"));
    let back: Vec<Document> = decoded.into_iter().map(|(_, d)| d).collect();
    assert_eq!(back, batch);
}

#[tokio::test]
async fn corrupted_batch_fails_checksum() {
    let tmp = tempfile::tempdir().unwrap();
    let up = BulkFileUploader::new(tmp.path()).with_fsync(FsyncMode::Always);
    let path = up.write_batch("podcast", &docs(2)).await.unwrap();

    let mut body = std::fs::read_to_string(&path).unwrap();
    body = body.replace("window 1", "window 9");
    std::fs::write(&path, body).unwrap();

    assert!(!BulkFileUploader::validate_checksum(&path).await.unwrap());
}

#[tokio::test]
async fn every_fsync_mode_writes_a_complete_batch() {
    for mode in [FsyncMode::Always, FsyncMode::Batch, FsyncMode::Disabled] {
        let tmp = tempfile::tempdir().unwrap();
        let up = BulkFileUploader::new(tmp.path().join("bulk")).with_fsync(mode);
        let path = up.write_batch("podcast", &docs(2)).await.unwrap();
        assert!(BulkFileUploader::validate_checksum(&path).await.unwrap(), "{mode:?}");
        let sum = std::fs::read_to_string(path.with_extension("xxh3")).unwrap();
        assert_eq!(sum.len(), 16, "{mode:?}");
    }
}

#[tokio::test]
async fn mapping_file_is_written_next_to_batches() {
    let tmp = tempfile::tempdir().unwrap();
    let up = BulkFileUploader::new(tmp.path().join("bulk"));
    let path = up.write_mapping("podcast").await.unwrap();
    assert_eq!(path.file_name().unwrap(), "podcast.mapping.json");

    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(v["properties"]["show_id"]["type"], "keyword");
    assert_eq!(v["properties"]["transcript_text"]["type"], "text");
}

#[tokio::test]
async fn one_file_per_flushed_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    for ep in ["e1", "e2"] {
        write_episode(&data, "s", ep, &even_parts(12, 10.0, "w"));
    }
    let cfg = test_config(tmp.path(), 4);
    let up = BulkFileUploader::new(&cfg.bulk_dir).with_fsync(FsyncMode::Disabled);

    let stats = Ingestor::new(&cfg, up).ingest_dir(&data).await.unwrap();
    assert_eq!(stats.documents, 6);
    assert_eq!(stats.batches, 2);

    let files = ndjson_files(std::path::Path::new(&cfg.bulk_dir));
    assert_eq!(files.len(), 2);
    let mut total = 0;
    for f in &files {
        assert!(BulkFileUploader::validate_checksum(f).await.unwrap());
        total += decode_bulk(&std::fs::read_to_string(f).unwrap()).unwrap().len();
    }
    assert_eq!(total, 6);
}
