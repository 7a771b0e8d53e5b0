// path: crates/indexer/tests/helpers.rs
#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use indexer::config::IndexerConfig;

/// JSON распознавалки: по результату на каждую тройку (start, end, text).
pub fn transcript_json(parts: &[(f64, f64, &str)]) -> String {
    let results: Vec<serde_json::Value> = parts
        .iter()
        .map(|(s, e, t)| {
            serde_json::json!({
                "alternatives": [{
                    "transcript": t,
                    "words": [
                        { "startTime": format!("{s}s"), "endTime": format!("{e}s"), "word": t }
                    ]
                }]
            })
        })
        .collect();
    serde_json::json!({ "results": results }).to_string()
}

/// n сегментов по `step` секунд с текстом `<prefix><i>`.
pub fn even_parts(n: usize, step: f64, prefix: &str) -> Vec<(f64, f64, String)> {
    (0..n)
        .map(|i| (i as f64 * step, (i + 1) as f64 * step, format!("{prefix}{i}")))
        .collect()
}

pub fn write_episode(root: &Path, show: &str, ep: &str, parts: &[(f64, f64, String)]) -> PathBuf {
    let borrowed: Vec<(f64, f64, &str)> = parts.iter().map(|(s, e, t)| (*s, *e, t.as_str())).collect();
    write_raw(root, show, ep, &transcript_json(&borrowed))
}

pub fn write_raw(root: &Path, show: &str, ep: &str, body: &str) -> PathBuf {
    let dir = root.join(format!("show_{show}"));
    fs::create_dir_all(&dir).unwrap();
    let p = dir.join(format!("{ep}.json"));
    fs::write(&p, body).unwrap();
    p
}

pub fn test_config(root: &Path, batch_size: usize) -> IndexerConfig {
    IndexerConfig {
        data_dir: root.join("data").to_string_lossy().to_string(),
        bulk_dir: root.join("bulk").to_string_lossy().to_string(),
        batch_size,
        ..IndexerConfig::default()
    }
}
