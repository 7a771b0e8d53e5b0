// path: crates/indexer/src/config.rs
use anyhow::{anyhow, Result};
use podgrep_segment::window::{DEFAULT_MERGE_THRESHOLD_SECS, DEFAULT_TARGET_SECS};
use podgrep_segment::{WindowConfig, WindowMode};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct IndexerConfig {
    /// корень с каталогами show_<id>/<episode>.json
    pub data_dir: String,
    /// куда складывать bulk-файлы
    pub bulk_dir: String,
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,
    #[serde(default)]
    pub window_mode: WindowMode,
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold_secs: f64,
    /// битый файл: false: падаем, true: пишем ошибку в лог и идём дальше
    #[serde(default)]
    pub skip_bad_files: bool,
}

fn default_index() -> String { "podcast".into() }
fn default_batch_size() -> usize { 500 }
fn default_window_secs() -> f64 { DEFAULT_TARGET_SECS }
fn default_merge_threshold() -> f64 { DEFAULT_MERGE_THRESHOLD_SECS }

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/podcast-transcripts".into(),
            bulk_dir: "bulk".into(),
            index: default_index(),
            batch_size: default_batch_size(),
            window_secs: default_window_secs(),
            window_mode: WindowMode::default(),
            merge_threshold_secs: default_merge_threshold(),
            skip_bad_files: false,
        }
    }
}

impl IndexerConfig {
    /// Читает PG_* из окружения. Кривые числа: дефолт, кривой режим окна: ошибка.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let data_dir = std::env::var("PG_DATA_DIR").unwrap_or(d.data_dir);
        let bulk_dir = std::env::var("PG_BULK_DIR").unwrap_or(d.bulk_dir);
        let index = std::env::var("PG_INDEX").unwrap_or(d.index);
        let batch_size = std::env::var("PG_BATCH_SIZE").ok().and_then(|s| s.parse().ok()).filter(|n: &usize| *n > 0).unwrap_or(d.batch_size);
        let window_secs = std::env::var("PG_WINDOW_SECS").ok().and_then(|s| s.parse().ok()).filter(|v: &f64| *v > 0.0).unwrap_or(d.window_secs);
        let merge_threshold_secs = std::env::var("PG_MERGE_THRESHOLD_SECS").ok().and_then(|s| s.parse().ok()).filter(|v: &f64| *v >= 0.0).unwrap_or(d.merge_threshold_secs);
        let skip_bad_files = matches!(std::env::var("PG_SKIP_BAD_FILES").as_deref(), Ok("1") | Ok("true"));

        let window_mode = match std::env::var("PG_WINDOW_MODE") {
            Ok(s) => s.parse::<WindowMode>().map_err(|e| anyhow!("PG_WINDOW_MODE: {e}"))?,
            Err(_) => d.window_mode,
        };

        Ok(Self { data_dir, bulk_dir, index, batch_size, window_secs, window_mode, merge_threshold_secs, skip_bad_files })
    }

    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            target_secs: self.window_secs,
            mode: self.window_mode,
            merge_threshold_secs: self.merge_threshold_secs,
        }
    }
}
