pub mod bulk;
pub mod common;
pub mod doc_id;
pub mod mapping;
pub mod naming;
pub mod transcript;
pub mod window;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use naming::EpisodeKey;
pub use transcript::{parse_transcript, read_transcript_file, Transcript};
pub use window::{WindowConfig, WindowSegmenter};

/// Поле документа с текстом; по нему же строятся запросы.
pub const TEXT_FIELD: &str = "transcript_text";

/// Тайминг одного слова (секунды).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start_time: f64,
    pub end_time: f64,
}

/// Одна реплика от распознавалки: текст + слова.
/// start/end берутся у первого и последнего слова.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub words: Vec<Word>,
    pub start_time: f64,
    pub end_time: f64,
}

impl TranscriptSegment {
    /// Сегмент из одного «слова», покрывающего весь интервал.
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            words: vec![Word { start_time, end_time }],
            start_time,
            end_time,
        }
    }

    pub fn from_words(text: impl Into<String>, words: Vec<Word>) -> anyhow::Result<Self> {
        let (first, last) = match (words.first(), words.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => anyhow::bail!("segment has no words"),
        };
        Ok(Self {
            text: text.into(),
            start_time: first.start_time,
            end_time: last.end_time,
            words,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Индексируемая единица: окно из одного или нескольких сегментов.
/// Сериализуется ровно в формат записи для bulk-загрузки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub show_id: String,
    pub episode_id: String,
    #[serde(rename = "transcript_text")]
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl Document {
    /// id вычисляется сразу и больше не меняется.
    pub fn new(key: &EpisodeKey, start_time: f64, end_time: f64, text: String) -> Self {
        let id = doc_id::document_id(&key.show_id, &key.episode_id, start_time, end_time);
        Self {
            id,
            show_id: key.show_id.clone(),
            episode_id: key.episode_id.clone(),
            text,
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Стратегия нарезки окон. Выбирается конфигом, одна на прогон.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    #[default]
    NoOverlap,
    SlidingOverlap,
    HalfTextOverlap,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::NoOverlap => "no-overlap",
            WindowMode::SlidingOverlap => "sliding-overlap",
            WindowMode::HalfTextOverlap => "half-text-overlap",
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no-overlap" | "none" => Ok(WindowMode::NoOverlap),
            "sliding-overlap" | "sliding" => Ok(WindowMode::SlidingOverlap),
            "half-text-overlap" | "half-text" => Ok(WindowMode::HalfTextOverlap),
            other => Err(format!(
                "unknown window mode `{other}` (expected no-overlap, sliding-overlap or half-text-overlap)"
            )),
        }
    }
}
