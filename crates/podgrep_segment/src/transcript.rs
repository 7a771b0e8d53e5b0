// Файл: crates/podgrep_segment/src/transcript.rs
use crate::{TranscriptSegment, Word};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Суффикс единиц во временах распознавалки: "12.300s".
const TIME_SUFFIX: char = 's';

// --- сырой формат файла (speech-to-text JSON) ---
#[derive(Debug, Deserialize)]
struct RawTranscript {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    alternatives: Vec<RawAlternative>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAlternative {
    transcript: Option<String>,
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    start_time: String,
    end_time: String,
}

/// Транскрипт одного эпизода в хронологическом порядке.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    /// results без текста (пропущены молча)
    pub skipped: usize,
}

/// Разобрать файл транскрипта. Битые времена: ошибка на весь файл.
pub fn read_transcript_file(path: &Path) -> Result<Transcript> {
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    parse_transcript(&data).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_transcript(data: &[u8]) -> Result<Transcript> {
    let raw: RawTranscript = serde_json::from_slice(data).context("transcript json")?;

    let mut out = Transcript::default();
    for (i, res) in raw.results.into_iter().enumerate() {
        // берём первую (выбранную) альтернативу
        let alt = match res.alternatives.into_iter().next() {
            Some(a) => a,
            None => {
                out.skipped += 1;
                continue;
            }
        };
        let text = match alt.transcript {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                out.skipped += 1;
                continue;
            }
        };

        let mut words = Vec::with_capacity(alt.words.len());
        for w in &alt.words {
            words.push(Word {
                start_time: parse_time(&w.start_time)
                    .with_context(|| format!("result {i}: startTime"))?,
                end_time: parse_time(&w.end_time)
                    .with_context(|| format!("result {i}: endTime"))?,
            });
        }
        let seg = TranscriptSegment::from_words(text.trim(), words)
            .with_context(|| format!("result {i}"))?;
        out.segments.push(seg);
    }
    tracing::debug!(
        segments = out.segments.len(),
        skipped = out.skipped,
        "transcript parsed"
    );
    Ok(out)
}

/// "12.300s" -> 12.3. Без суффикса или не число: ошибка.
pub fn parse_time(s: &str) -> Result<f64> {
    let num = match s.trim().strip_suffix(TIME_SUFFIX) {
        Some(n) => n,
        None => bail!("time `{s}` lacks the `{TIME_SUFFIX}` suffix"),
    };
    let v: f64 = num
        .parse()
        .with_context(|| format!("time `{s}` is not a number"))?;
    if !v.is_finite() || v < 0.0 {
        bail!("time `{s}` is out of range");
    }
    Ok(v)
}
