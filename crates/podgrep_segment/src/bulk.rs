//! Формат bulk-записи (NDJSON, как `_bulk` у Elasticsearch):
//!
//! ```text
//! {"index":{"_index":"podcast","_id":"<sha256>"}}
//! {"id":"<sha256>","show_id":"…","episode_id":"…","transcript_text":"…","start_time":0.0,"end_time":31.2}
//! ```
//!
//! Действие `index` перезаписывает документ с тем же `_id`, так что повторная
//! доставка батча идемпотентна.

use crate::Document;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct BulkAction {
    index: BulkTarget,
}

#[derive(Debug, Serialize, Deserialize)]
struct BulkTarget {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_id")]
    id: String,
}

/// Собрать тело bulk-запроса; порядок документов сохраняется.
pub fn encode_bulk(index: &str, docs: &[Document]) -> Result<String> {
    let mut out = String::new();
    for d in docs {
        let action = BulkAction {
            index: BulkTarget {
                index: index.to_string(),
                id: d.id.clone(),
            },
        };
        out.push_str(&serde_json::to_string(&action)?);
        out.push('\n');
        out.push_str(&serde_json::to_string(d)?);
        out.push('\n');
    }
    Ok(out)
}

/// Разобрать тело обратно: пары (action, record). Возвращает (index, docs).
pub fn decode_bulk(body: &str) -> Result<Vec<(String, Document)>> {
    let mut out = Vec::new();
    let mut lines = body.lines().filter(|l| !l.trim().is_empty()).enumerate();
    while let Some((n, line)) = lines.next() {
        let action: BulkAction =
            serde_json::from_str(line).with_context(|| format!("line {}: bulk action", n + 1))?;
        let (m, rec) = match lines.next() {
            Some(x) => x,
            None => bail!("line {}: action without a record", n + 1),
        };
        let doc: Document =
            serde_json::from_str(rec).with_context(|| format!("line {}: record", m + 1))?;
        if doc.id != action.index.id {
            bail!("line {}: _id `{}` != record id `{}`", m + 1, action.index.id, doc.id);
        }
        out.push((action.index.index, doc));
    }
    Ok(out)
}
