use serde_json::{json, Value};

/// Маппинг индекса под записи `Document`.
/// id-поля: keyword (точное совпадение), текст: анализируемый text.
pub fn index_mapping() -> Value {
    json!({
        "properties": {
            "show_id":         { "type": "keyword" },
            "episode_id":      { "type": "keyword" },
            "transcript_text": { "type": "text", "index": true },
            "start_time":      { "type": "float" },
            "end_time":        { "type": "float" }
        }
    })
}
