use sha2::{Digest, Sha256};

/// Content-addressed id окна: sha256 от `show_episode_start_end`, hex.
///
/// Текст в хэш не входит: id называет слот (эпизод + границы), а не
/// содержимое, поэтому повторный прогон даёт те же id и backend делает upsert.
/// Времена форматируются через `{:?}` (`2.0`, а не `2`), чтобы строка была
/// однозначной.
pub fn document_id(show_id: &str, episode_id: &str, start_time: f64, end_time: f64) -> String {
    let mut h = Sha256::new();
    h.update(format!("{show_id}_{episode_id}_{start_time:?}_{end_time:?}").as_bytes());
    format!("{:x}", h.finalize())
}
