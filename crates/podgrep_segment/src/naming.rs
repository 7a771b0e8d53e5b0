//! Соглашение об именах входных файлов.
//!
//! `<...>/show_<show_id>/<episode_id>.json`
//!
//! - каталог эпизода обязан содержать маркер `show_`; show_id: всё после
//!   последнего вхождения маркера;
//! - episode_id: имя файла без расширения `.json`;
//! - оба id: `[A-Za-z0-9][A-Za-z0-9_.-]*`.
//!
//! Файлы, не подходящие под соглашение, отвергаются с ошибкой.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub const SHOW_MARKER: &str = "show_";
pub const TRANSCRIPT_EXT: &str = "json";

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("static regex"));

/// Идентичность эпизода, из которой строятся id документов.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeKey {
    pub show_id: String,
    pub episode_id: String,
}

impl EpisodeKey {
    pub fn new(show_id: &str, episode_id: &str) -> Result<Self> {
        validate_id("show_id", show_id)?;
        validate_id("episode_id", episode_id)?;
        Ok(Self {
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        })
    }

    /// Вывести ключ из пути к файлу транскрипта.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str());
        if ext != Some(TRANSCRIPT_EXT) {
            bail!("{}: expected a .{TRANSCRIPT_EXT} transcript file", path.display());
        }
        let episode_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("{}: file name is not valid UTF-8", path.display()))?;

        let dir = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .with_context(|| format!("{}: no parent show directory", path.display()))?;
        let show_id = match dir.rsplit_once(SHOW_MARKER) {
            Some((_, id)) => id,
            None => bail!(
                "{}: directory `{dir}` lacks the `{SHOW_MARKER}` marker",
                path.display()
            ),
        };

        Self::new(show_id, episode_id).with_context(|| format!("{}", path.display()))
    }
}

fn validate_id(what: &str, v: &str) -> Result<()> {
    if !ID_RE.is_match(v) {
        bail!("invalid {what} `{v}`");
    }
    Ok(())
}

/// Подходит ли файл под соглашение по расширению (для обхода каталогов).
pub fn is_transcript_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TRANSCRIPT_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn derives_ids_from_path() {
        let p = PathBuf::from("data/podcast-transcripts/0/A/show_0AbC12/7DoBtO4LG.json");
        let k = EpisodeKey::from_path(&p).unwrap();
        assert_eq!(k.show_id, "0AbC12");
        assert_eq!(k.episode_id, "7DoBtO4LG");
    }

    #[test]
    fn marker_may_have_prefix() {
        let p = PathBuf::from("x/archived_show_xyz/ep.json");
        assert_eq!(EpisodeKey::from_path(&p).unwrap().show_id, "xyz");
    }

    #[test]
    fn rejects_missing_marker() {
        let p = PathBuf::from("data/shows/abc/ep.json");
        let err = EpisodeKey::from_path(&p).unwrap_err().to_string();
        assert!(err.contains("show_"), "{err}");
    }

    #[test]
    fn rejects_empty_show_id_and_bad_ext() {
        assert!(EpisodeKey::from_path(Path::new("show_/ep.json")).is_err());
        assert!(EpisodeKey::from_path(Path::new("show_a/ep.txt")).is_err());
        assert!(EpisodeKey::from_path(Path::new("show_a/bad id.json")).is_err());
    }
}
