//! Локальный индекс поверх bulk-файлов: проверить скомпилированный запрос
//! без внешнего поискового backend'а.

pub mod analyzer;
pub mod inverted;
pub mod normalizer;

use crate::query::{wildcard_to_regex, BoolQuery, Clause, CompiledQuery};
use anyhow::{bail, Context};
use croaring::Bitmap;
use inverted::{DocId, InvertedIndex};
use podgrep_segment::bulk::decode_bulk;
use podgrep_segment::common::strings::truncate_chars_with_ellipsis;
use podgrep_segment::{Document, TEXT_FIELD};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub show_id: String,
    pub episode_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub preview: String,
}

#[derive(Default)]
pub struct InMemoryIndex {
    inv: InvertedIndex,
    docs: HashMap<DocId, Document>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Upsert по `id`, как `index`-действие bulk.
    pub fn add(&mut self, doc: Document) {
        let doc_id = self.inv.map_ext_id(&doc.id);
        self.inv.set_tokens(doc_id, analyzer::tokens(&doc.text));
        self.docs.insert(doc_id, doc);
    }

    /// Загрузить один NDJSON-файл; возвращает число записей.
    pub fn load_bulk_file(&mut self, path: &Path) -> anyhow::Result<usize> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let records = decode_bulk(&body).with_context(|| format!("decode {}", path.display()))?;
        let n = records.len();
        for (_, doc) in records {
            self.add(doc);
        }
        Ok(n)
    }

    /// Файл или каталог с `*.ndjson` (в порядке имён, т.е. по времени записи).
    pub fn load_path(&mut self, path: &Path) -> anyhow::Result<usize> {
        if path.is_file() {
            return self.load_bulk_file(path);
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("read dir {}", path.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("ndjson"))
            .collect();
        files.sort();

        let mut n = 0;
        for f in &files {
            n += self.load_bulk_file(f)?;
        }
        tracing::info!(path = %path.display(), files = files.len(), records = n, "bulk files loaded");
        Ok(n)
    }

    pub fn search(&self, q: &CompiledQuery, size: usize) -> anyhow::Result<Vec<Hit>> {
        if q.field != TEXT_FIELD {
            bail!("field `{}` is not indexed (only `{TEXT_FIELD}`)", q.field);
        }
        let matched = self.eval(&q.bool)?;

        let mut out = Vec::new();
        // порядок: по внутреннему doc id, т.е. по порядку загрузки
        for doc_id in matched.iter().take(size) {
            let Some(d) = self.docs.get(&doc_id) else { continue };
            out.push(Hit {
                id: d.id.clone(),
                show_id: d.show_id.clone(),
                episode_id: d.episode_id.clone(),
                start_time: d.start_time,
                end_time: d.end_time,
                preview: truncate_chars_with_ellipsis(&d.text, PREVIEW_CHARS),
            });
        }
        Ok(out)
    }

    fn eval(&self, q: &BoolQuery) -> anyhow::Result<Bitmap> {
        match q {
            BoolQuery::Must(clauses) => {
                let mut it = clauses.iter();
                let Some(first) = it.next() else {
                    return Ok(Bitmap::new());
                };
                let mut acc = self.clause(first)?;
                for c in it {
                    if acc.is_empty() {
                        break;
                    }
                    acc.and_inplace(&self.clause(c)?);
                }
                Ok(acc)
            }
            BoolQuery::Should {
                clauses,
                minimum_should_match,
            } => {
                let need = (*minimum_should_match).max(1);
                let mut counts: HashMap<DocId, usize> = HashMap::new();
                for c in clauses {
                    for doc in self.clause(c)?.iter() {
                        *counts.entry(doc).or_default() += 1;
                    }
                }
                let mut out = Bitmap::new();
                for (doc, n) in counts {
                    if n >= need {
                        out.add(doc);
                    }
                }
                Ok(out)
            }
        }
    }

    fn clause(&self, c: &Clause) -> anyhow::Result<Bitmap> {
        Ok(match c {
            // match: любой из токенов (оператор OR, как у backend'а по умолчанию)
            Clause::Match(text) => {
                let mut acc = Bitmap::new();
                for t in analyzer::tokens(text) {
                    acc.or_inplace(&self.inv.term(&t));
                }
                acc
            }
            Clause::MatchPhrase(text) => self.inv.phrase(&analyzer::tokens(text)),
            Clause::Wildcard(pat) => {
                let re = wildcard_to_regex(&normalizer::normalize(pat))?;
                self.inv.terms_matching(|t| re.is_match(t))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile_query;
    use podgrep_segment::EpisodeKey;

    fn doc(start: f64, text: &str) -> Document {
        let key = EpisodeKey::new("show1", "ep1").unwrap();
        Document::new(&key, start, start + 30.0, text.to_string())
    }

    fn index() -> InMemoryIndex {
        let mut idx = InMemoryIndex::new();
        idx.add(doc(0.0, "The green grass grows tall"));
        idx.add(doc(30.0, "Grass is green again, hello world"));
        idx.add(doc(60.0, "Hello there, helo world"));
        idx
    }

    fn texts(idx: &InMemoryIndex, q: &str) -> Vec<f64> {
        let q = compile_query(q, TEXT_FIELD).unwrap();
        idx.search(&q, 10).unwrap().iter().map(|h| h.start_time).collect()
    }

    #[test]
    fn intersection_requires_every_term() {
        let idx = index();
        assert_eq!(texts(&idx, "green grass"), vec![0.0, 30.0]);
        assert_eq!(texts(&idx, "hello world"), vec![30.0, 60.0]);
        assert!(texts(&idx, "green purple").is_empty());
    }

    #[test]
    fn phrase_respects_order() {
        let idx = index();
        assert_eq!(texts(&idx, "\"green grass\""), vec![0.0]);
        assert_eq!(texts(&idx, "\"GRASS is green\""), vec![30.0]);
    }

    #[test]
    fn wildcard_is_any_clause() {
        let idx = index();
        // hel*o: hello и helo; world: в 30 и 60
        assert_eq!(texts(&idx, "hel*o world"), vec![30.0, 60.0]);
        assert_eq!(texts(&idx, "gr?ss"), vec![0.0, 30.0]);
    }

    #[test]
    fn upsert_by_id_keeps_single_copy() {
        let mut idx = index();
        idx.add(doc(0.0, "completely different"));
        assert_eq!(idx.len(), 3);
        assert_eq!(texts(&idx, "green grass"), vec![30.0]);
    }

    #[test]
    fn other_fields_are_rejected() {
        let idx = index();
        let q = compile_query("x", "show_id").unwrap();
        assert!(idx.search(&q, 10).is_err());
    }

    #[test]
    fn size_limits_hits_and_preview_is_truncated() {
        let mut idx = InMemoryIndex::new();
        let long = "word ".repeat(100);
        for i in 0..5 {
            idx.add(doc(i as f64 * 30.0, &long));
        }
        let q = compile_query("word", TEXT_FIELD).unwrap();
        let hits = idx.search(&q, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(hits[0].preview.ends_with('…'));
    }
}
