use croaring::Bitmap;
use std::collections::HashMap;

pub type DocId = u32;

/// term -> bitmap(doc) плюс позиционные списки токенов каждого документа.
#[derive(Default)]
pub struct InvertedIndex {
    ext2int: HashMap<String, DocId>,
    terms: HashMap<String, Bitmap>,
    // позиция токена = индекс в векторе
    positions: HashMap<DocId, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_ext_id(&mut self, ext: &str) -> DocId {
        if let Some(&id) = self.ext2int.get(ext) {
            return id;
        }
        let id = self.ext2int.len() as DocId;
        self.ext2int.insert(ext.to_string(), id);
        id
    }

    pub fn doc_count(&self) -> usize {
        self.positions.len()
    }

    /// Проиндексировать токены документа; прежние токены того же doc заменяются.
    pub fn set_tokens(&mut self, doc: DocId, tokens: Vec<String>) {
        self.remove(doc);
        for t in &tokens {
            self.terms.entry(t.clone()).or_insert_with(Bitmap::new).add(doc);
        }
        self.positions.insert(doc, tokens);
    }

    fn remove(&mut self, doc: DocId) {
        let Some(old) = self.positions.remove(&doc) else { return };
        for t in old {
            if let Some(bm) = self.terms.get_mut(&t) {
                bm.remove(doc);
                if bm.is_empty() {
                    self.terms.remove(&t);
                }
            }
        }
    }

    pub fn term(&self, term: &str) -> Bitmap {
        self.terms.get(term).cloned().unwrap_or_else(Bitmap::new)
    }

    /// Объединение по всем термам словаря, прошедшим фильтр.
    pub fn terms_matching(&self, mut pred: impl FnMut(&str) -> bool) -> Bitmap {
        let mut acc = Bitmap::new();
        for (t, bm) in &self.terms {
            if pred(t) {
                acc.or_inplace(bm);
            }
        }
        acc
    }

    /// Документы, где термы идут подряд в заданном порядке.
    pub fn phrase(&self, terms: &[String]) -> Bitmap {
        let Some((first, rest)) = terms.split_first() else {
            return Bitmap::new();
        };
        let mut cand = self.term(first);
        for t in rest {
            if cand.is_empty() {
                break;
            }
            cand.and_inplace(&self.term(t));
        }

        let mut out = Bitmap::new();
        for doc in cand.iter() {
            let hit = self
                .positions
                .get(&doc)
                .is_some_and(|toks| toks.windows(terms.len()).any(|w| w == terms));
            if hit {
                out.add(doc);
            }
        }
        out
    }
}
