//! Компиляция свободного текста запроса в bool-запрос для лексического поиска.
//!
//! Стратегии:
//! - `Intersection`: каждый терм обязателен (`must` из `match`);
//! - `Phrase`: ввод в двойных кавычках, один `match_phrase`;
//! - `Wildcard`: хоть один терм содержит `*`/`?`: `should` из `wildcard`/`match`
//!   и `minimum_should_match = 1`.
//!
//! Авто-детект: wildcard важнее фразы, кавычки при разборе термов снимаются.

use anyhow::{bail, Context};
use regex::Regex;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMode {
    #[default]
    Auto,
    Intersection,
    Phrase,
    Wildcard,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Auto => "auto",
            QueryMode::Intersection => "intersection",
            QueryMode::Phrase => "phrase",
            QueryMode::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(QueryMode::Auto),
            "intersection" | "and" => Ok(QueryMode::Intersection),
            "phrase" => Ok(QueryMode::Phrase),
            "wildcard" => Ok(QueryMode::Wildcard),
            other => Err(format!(
                "unknown query mode `{other}` (expected auto, intersection, phrase or wildcard)"
            )),
        }
    }
}

/// Лист bool-запроса.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Match(String),
    MatchPhrase(String),
    Wildcard(String),
}

impl Clause {
    fn to_dsl(&self, field: &str) -> Value {
        match self {
            Clause::Match(t) => json!({ "match": { field: t } }),
            Clause::MatchPhrase(p) => json!({ "match_phrase": { field: p } }),
            Clause::Wildcard(p) => json!({ "wildcard": { field: p } }),
        }
    }
}

/// Ровно одно из: `must` или `should` + `minimum_should_match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolQuery {
    Must(Vec<Clause>),
    Should {
        clauses: Vec<Clause>,
        minimum_should_match: usize,
    },
}

impl BoolQuery {
    pub fn clauses(&self) -> &[Clause] {
        match self {
            BoolQuery::Must(c) => c,
            BoolQuery::Should { clauses, .. } => clauses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub field: String,
    /// Разрешённая стратегия (никогда не `Auto`).
    pub mode: QueryMode,
    pub bool: BoolQuery,
}

impl CompiledQuery {
    /// `{"bool": {...}}` в формате Elasticsearch query DSL.
    pub fn to_dsl(&self) -> Value {
        let f = self.field.as_str();
        let render = |c: &[Clause]| c.iter().map(|c| c.to_dsl(f)).collect::<Vec<_>>();
        match &self.bool {
            BoolQuery::Must(c) => json!({ "bool": { "must": render(c) } }),
            BoolQuery::Should {
                clauses,
                minimum_should_match,
            } => json!({
                "bool": {
                    "should": render(clauses),
                    "minimum_should_match": minimum_should_match
                }
            }),
        }
    }
}

/// Тело поискового запроса: `{"query": …, "size": n}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBody {
    pub query: CompiledQuery,
    pub size: usize,
}

impl SearchBody {
    pub fn new(query: CompiledQuery, size: usize) -> Self {
        Self { query, size }
    }

    pub fn to_json(&self) -> Value {
        json!({ "query": self.query.to_dsl(), "size": self.size })
    }
}

/// Авто-детект стратегии.
pub fn compile_query(input: &str, field: &str) -> anyhow::Result<CompiledQuery> {
    compile_with_mode(input, field, QueryMode::Auto)
}

pub fn compile_with_mode(input: &str, field: &str, mode: QueryMode) -> anyhow::Result<CompiledQuery> {
    let input = input.trim();
    if input.is_empty() {
        bail!("empty query");
    }
    if field.trim().is_empty() {
        bail!("empty search field");
    }

    let mode = match mode {
        QueryMode::Auto => detect_mode(input),
        m => m,
    };

    let bool = match mode {
        QueryMode::Phrase => {
            let phrase = strip_quotes(input).trim();
            if phrase.is_empty() {
                bail!("empty phrase");
            }
            BoolQuery::Must(vec![Clause::MatchPhrase(phrase.to_string())])
        }
        QueryMode::Wildcard => {
            let clauses = terms(input)
                .map(|t| {
                    if is_wildcard(t) {
                        Clause::Wildcard(t.to_string())
                    } else {
                        Clause::Match(t.to_string())
                    }
                })
                .collect();
            BoolQuery::Should {
                clauses: non_empty(clauses)?,
                minimum_should_match: 1,
            }
        }
        QueryMode::Intersection | QueryMode::Auto => {
            let clauses = terms(input).map(|t| Clause::Match(t.to_string())).collect();
            BoolQuery::Must(non_empty(clauses)?)
        }
    };

    let q = CompiledQuery {
        field: field.to_string(),
        mode,
        bool,
    };
    tracing::debug!(mode = %q.mode, clauses = q.bool.clauses().len(), "query compiled");
    Ok(q)
}

fn detect_mode(input: &str) -> QueryMode {
    if is_wildcard(input) {
        QueryMode::Wildcard
    } else if input.len() >= 2 && input.starts_with('"') && input.ends_with('"') {
        QueryMode::Phrase
    } else {
        QueryMode::Intersection
    }
}

fn is_wildcard(s: &str) -> bool {
    s.contains(['*', '?'])
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

/// Термы по пробелам, кавычки по краям сняты, пустые выброшены.
fn terms(input: &str) -> impl Iterator<Item = &str> {
    input
        .split_whitespace()
        .map(strip_quotes)
        .filter(|t| !t.is_empty())
}

fn non_empty(clauses: Vec<Clause>) -> anyhow::Result<Vec<Clause>> {
    if clauses.is_empty() {
        bail!("query has no terms");
    }
    Ok(clauses)
}

/// Glob (`*`, `?`) -> якорный regex для сопоставления с термом целиком.
pub fn wildcard_to_regex(pattern: &str) -> anyhow::Result<Regex> {
    let mut rx = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => rx.push_str(".*"),
            '?' => rx.push('.'),
            c => rx.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    rx.push('$');
    Regex::new(&rx).with_context(|| format!("compile wildcard `{pattern}`"))
}
