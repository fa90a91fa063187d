//! In-process session backed by a plain tag store.
//!
//! Stands in for a real server session in tests, demos, and anywhere a
//! canned tag graph is enough. Filter support covers exactly the subset
//! the convenience layer emits: tag presence, `name == <scalar>`
//! equality, and parenthesized `and` conjunction. Anything richer (range
//! comparisons, `or`, path traversal) is rejected with
//! [`Error::Filter`], which is also how a malformed expression surfaces
//! from a real session.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::debug;

use haystack_types::{Ref, TagValue};

use crate::config::ClientConfig;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::session::HaystackSession;

/// Stored form of an entity: id plus tags, no session handle. Entities
/// are materialized with a handle on the way out of a query.
#[derive(Debug, Clone)]
struct Record {
    id: Ref,
    tags: BTreeMap<String, TagValue>,
}

/// In-memory [`HaystackSession`] implementation.
///
/// Query results come back in insertion order, and every filter string
/// that reaches [`HaystackSession::find_entities`] is appended to a query
/// log so callers can count underlying queries.
pub struct MemorySession {
    config: ClientConfig,
    records: DashMap<String, Record>,
    /// Insertion order of entity ids; DashMap iteration order is not
    /// deterministic and query results must be.
    order: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    this: Weak<MemorySession>,
}

impl MemorySession {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            config,
            records: DashMap::new(),
            order: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    /// Add or replace an entity.
    pub fn insert(&self, id: Ref, tags: BTreeMap<String, TagValue>) {
        let key = id.id.clone();
        if self.records.insert(key.clone(), Record { id, tags }).is_none() {
            self.order.lock().push(key);
        }
    }

    /// Remove an entity. No-op when the id is unknown.
    pub fn remove(&self, id: &str) {
        let key = id.strip_prefix('@').unwrap_or(id);
        if self.records.remove(key).is_some() {
            self.order.lock().retain(|k| k != key);
        }
    }

    /// Every filter string seen by `find_entities`, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    fn handle(&self) -> Arc<dyn HaystackSession> {
        // `self` is only reachable through the Arc created in `new`, so
        // the upgrade cannot fail while this method can be called.
        self.this.upgrade().expect("session dropped")
    }

    fn materialize(&self, record: &Record) -> Entity {
        Entity::new(record.id.clone(), record.tags.clone(), self.handle())
    }
}

#[async_trait]
impl HaystackSession for MemorySession {
    async fn find_entities(&self, filter: &str, limit: Option<usize>) -> Result<Vec<Entity>> {
        self.queries.lock().push(filter.to_string());

        let mut rows = Vec::new();
        let limit = self.config.effective_limit(limit);
        for key in self.order.lock().iter() {
            if let Some(record) = self.records.get(key) {
                if eval_filter(&record.tags, filter)? {
                    rows.push(self.materialize(record.value()));
                    if limit.is_some_and(|cap| rows.len() >= cap) {
                        break;
                    }
                }
            }
        }
        debug!(
            project = %self.config.project,
            filter,
            rows = rows.len(),
            "find_entities"
        );
        Ok(rows)
    }

    async fn get_entity(&self, entity_ref: &Ref) -> Result<Entity> {
        match self.records.get(&entity_ref.id) {
            Some(record) => Ok(self.materialize(record.value())),
            None => Err(Error::NotFound(entity_ref.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter evaluation (conjunction/equality/presence subset)
// ─────────────────────────────────────────────────────────────────────────────

fn eval_filter(tags: &BTreeMap<String, TagValue>, filter: &str) -> Result<bool> {
    let filter = filter.trim();
    if filter.is_empty() {
        return Err(Error::Filter("empty filter expression".to_string()));
    }

    let terms = split_conjunction(filter);
    if terms.len() > 1 {
        for term in terms {
            if !eval_filter(tags, term)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    let term = strip_outer_parens(filter);
    if term != filter {
        return eval_filter(tags, term);
    }

    if let Some((name, rhs)) = term.split_once("==") {
        return eval_equality(tags, name.trim(), rhs.trim());
    }
    if is_tag_name(term) {
        return Ok(tags.contains_key(term));
    }
    Err(Error::Filter(format!("unsupported filter term: {term:?}")))
}

fn eval_equality(tags: &BTreeMap<String, TagValue>, name: &str, rhs: &str) -> Result<bool> {
    if !is_tag_name(name) {
        return Err(Error::Filter(format!("bad tag name in filter: {name:?}")));
    }
    let Some(value) = tags.get(name) else {
        return Ok(false);
    };
    if let Some(id) = rhs.strip_prefix('@') {
        return Ok(value.as_ref_value().is_some_and(|r| r.matches(id)));
    }
    if rhs.starts_with('"') {
        let literal = parse_str_literal(rhs)?;
        return Ok(value.as_str() == Some(literal.as_str()));
    }
    if rhs == "true" || rhs == "false" {
        return Ok(value.as_bool() == Some(rhs == "true"));
    }
    if let Ok(n) = rhs.parse::<f64>() {
        return Ok(value.as_f64() == Some(n));
    }
    Err(Error::Filter(format!("unsupported scalar in filter: {rhs:?}")))
}

/// Split on ` and ` at paren depth zero. Quoted strings are opaque.
fn split_conjunction(filter: &str) -> Vec<&str> {
    let bytes = filter.as_bytes();
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut in_str = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' if !in_str => in_str = true,
            b'"' if bytes.get(i.wrapping_sub(1)) != Some(&b'\\') => in_str = false,
            b'(' if !in_str => depth += 1,
            b')' if !in_str => depth = depth.saturating_sub(1),
            b' ' if !in_str && depth == 0 && filter[i..].starts_with(" and ") => {
                terms.push(filter[start..i].trim());
                i += 5;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    terms.push(filter[start..].trim());
    terms
}

/// Strip one pair of parentheses wrapping the whole term, repeatedly.
fn strip_outer_parens(term: &str) -> &str {
    let mut term = term.trim();
    loop {
        let stripped = term
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .filter(|inner| wraps_whole(inner));
        match stripped {
            Some(inner) => term = inner.trim(),
            None => return term,
        }
    }
}

/// Whether the parens removed around `inner` were a matched pair (depth
/// never goes negative inside).
fn wraps_whole(inner: &str) -> bool {
    let mut depth = 0i32;
    for b in inner.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn is_tag_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_str_literal(text: &str) -> Result<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| Error::Filter(format!("unterminated string in filter: {text:?}")))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('$') => out.push('$'),
            other => {
                return Err(Error::Filter(format!(
                    "unsupported escape in filter string: \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}
