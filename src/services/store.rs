use std::{cmp::Ordering, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gte,
    Lt,
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    fn matches(&self, doc: &Value) -> bool {
        let actual = lookup(doc, &self.field);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::Ne => actual != Some(&self.value),
            FilterOp::Gte => actual
                .and_then(|a| compare_values(a, &self.value))
                .is_some_and(|ord| ord != Ordering::Less),
            FilterOp::Lt => actual
                .and_then(|a| compare_values(a, &self.value))
                .is_some_and(|ord| ord == Ordering::Less),
            FilterOp::ContainsIgnoreCase => match (actual, &self.value) {
                (Some(Value::String(haystack)), Value::String(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
        }
    }
}

/// Conjunction of `(field, operator, value)` conditions. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    keys: Vec<(String, SortOrder)>,
}

impl Sort {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(mut self, field: &str) -> Self {
        self.keys.push((field.to_string(), SortOrder::Ascending));
        self
    }

    pub fn desc(mut self, field: &str) -> Self {
        self.keys.push((field.to_string(), SortOrder::Descending));
        self
    }

    /// Stable sort: documents with equal keys keep their incoming order.
    pub fn apply(&self, docs: &mut [Value]) {
        if self.keys.is_empty() {
            return;
        }
        docs.sort_by(|a, b| {
            for (field, order) in &self.keys {
                let ord = match (lookup(a, field), lookup(b, field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                let ord = match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }
}

/// Resolves a dotted path such as `from.place`.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}

/// Timestamps compare chronologically, numbers numerically, text lexically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Persistence contract for JSON documents keyed by a store-assigned `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, record: Value) -> StoreResult<Value>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Value>>;

    async fn find_many(&self, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Value>>;

    /// Replaces the whole document. Returns `None` when no document has that id.
    async fn update_by_id(&self, id: &str, record: Value) -> StoreResult<Option<Value>>;

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64>;
}

pub fn assign_id(mut record: Value) -> StoreResult<(String, Value)> {
    let id = Uuid::new_v4().to_string();
    let object = record
        .as_object_mut()
        .ok_or_else(|| StoreError::Corrupt("record is not a JSON object".into()))?;
    object.insert("id".into(), Value::String(id.clone()));
    Ok((id, record))
}

pub fn with_id(mut record: Value, id: &str) -> StoreResult<Value> {
    let object = record
        .as_object_mut()
        .ok_or_else(|| StoreError::Corrupt("record is not a JSON object".into()))?;
    object.insert("id".into(), Value::String(id.to_string()));
    Ok(record)
}

/// In-process store keeping documents in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_of(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, record: Value) -> StoreResult<Value> {
        let (_, record) = assign_id(record)?;
        self.docs.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Value>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|doc| id_of(doc) == Some(id)).cloned())
    }

    async fn find_many(&self, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Value>> {
        let mut found: Vec<Value> = self
            .docs
            .read()
            .await
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        sort.apply(&mut found);
        Ok(found)
    }

    async fn update_by_id(&self, id: &str, record: Value) -> StoreResult<Option<Value>> {
        let record = with_id(record, id)?;
        let mut docs = self.docs.write().await;
        let Some(slot) = docs.iter_mut().find(|doc| id_of(doc) == Some(id)) else {
            return Ok(None);
        };
        *slot = record.clone();
        Ok(Some(record))
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }
}
