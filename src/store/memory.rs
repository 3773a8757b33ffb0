use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use super::{Properties, Removal, RemoteStore};
use crate::custom_data::protected;
use crate::erx::{Erx, Fault, ResultE};
use crate::tools::datetime::Now;
use crate::tools::strings::Case;
use crate::tools::url::child_segment;

/// One request received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(String),
    Upsert(String, Properties),
    Delete(String),
}

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Properties>,
    journal: Vec<Call>,
    failing: HashSet<String>,
}

/// In-process remote store with server semantics.
///
/// Documents are created on first fetch or upsert, carry server managed
/// `createdAt` / `modifiedAt` stamps, merge partially on upsert and drop single
/// keys when a per-key reference (`{href}/{key}`) is deleted. Every request is
/// journaled; references registered with [`MemoryStore::fail_on`] answer with a
/// remote failure.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn fresh_document() -> Properties {
    let stamp = Value::String(Now::stamp());
    let mut document = Properties::new();
    document.insert("createdAt".to_string(), stamp.clone());
    document.insert("modifiedAt".to_string(), stamp);
    document
}

fn reply(href: &str, document: &Properties) -> Properties {
    let mut properties = document.clone();
    properties.insert("href".to_string(), Value::String(href.to_string()));
    properties
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// store `properties` as they are, replacing any previous document
    pub async fn seed(&self, href: &str, properties: Properties) {
        self.inner.lock().await.documents.insert(href.to_string(), properties);
    }

    pub async fn document(&self, href: &str) -> Option<Properties> {
        self.inner.lock().await.documents.get(href).cloned()
    }

    pub async fn journal(&self) -> Vec<Call> {
        self.inner.lock().await.journal.clone()
    }

    pub async fn clear_journal(&self) {
        self.inner.lock().await.journal.clear();
    }

    pub async fn fetches(&self) -> usize {
        self.inner.lock().await.journal.iter().filter(|c| matches!(c, Call::Fetch(_))).count()
    }

    pub async fn upserts(&self) -> usize {
        self.inner.lock().await.journal.iter().filter(|c| matches!(c, Call::Upsert(..))).count()
    }

    pub async fn deletes(&self) -> usize {
        self.inner.lock().await.journal.iter().filter(|c| matches!(c, Call::Delete(_))).count()
    }

    /// every later request addressed at `href` fails until `recover`
    pub async fn fail_on(&self, href: &str) {
        self.inner.lock().await.failing.insert(href.to_string());
    }

    pub async fn recover(&self, href: &str) {
        self.inner.lock().await.failing.remove(href);
    }
}

impl Inner {
    fn record(&mut self, call: Call) -> ResultE<()> {
        let href = match &call {
            Call::Fetch(href) | Call::Upsert(href, _) | Call::Delete(href) => href.clone(),
        };
        self.journal.push(call);

        if self.failing.contains(&href) {
            return Err(Erx::with_fault(Fault::RemoteFailure, "injected failure").extra_with("STATUS", "500").extra_with("HREF", &href));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch(&self, href: &str) -> ResultE<Properties> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::Fetch(href.to_string()))?;

        let document = inner.documents.entry(href.to_string()).or_insert_with(fresh_document);
        Ok(reply(href, document))
    }

    async fn upsert(&self, href: &str, properties: &Properties) -> ResultE<Properties> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::Upsert(href.to_string(), properties.clone()))?;

        let document = inner.documents.entry(href.to_string()).or_insert_with(fresh_document);
        for (key, value) in properties {
            if protected::is_readonly(&Case::snake(key)) {
                continue;
            }
            document.insert(key.clone(), value.clone());
        }
        document.insert("modifiedAt".to_string(), Value::String(Now::stamp()));

        Ok(reply(href, document))
    }

    async fn delete(&self, href: &str) -> ResultE<Removal> {
        let mut inner = self.inner.lock().await;
        inner.record(Call::Delete(href.to_string()))?;

        if inner.documents.remove(href).is_some() {
            return Ok(Removal::Deleted);
        }

        for (base, document) in inner.documents.iter_mut() {
            if let Some(key) = child_segment(base, href) {
                return Ok(match document.remove(&key) {
                    Some(_) => Removal::Deleted,
                    None => Removal::NotFound,
                });
            }
        }

        Ok(Removal::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HREF: &str = "https://api.example.com/v1/accounts/a1/customData";

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_creates_stamped_document() {
        let store = MemoryStore::new();
        let fetched = store.fetch(HREF).await.unwrap();
        assert_eq!(fetched.get("href"), Some(&json!(HREF)));
        assert!(fetched.contains_key("createdAt"));
        assert!(fetched.contains_key("modifiedAt"));
        assert_eq!(store.journal().await, vec![Call::Fetch(HREF.to_string())]);
    }

    #[tokio::test]
    async fn test_upsert_merges_and_ignores_server_fields() {
        let store = MemoryStore::new();
        store.seed(HREF, props(json!({"color": "red", "size": "M"}))).await;

        let merged = store.upsert(HREF, &props(json!({"color": "blue", "createdAt": "1999-01-01T00:00:00Z"}))).await.unwrap();
        assert_eq!(merged.get("color"), Some(&json!("blue")));
        assert_eq!(merged.get("size"), Some(&json!("M")));
        assert!(merged.get("createdAt").is_none());
        assert!(merged.contains_key("modifiedAt"));
        assert_eq!(store.upserts().await, 1);
    }

    #[tokio::test]
    async fn test_delete_key_and_document() {
        let store = MemoryStore::new();
        store.seed(HREF, props(json!({"size": "M"}))).await;

        let key = format!("{}/size", HREF);
        assert_eq!(store.delete(&key).await.unwrap(), Removal::Deleted);
        assert_eq!(store.delete(&key).await.unwrap(), Removal::NotFound);
        assert_eq!(store.delete(HREF).await.unwrap(), Removal::Deleted);
        assert_eq!(store.delete(HREF).await.unwrap(), Removal::NotFound);
        assert_eq!(store.deletes().await, 4);
        assert!(store.document(HREF).await.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on(HREF).await;
        let err = store.fetch(HREF).await.unwrap_err();
        assert_eq!(err.fault(), Fault::RemoteFailure);
        assert_eq!(err.extra_val("STATUS").as_deref(), Some("500"));

        store.recover(HREF).await;
        assert!(store.fetch(HREF).await.is_ok());
        assert_eq!(store.fetches().await, 2);
        store.clear_journal().await;
        assert!(store.journal().await.is_empty());
    }
}
