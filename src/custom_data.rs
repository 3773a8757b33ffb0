//! Change tracking proxy over a resource's custom data.
//!
//! Custom data is a free form JSON bag hanging under a resource
//! (`{resource}/customData`). [`CustomData`] exposes it as an ordered map that is
//! fetched lazily and written back on [`CustomData::save`]:
//!
//! * reads fetch the whole bag once, on first need;
//! * `set` and `remove` only touch local state, removals of keys the server
//!   holds are queued as per-key references (`{href}/{key}`);
//! * `save` flushes the queued deletes, then upserts the ordinary keys.
//!
//! Server managed fields (`created_at`, `modified_at`, `href`, meta fields) can be
//! read through the attribute surface ([`CustomData::attr`]) but never written.

use chrono::{DateTime, FixedOffset};
use indexmap::{map, IndexMap, IndexSet};
use serde_json::Value;
use std::sync::Arc;

use crate::erx::{Erx, Fault, ResultE};
use crate::resource::{Identity, Resource};
use crate::store::{Properties, Removal, RemoteStore};
use crate::tools::json::Enc;
use crate::tools::url::child;

pub mod field;
pub mod ingest;
pub mod protected;
pub mod state;

pub use field::Field;
use ingest::Slot;
use state::{Materialization, PendingDeletes};

pub struct CustomData<R: Resource = Identity> {
    store: Arc<dyn RemoteStore>,
    resource: R,
    state: Materialization,
    data: IndexMap<String, Field>,
    server: IndexMap<String, Field>,
    // ordinary keys the server is known to hold
    remote: IndexSet<String>,
    deletes: PendingDeletes,
}

fn missing(key: &str) -> Erx {
    Erx::with_fault(Fault::MissingKey, &format!("Custom data has no key '{}'", key)).extra_with("KEY", key)
}

impl<R: Resource> CustomData<R> {
    /// Proxy without any data yet; nothing is fetched until a read needs the bag.
    pub fn new(store: Arc<dyn RemoteStore>, resource: R) -> Self {
        let state = Materialization::initial(resource.is_new());
        CustomData {
            store,
            resource,
            state,
            data: IndexMap::new(),
            server: IndexMap::new(),
            remote: IndexSet::new(),
            deletes: PendingDeletes::default(),
        }
    }

    /// Proxy built from a payload the server already sent, e.g. expanded inside
    /// the owner resource. A payload with more than an `href` counts as loaded.
    pub fn with_properties(store: Arc<dyn RemoteStore>, resource: R, properties: &Properties) -> ResultE<Self> {
        let mut custom_data = Self::new(store, resource);
        custom_data.ingest(properties)?;
        if properties.keys().any(|k| k != "href") {
            custom_data.state.settle();
        }
        Ok(custom_data)
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn href(&self) -> Option<&str> {
        self.resource.href()
    }

    pub fn is_materialized(&self) -> bool {
        self.state.is_materialized()
    }

    /// per-key references the next save will delete, in queue order
    pub fn pending_deletes(&self) -> Vec<String> {
        self.deletes.references()
    }

    /// `{href}/{key}`, only a persisted resource has one
    pub fn key_href(&self, key: &str) -> Option<String> {
        self.resource.href().map(|href| child(href, key))
    }

    fn is_queued(&self, key: &str) -> bool {
        self.key_href(key).is_some_and(|reference| self.deletes.contains(&reference))
    }

    /// Unmaterialized -> Materialized, fetching the bag once.
    async fn materialize(&mut self) -> ResultE<()> {
        if self.state.is_materialized() {
            return Ok(());
        }

        let Some(href) = self.resource.href().map(str::to_string) else {
            self.state.settle();
            return Ok(());
        };

        tracing::debug!(%href, "materializing custom data");
        let properties = self.store.fetch(&href).await?;
        self.ingest(&properties)?;
        self.state.settle();
        Ok(())
    }

    fn ingest(&mut self, properties: &Properties) -> ResultE<()> {
        for slot in ingest::translate(&self.resource, properties)? {
            match slot {
                Slot::Timestamp { key, at } => {
                    self.data.insert(key.clone(), Field::Timestamp(at));
                    self.server.insert(key, Field::Timestamp(at));
                },
                Slot::Server { key, value } => {
                    self.server.insert(key, Field::Json(value));
                },
                Slot::Ordinary { key, value } => {
                    self.remote.insert(key.clone());
                    self.data.entry(key).or_insert(Field::Json(value));
                },
            }
        }
        Ok(())
    }

    /// Value of `key`.
    ///
    /// Keys already held locally, or queued for deletion, are answered without
    /// fetching. Unlike `contains` and the iterators, which always load the bag.
    pub async fn get(&mut self, key: &str) -> ResultE<&Field> {
        if !self.data.contains_key(key) && !self.is_queued(key) {
            self.materialize().await?;
        }

        self.data.get(key).ok_or_else(|| missing(key))
    }

    /// Value of `key`, or `default` when the bag has no such key.
    pub async fn get_or(&mut self, key: &str, default: impl Into<Field>) -> ResultE<Field> {
        match self.get(key).await {
            Ok(field) => Ok(field.clone()),
            Err(e) if e.is(Fault::MissingKey) => Ok(default.into()),
            Err(e) => Err(e),
        }
    }

    /// Set `key` locally, undoing a pending delete of it. Sent on the next save.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ResultE<()> {
        if protected::is_readonly(key) || protected::is_readonly(&self.resource.canonicalize(key)) {
            return Err(Erx::with_fault(Fault::NotWritable, &format!("Custom data property '{}' is not writable", key)).extra_with("KEY", key));
        }

        if protected::is_reserved(key) {
            return Err(Erx::with_fault(
                Fault::InvalidKey,
                &format!("Usage of '{}' at the beginning of key is not allowed", protected::RESERVED_PREFIX),
            )
            .extra_with("KEY", key));
        }

        if let Some(reference) = self.key_href(key) {
            if self.deletes.unqueue(&reference).is_some() {
                tracing::debug!(%reference, "pending delete undone");
            }
        }

        self.data.insert(key.to_string(), Field::Json(value.into()));
        Ok(())
    }

    /// Remove `key` locally and, when the server holds it, queue its deletion.
    pub async fn remove(&mut self, key: &str) -> ResultE<Field> {
        if protected::is_timestamp(key) {
            return Err(Erx::with_fault(Fault::NotDeletable, &format!("Custom data property '{}' is not deletable", key)).extra_with("KEY", key));
        }

        self.materialize().await?;

        for queued in self.deletes.keys() {
            self.data.shift_remove(queued);
        }

        let field = self.data.shift_remove(key).ok_or_else(|| missing(key))?;

        if let Some(reference) = self.key_href(key) {
            if self.remote.contains(key) {
                tracing::debug!(%reference, "delete queued");
                self.deletes.queue(reference, key);
            }
        }

        Ok(field)
    }

    /// Whether the loaded bag holds `key`. Pending deletes are not consulted.
    pub async fn contains(&mut self, key: &str) -> ResultE<bool> {
        self.materialize().await?;
        Ok(self.data.contains_key(key))
    }

    pub async fn keys(&mut self) -> ResultE<map::Keys<'_, String, Field>> {
        self.materialize().await?;
        Ok(self.data.keys())
    }

    pub async fn values(&mut self) -> ResultE<map::Values<'_, String, Field>> {
        self.materialize().await?;
        Ok(self.data.values())
    }

    pub async fn items(&mut self) -> ResultE<map::Iter<'_, String, Field>> {
        self.materialize().await?;
        Ok(self.data.iter())
    }

    /// iterate the keys of the loaded bag
    pub async fn iter(&mut self) -> ResultE<map::Keys<'_, String, Field>> {
        self.keys().await
    }

    /// Upsert payload: every local key except the server stamps.
    pub fn properties(&self) -> Properties {
        self.data.iter().filter(|(key, _)| !protected::is_timestamp(key)).map(|(key, field)| (key.clone(), field.to_json())).collect()
    }

    /// Reconcile with the remote store.
    ///
    /// Queued deletes go first, one request each, a not-found answer counts as
    /// done. The first failing delete stops the save: references already deleted
    /// are dropped from the queue, the rest stay queued and nothing is upserted.
    /// Then, when the bag holds ordinary keys, one upsert carries all of them.
    pub async fn save(&mut self) -> ResultE<()> {
        let payload = self.properties();
        let href = self.resource.href().map(str::to_string);

        if !payload.is_empty() && href.is_none() {
            return Err(Erx::with_fault(Fault::Detached, "Custom data of an unsaved resource is sent with the resource itself"));
        }

        for reference in self.deletes.references() {
            if self.store.delete(&reference).await? == Removal::NotFound {
                tracing::warn!(%reference, "custom data key already gone");
            }

            if let Some(key) = self.deletes.unqueue(&reference) {
                self.remote.shift_remove(&key);
            }
        }

        let Some(href) = href else {
            return Ok(());
        };

        if payload.is_empty() {
            return Ok(());
        }

        tracing::debug!(%href, payload = %Enc::ens(&payload), "upserting custom data");
        let merged = self.store.upsert(&href, &payload).await?;
        self.remote.extend(payload.into_iter().map(|(key, _)| key));
        self.ingest(&merged)
    }

    /// Delete the whole custom data resource. The local bag ends up empty and
    /// unsent changes are dropped.
    pub async fn delete(&mut self) -> ResultE<()> {
        if let Some(href) = self.resource.href().map(str::to_string) {
            tracing::debug!(%href, "deleting custom data");
            if self.store.delete(&href).await? == Removal::NotFound {
                tracing::warn!(%href, "custom data already gone");
            }
        }

        self.data.clear();
        self.remote.clear();
        self.deletes.clear();
        self.state.settle();
        Ok(())
    }

    /// Server managed attribute `name`, exact or external (camelCase) form.
    ///
    /// `href` is answered from the resource identity without loading anything.
    pub async fn attr(&mut self, name: &str) -> ResultE<Option<Field>> {
        let canonical = if protected::is_readonly(name) { name.to_string() } else { self.resource.canonicalize(name) };
        if !protected::is_readonly(&canonical) {
            return Err(Erx::with_fault(Fault::NoAttribute, &format!("CustomData has no attribute '{}'", name)).extra_with("KEY", name));
        }

        if canonical == "href" {
            return Ok(self.href().map(|href| Field::Json(Value::String(href.to_string()))));
        }

        self.materialize().await?;
        Ok(self.server.get(&canonical).cloned())
    }

    pub async fn created_at(&mut self) -> ResultE<Option<DateTime<FixedOffset>>> {
        Ok(self.attr("created_at").await?.and_then(|f| f.as_timestamp().copied()))
    }

    pub async fn modified_at(&mut self) -> ResultE<Option<DateTime<FixedOffset>>> {
        Ok(self.attr("modified_at").await?.and_then(|f| f.as_timestamp().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Call, MemoryStore};
    use serde_json::json;

    const HREF: &str = "https://api.example.com/v1/accounts/a1/customData";

    fn proxy(store: &Arc<MemoryStore>) -> CustomData {
        CustomData::new(store.clone(), Identity::persisted(HREF))
    }

    #[tokio::test]
    async fn test_new_proxy_does_not_fetch() {
        let store = Arc::new(MemoryStore::new());
        let custom_data = proxy(&store);
        assert!(!custom_data.is_materialized());
        assert!(store.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_with_properties_counts_as_loaded() {
        let store = Arc::new(MemoryStore::new());
        let payload = json!({"href": HREF, "createdAt": "2014-09-11T22:36:44.349Z", "color": "red"});
        let mut custom_data = CustomData::with_properties(store.clone(), Identity::persisted(HREF), payload.as_object().unwrap()).unwrap();

        assert!(custom_data.is_materialized());
        assert!(custom_data.contains("color").await.unwrap());
        assert!(custom_data.created_at().await.unwrap().is_some());
        assert_eq!(store.fetches().await, 0);

        let href_only = json!({"href": HREF});
        let custom_data = CustomData::with_properties(store.clone(), Identity::persisted(HREF), href_only.as_object().unwrap()).unwrap();
        assert!(!custom_data.is_materialized());
    }

    #[tokio::test]
    async fn test_ingest_first_write_wins_for_ordinary_keys() {
        let store = Arc::new(MemoryStore::new());
        store.seed(HREF, json!({"color": "blue", "modifiedAt": "2020-01-01T00:00:00.000Z"}).as_object().cloned().unwrap()).await;

        let mut custom_data = proxy(&store);
        custom_data.set("color", "red").unwrap();
        assert!(custom_data.contains("color").await.unwrap());
        assert_eq!(custom_data.get("color").await.unwrap(), &json!("red"));
        assert!(custom_data.get("modified_at").await.unwrap().as_timestamp().is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_stays_unmaterialized() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(HREF).await;

        let mut custom_data = proxy(&store);
        assert_eq!(custom_data.contains("color").await.unwrap_err().fault(), Fault::RemoteFailure);
        assert!(!custom_data.is_materialized());

        store.recover(HREF).await;
        assert!(!custom_data.contains("color").await.unwrap());
        assert_eq!(store.journal().await, vec![Call::Fetch(HREF.to_string()), Call::Fetch(HREF.to_string())]);
    }

    #[tokio::test]
    async fn test_malformed_stamp_leaves_bag_untouched() {
        let store = Arc::new(MemoryStore::new());
        store.seed(HREF, json!({"color": "blue", "createdAt": "soon"}).as_object().cloned().unwrap()).await;

        let mut custom_data = proxy(&store);
        assert_eq!(custom_data.keys().await.unwrap_err().fault(), Fault::Malformed);
        assert!(custom_data.data.is_empty());
        assert!(!custom_data.is_materialized());
    }
}
