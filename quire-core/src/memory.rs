use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::batch::{WriteBatch, WriteOp};
use crate::errors::QuireError;
use crate::store::{DocumentStore, Filter};
use crate::tenant::TenantContext;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-process document store, isolated per tenant.
///
/// Batches are applied in place while the write lock is held. The prior
/// value of every touched record is kept, and a failing operation restores
/// them before the lock is released.
#[derive(Default)]
pub struct MemoryDocumentStore {
    by_tenant: RwLock<HashMap<String, Collections>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tenant_key(ctx: &TenantContext) -> String {
        ctx.tenant_id.0.clone()
    }
}

fn with_id(data: Value, id: &str) -> Result<Value> {
    let Value::Object(mut obj) = data else {
        return Err(QuireError::bad_request("Documents must be JSON objects").into_anyhow());
    };
    obj.insert("id".to_string(), Value::String(id.to_string()));
    Ok(Value::Object(obj))
}

fn not_found(collection: &str, id: &str) -> anyhow::Error {
    QuireError::not_found(format!("No record found in {collection}: {id}")).into_anyhow()
}

/// First-seen values of the records a batch touched; `None` for records
/// that did not exist.
#[derive(Default)]
struct UndoLog {
    saved: Vec<(String, String, Option<Value>)>,
}

impl UndoLog {
    fn record(&mut self, data: &Collections, collection: &str, id: &str) {
        if self.saved.iter().any(|(c, i, _)| c == collection && i == id) {
            return;
        }
        let prior = data.get(collection).and_then(|docs| docs.get(id)).cloned();
        self.saved.push((collection.to_string(), id.to_string(), prior));
    }

    fn rollback(self, data: &mut Collections) {
        for (collection, id, prior) in self.saved.into_iter().rev() {
            let docs = data.entry(collection).or_default();
            match prior {
                Some(doc) => {
                    docs.insert(id, doc);
                }
                None => {
                    docs.remove(&id);
                }
            }
        }
    }
}

fn apply(staged: &mut Collections, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::Create {
            collection,
            id,
            data,
        } => {
            let docs = staged.entry(collection.clone()).or_default();
            if docs.contains_key(&id) {
                return Err(QuireError::conflict(format!(
                    "Record already exists in {collection}: {id}"
                ))
                .into_anyhow());
            }
            let doc = with_id(data, &id)?;
            docs.insert(id, doc);
        }
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            let doc = with_id(data, &id)?;
            staged.entry(collection).or_default().insert(id, doc);
        }
        WriteOp::Patch {
            collection,
            id,
            data,
        } => {
            let existing = staged
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(&id))
                .ok_or_else(|| not_found(&collection, &id))?;
            let Value::Object(patch) = data else {
                return Err(QuireError::bad_request("Patch data must be a JSON object").into_anyhow());
            };
            let record = existing
                .as_object_mut()
                .ok_or_else(|| QuireError::general_error("Stored document is not an object").into_anyhow())?;
            for (k, v) in patch {
                if k == "id" {
                    continue;
                }
                record.insert(k, v);
            }
        }
        WriteOp::Delete {
            collection,
            id,
            must_exist,
        } => {
            let removed = staged
                .get_mut(&collection)
                .and_then(|docs| docs.remove(&id));
            if removed.is_none() && must_exist {
                return Err(not_found(&collection, &id));
            }
        }
        WriteOp::Increment {
            collection,
            id,
            field,
            delta,
        } => {
            let existing = staged
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(&id))
                .ok_or_else(|| not_found(&collection, &id))?;
            let record: &mut Map<String, Value> = existing
                .as_object_mut()
                .ok_or_else(|| QuireError::general_error("Stored document is not an object").into_anyhow())?;
            let current = match record.get(&field) {
                None | Some(Value::Null) => 0,
                Some(v) => v.as_i64().ok_or_else(|| {
                    QuireError::bad_request(format!("Field {field} is not an integer")).into_anyhow()
                })?,
            };
            let next = current.checked_add(delta).ok_or_else(|| {
                QuireError::bad_request(format!("Field {field} would overflow")).into_anyhow()
            })?;
            record.insert(field, Value::from(next));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, ctx: &TenantContext, collection: &str, id: &str) -> Result<Option<Value>> {
        let tenant = Self::tenant_key(ctx);
        let by_tenant = self.by_tenant.read().await;
        Ok(by_tenant
            .get(&tenant)
            .and_then(|c| c.get(collection))
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn find(
        &self,
        ctx: &TenantContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Value>> {
        let tenant = Self::tenant_key(ctx);
        let by_tenant = self.by_tenant.read().await;
        let docs = by_tenant.get(&tenant).and_then(|c| c.get(collection));
        Ok(docs
            .into_iter()
            .flat_map(|m| m.values())
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }

    async fn add(&self, ctx: &TenantContext, collection: &str, data: Value) -> Result<Value> {
        let id = Uuid::new_v4().simple().to_string();
        let doc = with_id(data, &id)?;

        let tenant = Self::tenant_key(ctx);
        let mut by_tenant = self.by_tenant.write().await;
        by_tenant
            .entry(tenant)
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(doc)
    }

    async fn commit(&self, ctx: &TenantContext, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tenant = Self::tenant_key(ctx);
        let mut by_tenant = self.by_tenant.write().await;
        let data = by_tenant.entry(tenant).or_default();
        let mut undo = UndoLog::default();
        for op in batch.into_ops() {
            undo.record(data, op.collection(), op.id());
            if let Err(err) = apply(data, op) {
                undo.rollback(data);
                return Err(err);
            }
        }
        Ok(())
    }
}
