//! Document store abstraction.
//!
//! Documents are JSON objects grouped in named collections, scoped by
//! tenant. Every document carries its own `id` field.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::batch::WriteBatch;
use crate::tenant::TenantContext;

/// Conjunction of field equality tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `None` when absent.
    async fn get(&self, ctx: &TenantContext, collection: &str, id: &str) -> Result<Option<Value>>;

    async fn find(&self, ctx: &TenantContext, collection: &str, filter: &Filter)
        -> Result<Vec<Value>>;

    /// Insert with a store-assigned id. Returns the stored document.
    async fn add(&self, ctx: &TenantContext, collection: &str, data: Value) -> Result<Value>;

    /// Apply every operation of `batch` or none of them.
    async fn commit(&self, ctx: &TenantContext, batch: WriteBatch) -> Result<()>;

    async fn create(&self, ctx: &TenantContext, collection: &str, id: &str, data: Value) -> Result<()> {
        self.commit(ctx, WriteBatch::new().create(collection, id, data))
            .await
    }

    async fn set(&self, ctx: &TenantContext, collection: &str, id: &str, data: Value) -> Result<()> {
        self.commit(ctx, WriteBatch::new().set(collection, id, data))
            .await
    }

    async fn patch(&self, ctx: &TenantContext, collection: &str, id: &str, data: Value) -> Result<()> {
        self.commit(ctx, WriteBatch::new().patch(collection, id, data))
            .await
    }

    async fn delete(&self, ctx: &TenantContext, collection: &str, id: &str) -> Result<()> {
        self.commit(ctx, WriteBatch::new().delete(collection, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_requires_every_clause() {
        let doc = json!({"userId": "u1", "title": "t"});
        assert!(Filter::all().matches(&doc));
        assert!(Filter::eq("userId", "u1").matches(&doc));
        assert!(!Filter::eq("userId", "u1").and("title", "x").matches(&doc));
        assert!(!Filter::eq("missing", "u1").matches(&doc));
    }
}
