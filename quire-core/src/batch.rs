//! Atomic write batches.
//!
//! A [`WriteBatch`] is an ordered list of operations that a
//! [`DocumentStore`](crate::store::DocumentStore) applies all-or-nothing.
//! Preconditions (`create` on an existing id, `patch` on a missing one, a
//! required `delete`, `increment` on a missing document) abort the whole
//! batch before anything becomes visible.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert; Conflict if the id is taken.
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    /// Insert or replace.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Shallow merge of top-level fields; NotFound if absent.
    Patch {
        collection: String,
        id: String,
        data: Value,
    },
    Delete {
        collection: String,
        id: String,
        must_exist: bool,
    },
    /// Numeric add on one field. A missing field counts as 0.
    Increment {
        collection: String,
        id: String,
        field: String,
        delta: i64,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::Set { collection, .. }
            | WriteOp::Patch { collection, .. }
            | WriteOp::Delete { collection, .. }
            | WriteOp::Increment { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create { id, .. }
            | WriteOp::Set { id, .. }
            | WriteOp::Patch { id, .. }
            | WriteOp::Delete { id, .. }
            | WriteOp::Increment { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn create(mut self, collection: &str, id: impl Into<String>, data: Value) -> Self {
        self.ops.push(WriteOp::Create {
            collection: collection.to_string(),
            id: id.into(),
            data,
        });
        self
    }

    pub fn set(mut self, collection: &str, id: impl Into<String>, data: Value) -> Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.into(),
            data,
        });
        self
    }

    pub fn patch(mut self, collection: &str, id: impl Into<String>, data: Value) -> Self {
        self.ops.push(WriteOp::Patch {
            collection: collection.to_string(),
            id: id.into(),
            data,
        });
        self
    }

    /// Delete, ignoring a missing document.
    pub fn delete(mut self, collection: &str, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.into(),
            must_exist: false,
        });
        self
    }

    /// Delete, failing the batch with NotFound if the document is absent.
    pub fn delete_existing(mut self, collection: &str, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.into(),
            must_exist: true,
        });
        self
    }

    pub fn increment(
        mut self,
        collection: &str,
        id: impl Into<String>,
        field: &str,
        delta: i64,
    ) -> Self {
        self.ops.push(WriteOp::Increment {
            collection: collection.to_string(),
            id: id.into(),
            field: field.to_string(),
            delta,
        });
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
