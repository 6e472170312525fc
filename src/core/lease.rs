//! Lease and resource records shared by the manager and store adapters.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant identifier. Every lease operation is scoped to exactly one tenant.
pub type TenantId = Uuid;

/// Kind of resource a lease covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseKind {
    /// A worker process able to run tasks.
    Worker,
    /// A logical task queue.
    Queue,
}

impl LeaseKind {
    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "WORKER",
            Self::Queue => "QUEUE",
        }
    }
}

impl fmt::Display for LeaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporary, renewable ownership of one resource by one scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Store-assigned identity, preserved across extensions.
    pub id: i64,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Resource kind.
    pub kind: LeaseKind,
    /// Worker id or queue name.
    pub resource_id: String,
    /// Expiry in milliseconds since the Unix epoch.
    pub expires_at_ms: u128,
}

impl Lease {
    /// Whether the lease is still valid at `now_ms`.
    pub const fn is_valid_at(&self, now_ms: u128) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// Capability label attached to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLabel {
    /// Label key.
    pub key: String,
    /// String value, if the label is string-typed.
    pub str_value: Option<String>,
    /// Integer value, if the label is integer-typed.
    pub int_value: Option<i32>,
}

impl WorkerLabel {
    /// String-valued label.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            str_value: Some(value.into()),
            int_value: None,
        }
    }

    /// Integer-valued label.
    pub fn int(key: impl Into<String>, value: i32) -> Self {
        Self {
            key: key.into(),
            str_value: None,
            int_value: Some(value),
        }
    }
}

/// A worker currently reporting as active, with its labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWorker {
    /// Worker identity.
    pub id: Uuid,
    /// Capability labels, possibly empty.
    pub labels: Vec<WorkerLabel>,
}

impl ActiveWorker {
    /// Worker without labels.
    pub const fn new(id: Uuid) -> Self {
        Self {
            id,
            labels: Vec::new(),
        }
    }

    /// Attach labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<WorkerLabel>) -> Self {
        self.labels = labels;
        self
    }

    /// Identifier under which the worker is leased.
    pub fn resource_id(&self) -> String {
        self.id.to_string()
    }
}

/// A logical queue, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Queue {
    /// Queue name; also the leased resource id.
    pub name: String,
}

impl Queue {
    /// Queue with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
