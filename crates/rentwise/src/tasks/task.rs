use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::message::{Message, MessageKind};
use crate::domain::tenant_scoped;
use crate::tenancy::{CompanyId, EntityKind, OrganizationId, TenantStamp, UserId};

tenant_scoped! {
    Task => EntityKind::Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named counters reported by a handler, e.g. `payments_created = 3`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskSummary {
    counts: BTreeMap<String, u64>,
}

impl TaskSummary {
    pub fn with(mut self, key: &str, count: u64) -> Self {
        self.record(key, count);
        self
    }

    pub fn record(&mut self, key: &str, count: u64) {
        *self.counts.entry(key.to_string()).or_default() += count;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

/// Persisted record of one dispatched message.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: u64,
    pub owner: TenantStamp,
    pub dispatched_by: UserId,
    pub message: Message,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub summary: Option<TaskSummary>,
    pub error: Option<String>,
}

impl Task {
    pub fn pending(dispatched_by: UserId, message: Message) -> Self {
        Self {
            id: 0,
            owner: TenantStamp::default(),
            dispatched_by,
            message,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            summary: None,
            error: None,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    pub(crate) fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self, summary: TaskSummary) {
        self.status = TaskStatus::Completed;
        self.summary = Some(summary);
        self.error = None;
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            task_id: self.id,
            name: self.kind().name(),
            status: self.status,
            organization: self.owner.organization,
            company: self.owner.company,
            message: self.message.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
            summary: self.summary.clone(),
            error: self.error.clone(),
        }
    }
}

/// Task representation exposed over HTTP and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task_id: u64,
    pub name: &'static str,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyId>,
    pub message: Message,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TaskSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
