// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ok,
    Changed,
    Skipped,
    Failed,
    Unreachable,
}

impl TaskStatus {
    pub const ALL: [Self; 5] = [
        Self::Ok,
        Self::Changed,
        Self::Skipped,
        Self::Failed,
        Self::Unreachable,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Changed => "changed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Unreachable => "unreachable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(Self::Ok),
            "changed" => Some(Self::Changed),
            "skipped" => Some(Self::Skipped),
            "failed" => Some(Self::Failed),
            "unreachable" => Some(Self::Unreachable),
            _ => None,
        }
    }
}

/// One host of one host group, as returned by the result source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub host: String,
    pub host_group: String,
    /// Zero means the host has not been measured yet.
    pub duration_millis: u64,
}

impl ResultRow {
    pub fn new(host: impl Into<String>, host_group: impl Into<String>, duration_millis: u64) -> Self {
        Self {
            host: host.into(),
            host_group: host_group.into(),
            duration_millis,
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.host.clone(), self.host_group.clone())
    }

    pub fn measured_duration(&self) -> Option<u64> {
        (self.duration_millis != 0).then_some(self.duration_millis)
    }
}

/// Request handed to the refresh collaborator. `offset: None` asks for the
/// first page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub offset: Option<u64>,
    pub host: Option<String>,
    pub host_group: Option<String>,
}

impl Query {
    pub fn first_page() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPair {
    pub prev_offset: Option<u64>,
    pub next_offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub rows: Vec<ResultRow>,
    pub cursors: CursorPair,
}

/// One task execution on one host, shown in the per-host detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub seq: TaskEventSeq,
    pub host: String,
    pub host_group: String,
    pub task: String,
    pub status: TaskStatus,
    pub duration_millis: u64,
    pub created_at: OffsetDateTime,
    pub message: Option<String>,
}
