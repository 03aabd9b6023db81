// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{InstanceId, ResultRow, RowKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowView {
    pub key: RowKey,
    pub host: String,
    pub host_group: String,
    /// `None` renders as a blank cell.
    pub duration: Option<u64>,
    pub expanded: bool,
}

/// Projects rows in input order. Filtering and ordering belong to the
/// result source.
pub fn project_rows(rows: &[ResultRow], details: &DetailViews) -> Vec<TableRowView> {
    rows.iter()
        .map(|row| {
            let key = row.key();
            let expanded = details.is_open(&key);
            TableRowView {
                key,
                host: row.host.clone(),
                host_group: row.host_group.clone(),
                duration: row.measured_duration(),
                expanded,
            }
        })
        .collect()
}

/// Routing identifiers handed to the detail-view collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetailRequest {
    pub instance_id: InstanceId,
    pub host: String,
    pub host_group: String,
}

impl DetailRequest {
    pub fn for_row(instance_id: &InstanceId, key: &RowKey) -> Self {
        Self {
            instance_id: instance_id.clone(),
            host: key.host.clone(),
            host_group: key.host_group.clone(),
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.host.clone(), self.host_group.clone())
    }
}

/// Per-row expanded flags. Each open row is independent of the others and
/// of the browse state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailViews {
    open: BTreeSet<RowKey>,
}

impl DetailViews {
    pub fn is_open(&self, key: &RowKey) -> bool {
        self.open.contains(key)
    }

    /// Returns `true` when the view was newly opened.
    pub fn open(&mut self, key: RowKey) -> bool {
        self.open.insert(key)
    }

    /// Returns `true` when an open view was closed.
    pub fn close(&mut self, key: &RowKey) -> bool {
        self.open.remove(key)
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&mut self, key: RowKey) -> bool {
        if self.close(&key) {
            false
        } else {
            self.open(key)
        }
    }

    pub fn close_all(&mut self) -> Vec<RowKey> {
        std::mem::take(&mut self.open).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn open_requests(&self, instance_id: &InstanceId) -> Vec<DetailRequest> {
        self.open
            .iter()
            .map(|key| DetailRequest::for_row(instance_id, key))
            .collect()
    }
}
