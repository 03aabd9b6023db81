// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{NewTaskEvent, Store, insert_event};
use anyhow::{Context, Result};
use hostdeck_app::InstanceId;
use std::collections::BTreeSet;
use std::io::BufRead;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub events: usize,
    pub instances: BTreeSet<InstanceId>,
}

impl Store {
    /// Records one event per non-blank line in a single transaction. A bad
    /// line rolls back the whole file.
    pub fn import_events_jsonl<R: BufRead>(&self, reader: R) -> Result<ImportSummary> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin import transaction")?;
        let mut summary = ImportSummary::default();
        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.with_context(|| format!("read line {line_number}"))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: NewTaskEvent = serde_json::from_str(&line)
                .with_context(|| format!("parse task event on line {line_number}"))?;
            insert_event(&tx, &event)
                .with_context(|| format!("record task event on line {line_number}"))?;
            summary.instances.insert(event.instance_id);
            summary.events += 1;
        }
        tx.commit().context("commit import")?;
        tracing::info!(
            events = summary.events,
            instances = summary.instances.len(),
            "imported task events"
        );
        Ok(summary)
    }
}
