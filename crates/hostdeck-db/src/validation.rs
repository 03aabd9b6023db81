// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::NewTaskEvent;
use anyhow::{Result, bail};

pub const MAX_NAME_LEN: usize = 255;
/// About 49 days.
pub const MAX_EVENT_DURATION_MS: u64 = u32::MAX as u64;

impl NewTaskEvent {
    pub fn validate(&self) -> Result<()> {
        validate_name(
            "instance id",
            self.instance_id.as_str(),
            "pass the instance id of the run",
        )?;
        validate_name(
            "host",
            &self.host,
            "every task event names the host it ran on",
        )?;
        validate_name(
            "host group",
            &self.host_group,
            "use the inventory group the host was targeted through",
        )?;
        if self.task.trim().is_empty() {
            bail!("task name is required -- name the task that produced this event");
        }
        if self.duration_ms > MAX_EVENT_DURATION_MS {
            bail!(
                "duration of task {:?} on {} must be at most {MAX_EVENT_DURATION_MS} ms, got {}",
                self.task,
                self.host,
                self.duration_ms
            );
        }
        Ok(())
    }
}

fn validate_name(field: &str, value: &str, hint: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} is required -- {hint}");
    }
    let len = value.chars().count();
    if len > MAX_NAME_LEN {
        bail!("{field} must be at most {MAX_NAME_LEN} characters, got {len}");
    }
    if value.chars().any(char::is_control) {
        bail!("{field} {value:?} must not contain control characters");
    }
    Ok(())
}
