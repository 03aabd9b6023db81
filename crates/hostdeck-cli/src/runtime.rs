// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use hostdeck_app::{DetailRequest, InstanceId, Query, ResultPage, TaskEvent};
use hostdeck_db::Store;

pub struct DbRuntime<'a> {
    store: &'a Store,
    page_size: u64,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, page_size: u64) -> Self {
        Self { store, page_size }
    }
}

impl hostdeck_tui::AppRuntime for DbRuntime<'_> {
    fn refresh(&mut self, instance_id: &InstanceId, query: &Query) -> Result<ResultPage> {
        tracing::debug!(
            instance = %instance_id,
            offset = ?query.offset,
            host = ?query.host,
            host_group = ?query.host_group,
            "refresh issued"
        );
        self.store.list_hosts(instance_id, query, self.page_size)
    }

    fn load_host_groups(&mut self, instance_id: &InstanceId) -> Result<Vec<String>> {
        self.store.list_host_groups(instance_id)
    }

    fn load_host_tasks(&mut self, request: &DetailRequest) -> Result<Vec<TaskEvent>> {
        let tasks = self.store.list_host_tasks(request)?;
        tracing::debug!(
            host = %request.host,
            host_group = %request.host_group,
            tasks = tasks.len(),
            "detail loaded"
        );
        Ok(tasks)
    }
}
