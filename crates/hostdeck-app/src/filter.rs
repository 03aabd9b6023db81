// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Query;

/// Filter values owned by one browser. `None` means "no filter"; an empty
/// string is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub text_filter: Option<String>,
    /// Text filter last sent to the refresh collaborator.
    pub last_committed_text_filter: Option<String>,
    pub category_filter: Option<String>,
}

pub fn normalize_filter_value(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

impl FilterState {
    /// Records a local text edit. Returns whether the value changed. Never
    /// produces a query: text is only sent on commit.
    pub fn set_text(&mut self, value: &str) -> bool {
        let text = normalize_filter_value(value);
        if self.text_filter == text {
            return false;
        }
        self.text_filter = text;
        true
    }

    /// Commits the pending text filter. Returns the first-page query to
    /// issue, or `None` when nothing changed since the last commit.
    pub fn commit_text(&mut self) -> Option<Query> {
        if self.text_filter == self.last_committed_text_filter {
            return None;
        }
        self.last_committed_text_filter = self.text_filter.clone();
        Some(self.query_at(None))
    }

    /// Applies a category selection. A changed value yields a first-page
    /// query right away.
    pub fn set_category(&mut self, value: &str) -> Option<Query> {
        let category = normalize_filter_value(value);
        if self.category_filter == category {
            return None;
        }
        self.category_filter = category;
        Some(self.query_at(None))
    }

    /// Builds a query from the live filter values. Text edits that were not
    /// committed yet are still carried, like any other navigation.
    pub fn query_at(&self, offset: Option<u64>) -> Query {
        Query {
            offset,
            host: self.text_filter.clone(),
            host_group: self.category_filter.clone(),
        }
    }

    pub fn has_pending_text(&self) -> bool {
        self.text_filter != self.last_committed_text_filter
    }
}
