// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CursorPair, DetailRequest, DetailViews, FilterState, InstanceId, PageNav, PaginationToolbar,
    Query, ResultPage, ResultRow, RowKey, TableRowView, project_rows,
};

/// Inputs supplied from outside: the instance being browsed plus whatever
/// the refresh collaborator last delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProps {
    pub instance_id: InstanceId,
    pub rows: Vec<ResultRow>,
    pub host_groups: Vec<String>,
    pub cursors: CursorPair,
}

impl BrowserProps {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            rows: Vec::new(),
            host_groups: Vec::new(),
            cursors: CursorPair::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserState {
    pub props: BrowserProps,
    pub filters: FilterState,
    pub details: DetailViews,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    TextChanged(String),
    TextCommitted,
    CategoryChanged(String),
    NextPage,
    PrevPage,
    FirstPage,
    ToggleDetail(RowKey),
    CloseAllDetails,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    TextFilterChanged(Option<String>),
    TextFilterCommitted(Option<String>),
    CategoryFilterChanged(Option<String>),
    RefreshRequested(Query),
    DetailOpened(DetailRequest),
    DetailClosed(RowKey),
    StatusUpdated(String),
    StatusCleared,
}

impl BrowserState {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            props: BrowserProps::new(instance_id),
            filters: FilterState::default(),
            details: DetailViews::default(),
            status_line: None,
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.props.instance_id
    }

    pub fn dispatch(&mut self, command: BrowserCommand) -> Vec<BrowserEvent> {
        match command {
            BrowserCommand::TextChanged(value) => {
                if self.filters.set_text(&value) {
                    vec![BrowserEvent::TextFilterChanged(
                        self.filters.text_filter.clone(),
                    )]
                } else {
                    Vec::new()
                }
            }
            BrowserCommand::TextCommitted => match self.filters.commit_text() {
                Some(query) => vec![
                    BrowserEvent::TextFilterCommitted(self.filters.text_filter.clone()),
                    BrowserEvent::RefreshRequested(query),
                ],
                None => Vec::new(),
            },
            BrowserCommand::CategoryChanged(value) => match self.filters.set_category(&value) {
                Some(query) => vec![
                    BrowserEvent::CategoryFilterChanged(self.filters.category_filter.clone()),
                    BrowserEvent::RefreshRequested(query),
                ],
                None => Vec::new(),
            },
            BrowserCommand::NextPage => self.navigate(PageNav::Next),
            BrowserCommand::PrevPage => self.navigate(PageNav::Prev),
            BrowserCommand::FirstPage => self.navigate(PageNav::First),
            BrowserCommand::ToggleDetail(key) => {
                if self.details.toggle(key.clone()) {
                    vec![BrowserEvent::DetailOpened(DetailRequest::for_row(
                        &self.props.instance_id,
                        &key,
                    ))]
                } else {
                    vec![BrowserEvent::DetailClosed(key)]
                }
            }
            BrowserCommand::CloseAllDetails => self
                .details
                .close_all()
                .into_iter()
                .map(BrowserEvent::DetailClosed)
                .collect(),
            BrowserCommand::SetStatus(message) => vec![self.set_status(message)],
            BrowserCommand::ClearStatus => {
                self.status_line = None;
                vec![BrowserEvent::StatusCleared]
            }
        }
    }

    /// Takes a page delivered by the refresh collaborator.
    pub fn apply_page(&mut self, page: ResultPage) {
        self.props.rows = page.rows;
        self.props.cursors = page.cursors;
    }

    pub fn set_host_groups(&mut self, host_groups: Vec<String>) {
        self.props.host_groups = host_groups;
    }

    pub fn toolbar(&self) -> PaginationToolbar {
        PaginationToolbar::from(self.props.cursors)
    }

    pub fn table_rows(&self) -> Vec<TableRowView> {
        project_rows(&self.props.rows, &self.details)
    }

    pub fn has_pending_text(&self) -> bool {
        self.filters.has_pending_text()
    }

    fn navigate(&mut self, nav: PageNav) -> Vec<BrowserEvent> {
        match self.props.cursors.offset_for(nav) {
            Some(offset) => vec![BrowserEvent::RefreshRequested(
                self.filters.query_at(Some(offset)),
            )],
            None => Vec::new(),
        }
    }

    fn set_status(&mut self, message: String) -> BrowserEvent {
        self.status_line = Some(message.clone());
        BrowserEvent::StatusUpdated(message)
    }
}
