// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::CursorPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
}

/// Disable flags handed to the pagination toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationToolbar {
    pub disable_first: bool,
    pub disable_prev: bool,
    pub disable_next: bool,
}

impl PaginationToolbar {
    pub fn is_disabled(self, nav: PageNav) -> bool {
        match nav {
            PageNav::First => self.disable_first,
            PageNav::Prev => self.disable_prev,
            PageNav::Next => self.disable_next,
        }
    }
}

impl From<CursorPair> for PaginationToolbar {
    fn from(cursors: CursorPair) -> Self {
        // "first" has no cursor of its own: no earlier page means no first.
        Self {
            disable_first: cursors.prev_offset.is_none(),
            disable_prev: cursors.prev_offset.is_none(),
            disable_next: cursors.next_offset.is_none(),
        }
    }
}

impl CursorPair {
    /// Offset to request for `nav`, or `None` when the action is disabled.
    /// Cursor values are passed through as supplied.
    pub fn offset_for(self, nav: PageNav) -> Option<u64> {
        match nav {
            PageNav::First => self.prev_offset.map(|_| 0),
            PageNav::Prev => self.prev_offset,
            PageNav::Next => self.next_offset,
        }
    }
}
