use std::collections::HashSet;

use shared::types::{FeedbackItem, Status};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("no board is selected")]
    NoBoardSelected,

    #[error("{column:?} has {len} items, no source position {index}")]
    SourceOutOfRange {
        column: Status,
        index: usize,
        len: usize,
    },

    #[error("{column:?} has {len} items, cannot insert at {index}")]
    DestinationOutOfRange {
        column: Status,
        index: usize,
        len: usize,
    },

    #[error("expected item {expected} at the source position, found {found}")]
    ItemMismatch { expected: i64, found: i64 },
}

/// A drag from one column position to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub item_id: i64,
    pub from: Status,
    pub from_index: usize,
    pub to: Status,
    pub to_index: usize,
}

impl Move {
    /// Dropped exactly where it was picked up.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.from_index == self.to_index
    }
}

/// Kanban projection: one ordered column per status.
///
/// Built only by partitioning a fetched item set, then changed only by
/// `apply_move`, so every item sits in exactly one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardColumns {
    open: Vec<FeedbackItem>,
    in_progress: Vec<FeedbackItem>,
    completed: Vec<FeedbackItem>,
}

impl BoardColumns {
    /// Split by status, keeping server order within each column.
    ///
    /// A page walk can return an item twice when it moves across a page
    /// boundary between requests; only its first occurrence is kept.
    pub fn partition(items: Vec<FeedbackItem>) -> Self {
        let mut columns = Self::default();
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if seen.insert(item.id) {
                columns.column_mut(item.status).push(item);
            } else {
                debug!("Dropping duplicate of item {}", item.id);
            }
        }
        columns
    }

    pub fn column(&self, status: Status) -> &[FeedbackItem] {
        match status {
            Status::Open => &self.open,
            Status::InProgress => &self.in_progress,
            Status::Completed => &self.completed,
        }
    }

    fn column_mut(&mut self, status: Status) -> &mut Vec<FeedbackItem> {
        match status {
            Status::Open => &mut self.open,
            Status::InProgress => &mut self.in_progress,
            Status::Completed => &mut self.completed,
        }
    }

    pub fn ids(&self, status: Status) -> Vec<i64> {
        self.column(status).iter().map(|item| item.id).collect()
    }

    /// Column and index of an item.
    pub fn position(&self, item_id: i64) -> Option<(Status, usize)> {
        Status::ALL.into_iter().find_map(|status| {
            self.column(status)
                .iter()
                .position(|item| item.id == item_id)
                .map(|index| (status, index))
        })
    }

    pub fn find(&self, item_id: i64) -> Option<&FeedbackItem> {
        self.items().find(|item| item.id == item_id)
    }

    /// All items, column by column.
    pub fn items(&self) -> impl Iterator<Item = &FeedbackItem> {
        self.open
            .iter()
            .chain(self.in_progress.iter())
            .chain(self.completed.iter())
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the item from its source slot, set its status, insert it at
    /// the destination. Nothing changes when the move does not fit.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), InvalidMove> {
        let source = self.column(mv.from);
        let Some(found) = source.get(mv.from_index) else {
            return Err(InvalidMove::SourceOutOfRange {
                column: mv.from,
                index: mv.from_index,
                len: source.len(),
            });
        };
        if found.id != mv.item_id {
            return Err(InvalidMove::ItemMismatch {
                expected: mv.item_id,
                found: found.id,
            });
        }

        let dest_len = if mv.from == mv.to {
            source.len() - 1
        } else {
            self.column(mv.to).len()
        };
        if mv.to_index > dest_len {
            return Err(InvalidMove::DestinationOutOfRange {
                column: mv.to,
                index: mv.to_index,
                len: dest_len,
            });
        }

        let mut item = self.column_mut(mv.from).remove(mv.from_index);
        item.status = mv.to;
        self.column_mut(mv.to).insert(mv.to_index, item);
        Ok(())
    }
}
