//! Undo and redo for tag edits.

use anyhow::Result;

use super::TrackStore;
use crate::tags::{TagEdit, write_changes};

/// Undo/redo stacks for tag edits.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo_stack: Vec<TagEdit>,
    redo_stack: Vec<TagEdit>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. Empty edits are ignored; anything else clears redo.
    pub fn push(&mut self, edit: TagEdit) {
        if edit.is_empty() {
            return;
        }
        self.undo_stack.push(edit);
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Restore the old comments of the latest edit.
    ///
    /// On a store error nothing stays restored and the edit remains undoable.
    pub fn undo<S: TrackStore>(&mut self, store: &mut S) -> Result<Option<String>> {
        let Some(edit) = self.undo_stack.pop() else {
            return Ok(None);
        };

        let written = write_changes(
            store,
            &edit.changes,
            |c| c.old_comment.as_str(),
            |c| c.new_comment.as_str(),
        );
        if let Err(e) = written {
            self.undo_stack.push(edit);
            return Err(e.context("Undo: Failed to restore comments"));
        }

        let message = describe("Undo", &edit);
        self.redo_stack.push(edit);
        Ok(Some(message))
    }

    /// Re-apply the latest undone edit.
    pub fn redo<S: TrackStore>(&mut self, store: &mut S) -> Result<Option<String>> {
        let Some(edit) = self.redo_stack.pop() else {
            return Ok(None);
        };

        let written = write_changes(
            store,
            &edit.changes,
            |c| c.new_comment.as_str(),
            |c| c.old_comment.as_str(),
        );
        if let Err(e) = written {
            self.redo_stack.push(edit);
            return Err(e.context("Redo: Failed to reapply comments"));
        }

        let message = describe("Redo", &edit);
        self.undo_stack.push(edit);
        Ok(Some(message))
    }
}

fn describe(verb: &str, edit: &TagEdit) -> String {
    if edit.len() == 1 {
        format!("{} Tag Change", verb)
    } else {
        format!("{} Tag Change ({} tracks)", verb, edit.len())
    }
}
