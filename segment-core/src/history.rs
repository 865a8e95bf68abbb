//! Edit history
//!
//! A generic undo/redo log over typed command payloads. The stacks store
//! commands only; applying a popped command (and producing the inverse to
//! push on the opposite stack) is the session's job, so the compiler sees
//! an exhaustive match over every command variant instead of a stringly
//! typed dispatch.

use crate::label::LabelPoint;
use crate::polygon::PolygonSet;

/// One reversible action. Each variant carries exactly the prior state
/// needed to restore or replay it.
#[derive(Clone, Debug)]
pub enum EditCommand {
    /// An erase stroke or erase-routed lasso was committed; holds the
    /// erase and add layers from before the commit.
    Erase { erase: PolygonSet, add: PolygonSet },
    /// An add stroke was committed; holds the erase and add layers from
    /// before the commit.
    Add { erase: PolygonSet, add: PolygonSet },
    /// The base-total layer was replaced (label submission).
    BaseTotalSet { base_total: PolygonSet },
    /// The base-partial layer was replaced (lasso commit).
    BasePartialSet { base_partial: PolygonSet },
    /// A selection deletion touched up to four layers at once.
    SelectDelete {
        base_total: PolygonSet,
        base_partial: PolygonSet,
        erase: PolygonSet,
        add: PolygonSet,
    },
    /// A label point was added.
    LabelAdd { point: LabelPoint },
    /// A label point was removed by a proximity click.
    LabelRemove { point: LabelPoint },
}

/// Discriminant of a command, reported back from undo/redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Erase,
    Add,
    BaseTotalSet,
    BasePartialSet,
    SelectDelete,
    LabelAdd,
    LabelRemove,
}

impl EditCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            EditCommand::Erase { .. } => CommandKind::Erase,
            EditCommand::Add { .. } => CommandKind::Add,
            EditCommand::BaseTotalSet { .. } => CommandKind::BaseTotalSet,
            EditCommand::BasePartialSet { .. } => CommandKind::BasePartialSet,
            EditCommand::SelectDelete { .. } => CommandKind::SelectDelete,
            EditCommand::LabelAdd { .. } => CommandKind::LabelAdd,
            EditCommand::LabelRemove { .. } => CommandKind::LabelRemove,
        }
    }
}

/// Undo/redo stacks over an arbitrary command type.
pub struct EditHistory<C> {
    undo_stack: Vec<C>,
    redo_stack: Vec<C>,
    max_depth: usize,
}

impl<C> Default for EditHistory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EditHistory<C> {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: 100,
        }
    }

    /// Record a new command. Clears the redo stack since a fresh edit
    /// starts a new timeline branch.
    pub fn save(&mut self, command: C) {
        self.redo_stack.clear();
        self.push_undo(command);
    }

    /// Record a command without touching the redo stack. Used only when a
    /// redo re-saves its own inverse.
    pub fn save_preserving_redo(&mut self, command: C) {
        self.push_undo(command);
    }

    fn push_undo(&mut self, command: C) {
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Queue a redo entry produced while applying an undo.
    pub fn queue_redo(&mut self, command: C) {
        self.redo_stack.push(command);
    }

    pub fn pop_undo(&mut self) -> Option<C> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<C> {
        self.redo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
        if self.undo_stack.len() > depth {
            let excess = self.undo_stack.len() - depth;
            self.undo_stack.drain(0..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_clears_redo() {
        let mut history: EditHistory<u32> = EditHistory::new();
        history.save(1);
        history.save(2);

        let popped = history.pop_undo().unwrap();
        history.queue_redo(popped);
        assert!(history.can_redo());

        history.save(3);
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_save_preserving_redo() {
        let mut history: EditHistory<u32> = EditHistory::new();
        history.save(1);
        let popped = history.pop_undo().unwrap();
        history.queue_redo(popped);

        history.save_preserving_redo(1);
        assert!(history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history: EditHistory<u32> = EditHistory::new();
        assert!(history.pop_undo().is_none());
        assert!(history.pop_redo().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_depth_drops_oldest() {
        let mut history: EditHistory<u32> = EditHistory::new();
        history.set_max_depth(2);
        history.save(1);
        history.save(2);
        history.save(3);
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.pop_undo(), Some(3));
        assert_eq!(history.pop_undo(), Some(2));
        assert!(history.pop_undo().is_none());
    }

    #[test]
    fn test_clear() {
        let mut history: EditHistory<u32> = EditHistory::new();
        history.save(1);
        history.queue_redo(2);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_command_kinds() {
        let command = EditCommand::BaseTotalSet {
            base_total: PolygonSet::empty(),
        };
        assert_eq!(command.kind(), CommandKind::BaseTotalSet);
    }
}
