//! Undo/redo stacks and event dispatch.

use std::collections::VecDeque;
use std::fmt;

use crate::scene::Universe;

use super::{Action, ActionEvent, ActionEventHandler, ActionResult};

/// Default bound on the undo stack depth.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Owns the undo and redo stacks for one document and broadcasts an
/// [`ActionEvent`] to registered handlers after every transition.
///
/// - [`execute_action`](Self::execute_action) pushes onto the undo stack
///   and clears the redo stack; the linear history never forks
/// - [`undo_action`](Self::undo_action) / [`redo_action`](Self::redo_action)
///   move the top entry to the opposite stack
/// - an empty stack makes undo/redo a silent no-op: `Ok(empty())`, no
///   dispatch
/// - the undo stack is bounded; the oldest entry is evicted on overflow
///
/// A failing action is dropped rather than kept on either stack, since its
/// captured state no longer matches the graph.
pub struct ActionManager {
    undo_stack: VecDeque<Box<dyn Action>>,
    redo_stack: Vec<Box<dyn Action>>,
    handlers: Vec<Box<dyn ActionEventHandler>>,
    max_undo: usize,
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionManager {
    pub fn new() -> Self {
        Self::with_max_undo(DEFAULT_MAX_UNDO)
    }

    pub fn with_max_undo(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            handlers: Vec::new(),
            max_undo: max_undo.max(1),
        }
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn ActionEventHandler>) {
        self.handlers.push(handler);
    }

    /// Executes a new action, pushing it onto the undo stack on success.
    pub fn execute_action(
        &mut self,
        mut action: Box<dyn Action>,
        universe: &mut Universe,
    ) -> ActionResult<ActionEvent> {
        let event = action.execute(universe)?;
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(action);
        self.redo_stack.clear();
        self.dispatch(event);
        Ok(event)
    }

    /// Undoes the most recent action. Silent no-op on an empty stack.
    pub fn undo_action(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        let Some(mut action) = self.undo_stack.pop_back() else {
            return Ok(ActionEvent::empty());
        };
        let event = action.undo(universe)?;
        self.redo_stack.push(action);
        self.dispatch(event);
        Ok(event)
    }

    /// Re-executes the most recently undone action. Silent no-op on an
    /// empty stack.
    pub fn redo_action(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        let Some(mut action) = self.redo_stack.pop() else {
            return Ok(ActionEvent::empty());
        };
        let event = action.execute(universe)?;
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(action);
        self.dispatch(event);
        Ok(event)
    }

    /// Drops both stacks without touching the graph and without dispatch.
    /// Used when a document is closed or reloaded from disk.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// The next action undo would revert, without removing it.
    pub fn peek_undo(&self) -> Option<&dyn Action> {
        self.undo_stack.back().map(|a| a.as_ref())
    }

    /// Mutable peek for live-edit coalescing: the caller downcasts via
    /// [`AsAny`](super::AsAny) and amends the uncommitted entry in place.
    pub fn peek_undo_mut(&mut self) -> Option<&mut (dyn Action + 'static)> {
        self.undo_stack.back_mut().map(|a| a.as_mut())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Labels for a history panel, most recent first.
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(|a| a.description()).collect()
    }

    pub fn redo_descriptions(&self) -> Vec<&str> {
        self.redo_stack.iter().rev().map(|a| a.description()).collect()
    }

    fn dispatch(&mut self, event: ActionEvent) {
        for handler in self.handlers.iter_mut() {
            handler.on_action_event(event);
        }
    }
}

impl fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionManager")
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .field("handlers", &self.handlers.len())
            .field("max_undo", &self.max_undo)
            .finish()
    }
}
