//! The set of currently selected entities.
//!
//! Selection is process state for one editing session, not part of the
//! document: it is mutated as a side effect of actions (or direct UI
//! gestures) and is not undo-tracked, except where an action explicitly
//! restores the pre-action selection.
//!
//! Actions never touch this struct directly — they go through the
//! [`Universe`](crate::scene::Universe) selection methods, which keep the
//! visual selection outline and the most-recent-container pointer in sync.

use std::collections::HashSet;

use crate::scene::{ContainerId, EntityId};

/// Selected entities plus the container the user touched last.
///
/// The most-recent-container pointer biases where newly created objects
/// land when the user has several maps loaded.
#[derive(Debug, Default)]
pub struct Selection {
    selected: HashSet<EntityId>,
    most_recent_container: Option<ContainerId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if anything is selected.
    pub fn is_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn is_single_selection(&self) -> bool {
        self.selected.len() == 1
    }

    /// The sole selected entity, if exactly one is selected.
    pub fn get_single_selection(&self) -> Option<EntityId> {
        if self.is_single_selection() {
            self.selected.iter().next().copied()
        } else {
            None
        }
    }

    pub fn get_selection(&self) -> &HashSet<EntityId> {
        &self.selected
    }

    pub fn is_selected(&self, entity: EntityId) -> bool {
        self.selected.contains(&entity)
    }

    pub fn most_recent_container(&self) -> Option<ContainerId> {
        self.most_recent_container
    }

    pub(crate) fn insert(&mut self, entity: EntityId) {
        self.selected.insert(entity);
    }

    pub(crate) fn remove(&mut self, entity: EntityId) -> bool {
        self.selected.remove(&entity)
    }

    pub(crate) fn clear(&mut self) {
        self.selected.clear();
    }

    pub(crate) fn set_most_recent_container(&mut self, container: ContainerId) {
        self.most_recent_container = Some(container);
    }

    pub(crate) fn reset(&mut self) {
        self.selected.clear();
        self.most_recent_container = None;
    }
}
