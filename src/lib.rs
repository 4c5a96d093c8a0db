//! # MapForge Core
//!
//! Transactional scene-editing engine: a reversible action system (undo/redo)
//! over a mutable entity/container scene graph.
//!
//! The crate is built around three pieces:
//!
//! - [`scene`] — the data model: [`scene::Universe`] owns every
//!   [`scene::Entity`] and [`scene::ObjectContainer`] for one editing
//!   session, plus the current [`selection::Selection`].
//! - [`action`] — reversible mutations: the [`action::Action`] contract,
//!   concrete actions (property edits, add/delete/clone, reorder,
//!   re-parenting, compounds), and the [`action::ActionManager`] owning the
//!   undo/redo stacks and change notifications.
//! - [`render`] — the interface boundary to an external render scene:
//!   entities may carry a [`render::VisualProxy`] that actions register and
//!   unregister around structural changes.
//!
//! All mutation is single-threaded and synchronous: an action's effect on
//! the graph is complete and undo-consistent the instant
//! [`execute`](action::Action::execute) returns. Callers construct actions,
//! hand them to [`ActionManager::execute_action`](action::ActionManager::execute_action),
//! and drive undo/redo through the manager — never by mutating the graph
//! directly once a document has history.

pub mod action;
pub mod render;
pub mod scene;
pub mod selection;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
