//! Reversible editor actions (Command pattern).
//!
//! Every mutation of the scene graph flows through an [`Action`]: a
//! self-contained unit that captures, at construction or first execution,
//! everything it needs to apply the forward mutation *and* its exact
//! inverse. Actions are handed to the [`ActionManager`], which owns the
//! undo/redo stacks and broadcasts an [`ActionEvent`] to registered
//! listeners after every transition.
//!
//! Concrete actions:
//!
//! - [`PropertiesChangedAction`] — staged property writes with eager
//!   old-value snapshots; the minimal compound and the basis for live-edit
//!   coalescing
//! - [`AddObjectsAction`] / [`DeleteObjectsAction`] — symmetric membership
//!   changes with exact position restoration
//! - [`CloneObjectsAction`] — duplication with collision-free naming and
//!   identity-stable redo
//! - [`ReorderContainerObjectsAction`] — batched list moves with
//!   incremental index maintenance
//! - [`ChangeEntityHierarchyAction`] — batched re-parenting, same index
//!   discipline on child-index space
//! - [`CompoundAction`] — ordered aggregation undone in reverse order

mod clone;
mod compound;
mod hierarchy;
mod manager;
mod objects;
mod properties;
mod queue;
mod reorder;

use std::any::Any;
use std::fmt;

use bitflags::bitflags;
use thiserror::Error;

use crate::scene::Universe;

pub use clone::CloneObjectsAction;
pub use compound::CompoundAction;
pub use hierarchy::ChangeEntityHierarchyAction;
pub use manager::{ActionManager, DEFAULT_MAX_UNDO};
pub use objects::{AddObjectsAction, DeleteObjectsAction};
pub use properties::{FieldAccessor, PropertiesChangedAction, update_transform_action};
pub use queue::ActionQueue;
pub use reorder::ReorderContainerObjectsAction;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Used to downcast
/// `&dyn Action` stack entries to concrete action types — e.g. a property
/// editor amending the uncommitted [`PropertiesChangedAction`] it finds via
/// [`ActionManager::peek_undo_mut`].
pub trait AsAny: 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

bitflags! {
    /// What kind of change an action produced.
    ///
    /// Returned by every [`execute`](Action::execute)/[`undo`](Action::undo)
    /// and OR-combined across compound sub-actions. `empty()` means no
    /// structural event (a plain property edit). Listeners keying caches on
    /// container/hierarchy membership must invalidate them on
    /// [`OBJECT_ADDED_REMOVED`](Self::OBJECT_ADDED_REMOVED).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionEvent: u32 {
        /// Container or hierarchy membership changed.
        const OBJECT_ADDED_REMOVED = 1 << 0;
    }
}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A captured field accessor or array index no longer matches the
    /// target's runtime shape. Surfaced synchronously; partial effects of
    /// the same action are not rolled back automatically.
    #[error("mutation does not match target shape: {0}")]
    Mutation(String),
    /// A captured index/parent/container no longer exists on undo or redo.
    /// A programming invariant violation, not a user-recoverable error:
    /// batch actions log and skip the element rather than corrupt the rest.
    #[error("structural inconsistency: {0}")]
    StructuralInconsistency(String),
}

/// Result type for action operations.
pub type ActionResult<T = ()> = Result<T, ActionError>;

/// A reversible editor action.
///
/// Each implementation holds exactly the captured old/new values and index
/// bookkeeping it needs to be idempotently reversible, independent of how
/// many times `execute`/`undo` are alternated. Actions are stateless with
/// respect to the "current" graph position.
///
/// # Contract
///
/// For any valid starting state `S`, `undo(execute(S)) == S` under
/// structural equality of container membership, parent/child links, and
/// property values. Reference identity is not required for cloned objects —
/// but clones are fixed at first execution and reused across repeated
/// execute/undo cycles within one action instance, so ids captured by later
/// stack entries stay valid.
///
/// # Object safety
///
/// The trait is dyn-compatible so heterogeneous actions share one undo/redo
/// stack as `Box<dyn Action>`.
pub trait Action: fmt::Debug + AsAny + Send {
    /// Applies the forward mutation, returning the change event to
    /// broadcast. Safe to call exactly once per "live" state.
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent>;

    /// Applies the exact inverse mutation.
    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent>;

    /// Short human-readable label for the edit menu / history panel.
    fn description(&self) -> &str;
}

/// Listener for change notifications dispatched by the [`ActionManager`].
///
/// Invoked synchronously after every manager transition except
/// [`clear`](ActionManager::clear). Dispatched events are the only safe
/// signal for background consumers to re-read graph state.
pub trait ActionEventHandler {
    fn on_action_event(&mut self, event: ActionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GenericObject, ObjectData};

    #[derive(Debug)]
    struct Rename {
        entity: crate::scene::EntityId,
        old: String,
        new: String,
    }

    impl Action for Rename {
        fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
            let e = universe.entity_mut(self.entity).ok_or_else(|| {
                ActionError::StructuralInconsistency("entity slot no longer exists".into())
            })?;
            e.set_name(self.new.clone());
            Ok(ActionEvent::empty())
        }

        fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
            let e = universe.entity_mut(self.entity).ok_or_else(|| {
                ActionError::StructuralInconsistency("entity slot no longer exists".into())
            })?;
            e.set_name(self.old.clone());
            Ok(ActionEvent::empty())
        }

        fn description(&self) -> &str {
            "Rename"
        }
    }

    #[test]
    fn action_is_dyn_compatible() {
        let mut universe = Universe::new();
        let id = universe.spawn_entity(None, ObjectData::Generic(GenericObject::new("a")));
        let mut boxed: Box<dyn Action> = Box::new(Rename {
            entity: id,
            old: "a".into(),
            new: "b".into(),
        });
        boxed.execute(&mut universe).unwrap();
        assert_eq!(universe.entity(id).unwrap().name(), "b");
        boxed.undo(&mut universe).unwrap();
        assert_eq!(universe.entity(id).unwrap().name(), "a");
    }

    #[test]
    fn events_combine_bitwise() {
        let combined = ActionEvent::empty() | ActionEvent::OBJECT_ADDED_REMOVED;
        assert!(combined.contains(ActionEvent::OBJECT_ADDED_REMOVED));
        assert!(ActionEvent::empty().is_empty());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ActionError::Mutation("no field `Health`".into()).to_string(),
            "mutation does not match target shape: no field `Health`"
        );
        assert_eq!(
            ActionError::StructuralInconsistency("parent deleted".into()).to_string(),
            "structural inconsistency: parent deleted"
        );
    }

    #[test]
    fn downcast_through_as_any() {
        let action = Rename {
            entity: crate::scene::EntityId::default(),
            old: String::new(),
            new: String::new(),
        };
        let dyn_action: &dyn Action = &action;
        assert!(dyn_action.as_any().downcast_ref::<Rename>().is_some());
    }
}
