//! Object containers.
//!
//! A container is a named, ordered collection of entities — one loaded map,
//! typically. The membership list is the canonical ownership of its
//! entities, and its order is semantically meaningful: it is the render and
//! serialization order. The root entity anchors the parent/child tree but
//! is not itself a member of the list.

use super::entity::EntityId;

/// A named ordered scope of entities with a dirty flag.
///
/// The dirty flag is document state, not an undo-tracked field: any
/// structural or property mutation sets it, and undoing the mutation does
/// not clear it.
#[derive(Debug)]
pub struct ObjectContainer {
    name: String,
    pub(crate) objects: Vec<EntityId>,
    root: EntityId,
    dirty: bool,
}

impl ObjectContainer {
    pub(crate) fn new(name: impl Into<String>, root: EntityId) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            root,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered membership list. Mutated only through
    /// [`Universe`](super::Universe) graph operations.
    pub fn objects(&self) -> &[EntityId] {
        &self.objects
    }

    /// The root entity anchoring this container's hierarchy.
    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.objects.iter().position(|&e| e == entity)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called by the save path after a successful write.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
