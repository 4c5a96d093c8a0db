//! The editing session's object graph.
//!
//! [`Universe`] owns every entity and container of one open document, plus
//! its [`Selection`]. It is the single mutation surface for graph linkage:
//! container membership and parent/child links are only ever changed
//! through the methods here, inside the same transaction, so the two
//! relations cannot drift apart.
//!
//! Entity slots are never freed while a session is live. Delete actions
//! *detach* entities (container list + parent link) without freeing the
//! slot, so ids captured by actions on the undo/redo stacks stay valid and
//! an undone delete restores the identical entity. Slots are reclaimed only
//! by [`Universe::clear`] or [`Universe::unload_container`], after the
//! action history has been cleared.

use nalgebra::Matrix4;
use slotmap::SlotMap;

use super::container::ObjectContainer;
use super::data::{GenericObject, ObjectData, PropertyValue};
use super::entity::{ContainerId, Entity, EntityId};
use crate::action::{ActionError, ActionResult};
use crate::selection::Selection;

/// Owner of the entity arena, the container table, and the selection.
///
/// One `Universe` per open document; multiple documents are simply multiple
/// universes, each paired with its own
/// [`ActionManager`](crate::action::ActionManager).
#[derive(Debug, Default)]
pub struct Universe {
    entities: SlotMap<EntityId, Entity>,
    containers: SlotMap<ContainerId, ObjectContainer>,
    selection: Selection,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    // --- containers ---

    /// Creates an empty container with a root entity anchoring its tree.
    pub fn create_container(&mut self, name: &str) -> ContainerId {
        let root = self
            .entities
            .insert(Entity::new(ObjectData::Generic(GenericObject::new(name)), None));
        let container = self.containers.insert(ObjectContainer::new(name, root));
        self.entities[root].container = Some(container);
        container
    }

    /// Unloads a container, freeing it and every entity filed under it.
    ///
    /// The caller must clear the action history first; stack entries
    /// referencing freed slots would be structural inconsistencies.
    pub fn unload_container(&mut self, container: ContainerId) {
        self.entities.retain(|_, e| {
            if e.container == Some(container) {
                if let Some(proxy) = e.proxy_mut() {
                    proxy.dispose();
                }
                false
            } else {
                true
            }
        });
        self.containers.remove(container);
    }

    pub fn container(&self, id: ContainerId) -> Option<&ObjectContainer> {
        self.containers.get(id)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut ObjectContainer> {
        self.containers.get_mut(id)
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &ObjectContainer)> {
        self.containers.iter()
    }

    pub fn container_by_name(&self, name: &str) -> Option<ContainerId> {
        self.containers
            .iter()
            .find(|(_, c)| c.name() == name)
            .map(|(id, _)| id)
    }

    /// Sets the container's unsaved-changes flag. Never rolled back by undo.
    pub fn mark_dirty(&mut self, container: ContainerId) {
        if let Some(c) = self.containers.get_mut(container) {
            c.mark_dirty();
        }
    }

    // --- entities ---

    /// Allocates an entity slot. The entity is not attached anywhere:
    /// attachment to container lists and parents happens through actions.
    pub fn spawn_entity(&mut self, container: Option<ContainerId>, data: ObjectData) -> EntityId {
        self.entities.insert(Entity::new(data, container))
    }

    /// Allocates a detached copy of an entity: deep-cloned data, duplicated
    /// proxy, no container/parent links.
    pub fn duplicate_entity(&mut self, id: EntityId) -> Option<EntityId> {
        let copy = self.entities.get(id)?.duplicate();
        Some(self.entities.insert(copy))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub(crate) fn require_entity(&self, id: EntityId) -> ActionResult<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| ActionError::StructuralInconsistency("entity slot no longer exists".into()))
    }

    pub(crate) fn require_container(&self, id: ContainerId) -> ActionResult<&ObjectContainer> {
        self.containers
            .get(id)
            .ok_or_else(|| ActionError::StructuralInconsistency("container no longer loaded".into()))
    }

    /// Finds a member of `container` by entity name.
    pub fn object_by_name(&self, container: ContainerId, name: &str) -> Option<EntityId> {
        let c = self.containers.get(container)?;
        c.objects
            .iter()
            .copied()
            .find(|&id| self.entities.get(id).is_some_and(|e| e.name() == name))
    }

    // --- container membership ---

    pub fn index_in_container(&self, container: ContainerId, entity: EntityId) -> Option<usize> {
        self.containers.get(container)?.index_of(entity)
    }

    /// Inserts `entity` into the container's membership list at `index`
    /// (or appends). Does not touch parent links.
    pub fn attach(
        &mut self,
        container: ContainerId,
        entity: EntityId,
        index: Option<usize>,
    ) -> ActionResult<()> {
        self.require_entity(entity)?;
        let c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| ActionError::StructuralInconsistency("container no longer loaded".into()))?;
        let index = index.unwrap_or(c.objects.len());
        if index > c.objects.len() {
            return Err(ActionError::StructuralInconsistency(format!(
                "attach index {index} out of range for container of {}",
                c.objects.len()
            )));
        }
        c.objects.insert(index, entity);
        self.entities[entity].container = Some(container);
        self.invalidate_reference_caches();
        Ok(())
    }

    /// Removes `entity` from the container's membership list, returning the
    /// index it occupied. Does not touch parent links.
    pub fn detach(&mut self, container: ContainerId, entity: EntityId) -> ActionResult<usize> {
        let c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| ActionError::StructuralInconsistency("container no longer loaded".into()))?;
        let index = c.index_of(entity).ok_or_else(|| {
            ActionError::StructuralInconsistency("entity is not a member of the container".into())
        })?;
        c.objects.remove(index);
        if let Some(e) = self.entities.get_mut(entity) {
            e.container = None;
        }
        self.invalidate_reference_caches();
        Ok(index)
    }

    // --- parent/child links ---

    pub fn child_index(&self, parent: EntityId, child: EntityId) -> Option<usize> {
        self.entities
            .get(parent)?
            .children
            .iter()
            .position(|&c| c == child)
    }

    /// Links `child` under `parent` at `index` (or appends), detaching it
    /// from any previous parent first.
    pub fn add_child(
        &mut self,
        parent: EntityId,
        child: EntityId,
        index: Option<usize>,
    ) -> ActionResult<()> {
        self.require_entity(parent)?;
        if let Some(old_parent) = self.require_entity(child)?.parent {
            self.remove_child(old_parent, child)?;
        }
        let p = &mut self.entities[parent];
        let index = index.unwrap_or(p.children.len());
        if index > p.children.len() {
            return Err(ActionError::StructuralInconsistency(format!(
                "child index {index} out of range for parent with {} children",
                p.children.len()
            )));
        }
        p.children.insert(index, child);
        self.entities[child].parent = Some(parent);
        self.invalidate_reference_caches();
        Ok(())
    }

    /// Unlinks `child` from `parent`, returning the child index it occupied.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> ActionResult<usize> {
        let index = self.child_index(parent, child).ok_or_else(|| {
            ActionError::StructuralInconsistency("child is not linked under this parent".into())
        })?;
        self.entities[parent].children.remove(index);
        self.entities[child].parent = None;
        self.invalidate_reference_caches();
        Ok(index)
    }

    // --- reference maps ---

    /// Rebuilds the property->entity reference map of one entity by
    /// resolving its `EntityRef` properties against its container.
    pub fn build_reference_map(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let Some(container) = entity.container else {
            return;
        };
        let mut resolved: Vec<(String, Vec<EntityId>)> = Vec::new();
        // Only generic objects carry entity references; rows never do.
        if let ObjectData::Generic(obj) = &entity.data {
            for (field, value) in obj.fields() {
                if let PropertyValue::EntityRef(name) = value
                    && !name.is_empty()
                    && let Some(target) = self.object_by_name(container, name)
                {
                    resolved.push((field.to_string(), vec![target]));
                }
            }
        }
        let entity = &mut self.entities[id];
        entity.references = resolved.into_iter().collect();
    }

    /// Entities whose reference map points at `id`. Cached per entity;
    /// the cache is invalidated by any graph change.
    pub fn referencing_objects(&mut self, id: EntityId) -> Vec<EntityId> {
        let Some(entity) = self.entities.get(id) else {
            return Vec::new();
        };
        if let Some(cached) = &entity.referencing_cache {
            return cached.clone();
        }
        let Some(container) = entity.container else {
            return Vec::new();
        };
        let members: Vec<EntityId> = match self.containers.get(container) {
            Some(c) => c.objects.clone(),
            None => return Vec::new(),
        };
        let mut referencing = Vec::new();
        for member in members {
            let Some(m) = self.entities.get(member) else {
                continue;
            };
            if m.references.values().any(|targets| targets.contains(&id)) {
                referencing.push(member);
            }
        }
        self.entities[id].referencing_cache = Some(referencing.clone());
        referencing
    }

    fn invalidate_reference_caches(&mut self) {
        for (_, e) in self.entities.iter_mut() {
            e.referencing_cache = None;
        }
    }

    // --- transforms ---

    /// World matrix of an entity: local transforms composed through the
    /// parent chain up to the container root.
    pub fn world_matrix(&self, id: EntityId) -> Matrix4<f32> {
        let mut m = match self.entities.get(id) {
            Some(e) => e.local_transform().matrix(),
            None => return Matrix4::identity(),
        };
        let mut current = self.entities.get(id).and_then(|e| e.parent);
        while let Some(pid) = current {
            let Some(p) = self.entities.get(pid) else {
                break;
            };
            m = p.local_transform().matrix() * m;
            current = p.parent;
        }
        m
    }

    // --- selection ---

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Deselects everything, clearing selection outlines.
    pub fn clear_selection(&mut self) {
        let selected: Vec<EntityId> = self.selection.get_selection().iter().copied().collect();
        for id in selected {
            if let Some(e) = self.entities.get_mut(id)
                && let Some(proxy) = e.proxy_mut()
            {
                proxy.set_selection_outline(false);
            }
        }
        self.selection.clear();
    }

    /// Selects an entity, updating its outline and the most-recent-container
    /// pointer that biases future creation operations.
    pub fn add_selection(&mut self, id: EntityId) {
        let Some(e) = self.entities.get_mut(id) else {
            return;
        };
        if let Some(proxy) = e.proxy_mut() {
            proxy.set_selection_outline(true);
        }
        if let Some(container) = e.container {
            self.selection.set_most_recent_container(container);
        }
        self.selection.insert(id);
    }

    pub fn remove_selection(&mut self, id: EntityId) {
        if self.selection.remove(id)
            && let Some(e) = self.entities.get_mut(id)
            && let Some(proxy) = e.proxy_mut()
        {
            proxy.set_selection_outline(false);
        }
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selection.is_selected(id)
    }

    // --- session ---

    /// Drops the whole document: all containers, entities, and selection.
    ///
    /// Pair with [`ActionManager::clear`](crate::action::ActionManager::clear)
    /// on document switch.
    pub fn clear(&mut self) {
        for (_, e) in self.entities.iter_mut() {
            if let Some(proxy) = e.proxy_mut() {
                proxy.dispose();
            }
        }
        self.entities.clear();
        self.containers.clear();
        self.selection.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::data::GenericObject;

    fn generic(name: &str) -> ObjectData {
        ObjectData::Generic(GenericObject::new(name))
    }

    fn filed_entity(u: &mut Universe, container: ContainerId, name: &str) -> EntityId {
        let id = u.spawn_entity(Some(container), generic(name));
        u.attach(container, id, None).unwrap();
        let root = u.container(container).unwrap().root();
        u.add_child(root, id, None).unwrap();
        id
    }

    #[test]
    fn create_container_has_root() {
        let mut u = Universe::new();
        let c = u.create_container("m10_00");
        let root = u.container(c).unwrap().root();
        assert_eq!(u.entity(root).unwrap().container(), Some(c));
        assert!(u.container(c).unwrap().objects().is_empty());
    }

    #[test]
    fn attach_detach_round_trip() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");
        let b = filed_entity(&mut u, c, "b");

        assert_eq!(u.index_in_container(c, b), Some(1));
        let idx = u.detach(c, a).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(u.container(c).unwrap().objects(), &[b]);

        u.attach(c, a, Some(0)).unwrap();
        assert_eq!(u.container(c).unwrap().objects(), &[a, b]);
    }

    #[test]
    fn add_child_reparents_away_from_old_parent() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");
        let b = filed_entity(&mut u, c, "b");

        u.add_child(a, b, None).unwrap();
        let root = u.container(c).unwrap().root();
        assert_eq!(u.entity(b).unwrap().parent(), Some(a));
        assert_eq!(u.child_index(root, b), None);
        assert_eq!(u.child_index(a, b), Some(0));
    }

    #[test]
    fn remove_child_returns_index() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");
        let b = filed_entity(&mut u, c, "b");
        let root = u.container(c).unwrap().root();

        assert_eq!(u.remove_child(root, a).unwrap(), 0);
        assert_eq!(u.entity(a).unwrap().parent(), None);
        assert_eq!(u.child_index(root, b), Some(0));
    }

    #[test]
    fn detach_of_nonmember_is_inconsistency() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let stray = u.spawn_entity(Some(c), generic("stray"));
        assert!(matches!(
            u.detach(c, stray),
            Err(ActionError::StructuralInconsistency(_))
        ));
    }

    #[test]
    fn object_by_name_finds_members_only() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");
        let _stray = u.spawn_entity(Some(c), generic("stray"));
        assert_eq!(u.object_by_name(c, "a"), Some(a));
        assert_eq!(u.object_by_name(c, "stray"), None);
    }

    #[test]
    fn reference_map_and_referencing_cache() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let target = filed_entity(&mut u, c, "door_0001");
        let watcher = u.spawn_entity(
            Some(c),
            ObjectData::Generic(
                GenericObject::new("trigger")
                    .with_field("ActivatesPart", PropertyValue::EntityRef("door_0001".into())),
            ),
        );
        u.attach(c, watcher, None).unwrap();
        u.build_reference_map(watcher);

        assert_eq!(u.referencing_objects(target), vec![watcher]);

        // Structural change invalidates the cache; recompute still works.
        let root = u.container(c).unwrap().root();
        u.add_child(root, watcher, None).unwrap();
        assert_eq!(u.referencing_objects(target), vec![watcher]);
    }

    #[test]
    fn selection_tracks_most_recent_container() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");

        u.add_selection(a);
        assert!(u.is_selected(a));
        assert_eq!(u.selection().most_recent_container(), Some(c));

        u.clear_selection();
        assert!(!u.is_selected(a));
        assert_eq!(u.selection().most_recent_container(), Some(c));
    }

    #[test]
    fn world_matrix_composes_parent_chain() {
        use nalgebra::Vector3;
        let mut u = Universe::new();
        let c = u.create_container("m");
        let parent = u.spawn_entity(
            Some(c),
            ObjectData::Generic(
                GenericObject::new("p")
                    .with_field("Position", PropertyValue::Vec3(Vector3::new(1.0, 0.0, 0.0))),
            ),
        );
        let child = u.spawn_entity(
            Some(c),
            ObjectData::Generic(
                GenericObject::new("c")
                    .with_field("Position", PropertyValue::Vec3(Vector3::new(0.0, 2.0, 0.0))),
            ),
        );
        u.attach(c, parent, None).unwrap();
        u.attach(c, child, None).unwrap();
        u.add_child(parent, child, None).unwrap();

        let m = u.world_matrix(child);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
    }

    #[test]
    fn unload_container_frees_members() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let a = filed_entity(&mut u, c, "a");
        u.unload_container(c);
        assert!(u.entity(a).is_none());
        assert!(u.container(c).is_none());
    }
}
