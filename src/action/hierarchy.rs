//! Batched re-parenting of entities inside the scene tree.

use log::warn;

use crate::scene::{EntityId, Universe};

use super::{Action, ActionError, ActionEvent, ActionResult};

/// Moves entities under new parents at given child indices.
///
/// Child indices follow the same pre-removal "gap" convention as container
/// reordering, and the same incremental shifting applies — keyed per
/// parent, since only indices under the parent being spliced move.
///
/// Undo is the exact inverse: each entity returns to its captured old
/// parent and child index, with the mirrored shift bookkeeping. An entity
/// that had no parent goes back to having none.
#[derive(Debug)]
pub struct ChangeEntityHierarchyAction {
    sources: Vec<EntityId>,
    target_parents: Vec<EntityId>,
    target_indices: Vec<usize>,
    // Captured per execute, parallel to `sources`.
    undo_parents: Vec<Option<EntityId>>,
    undo_indices: Vec<usize>,
    moved: Vec<bool>,
    set_selection: bool,
}

impl ChangeEntityHierarchyAction {
    pub fn new(
        sources: Vec<EntityId>,
        target_parents: Vec<EntityId>,
        target_indices: Vec<usize>,
        set_selection: bool,
    ) -> Self {
        Self {
            sources,
            target_parents,
            target_indices,
            undo_parents: Vec::new(),
            undo_indices: Vec::new(),
            moved: Vec::new(),
            set_selection,
        }
    }

    fn select_sources(&self, universe: &mut Universe) {
        if self.set_selection {
            universe.clear_selection();
            for &src in &self.sources {
                universe.add_selection(src);
            }
        }
    }

    /// Shifts every batched index tracked under `parent` after a removal
    /// at `at` (`delta = -1`) or an insertion at `at` (`delta = +1`).
    fn shift(&mut self, parent: EntityId, at: usize, delta: isize) {
        for j in 0..self.sources.len() {
            if self.undo_parents.get(j).copied().flatten() == Some(parent)
                && self.undo_indices[j] > at
            {
                self.undo_indices[j] = self.undo_indices[j].wrapping_add_signed(delta);
            }
            if self.target_parents[j] == parent && self.target_indices[j] > at {
                self.target_indices[j] = self.target_indices[j].wrapping_add_signed(delta);
            }
        }
    }
}

impl Action for ChangeEntityHierarchyAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        if self.target_parents.len() != self.sources.len()
            || self.target_indices.len() != self.sources.len()
        {
            return Err(ActionError::Mutation(format!(
                "{} parents / {} indices for {} sources",
                self.target_parents.len(),
                self.target_indices.len(),
                self.sources.len()
            )));
        }

        self.undo_parents.clear();
        self.undo_indices.clear();
        self.moved = vec![false; self.sources.len()];
        for &src in &self.sources {
            let parent = universe.entity(src).and_then(|e| e.parent());
            let index = parent
                .and_then(|p| universe.child_index(p, src))
                .unwrap_or(0);
            self.undo_parents.push(parent);
            self.undo_indices.push(index);
        }

        for i in 0..self.sources.len() {
            let src = self.sources[i];
            let target_parent = self.target_parents[i];
            // Check the destination before detaching anything, so a bad
            // element stays under its old parent instead of being removed
            // and then failing to re-attach.
            let Some(sibling_count) = universe.entity(target_parent).map(|e| e.children().len())
            else {
                warn!("skipping re-parent of {src:?}: target parent no longer exists");
                continue;
            };
            if self.target_indices[i] > sibling_count {
                warn!(
                    "skipping re-parent of {src:?}: child index {} out of range for {} siblings",
                    self.target_indices[i], sibling_count
                );
                continue;
            }

            if let Some(old_parent) = self.undo_parents[i] {
                match universe.remove_child(old_parent, src) {
                    Ok(at) => self.shift(old_parent, at, -1),
                    Err(err) => {
                        warn!("skipping re-parent of {src:?}: {err}");
                        continue;
                    }
                }
            }

            let dest = self.target_indices[i];
            if let Err(err) = universe.add_child(target_parent, src, Some(dest)) {
                warn!("re-parent of {src:?} dropped its parent link: {err}");
                continue;
            }
            self.shift(target_parent, dest, 1);
            self.moved[i] = true;

            if let Some(container) = universe.entity(src).and_then(|e| e.container()) {
                universe.mark_dirty(container);
            }
        }

        self.select_sources(universe);
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        // Reverse order: each move is unwound before the moves that
        // preceded it, so captured child indices are valid again by the
        // time their element is restored.
        for i in (0..self.sources.len()).rev() {
            if !self.moved.get(i).copied().unwrap_or(false) {
                continue;
            }
            let src = self.sources[i];
            let target_parent = self.target_parents[i];
            match universe.remove_child(target_parent, src) {
                Ok(at) => self.shift(target_parent, at, -1),
                Err(err) => {
                    warn!("cannot undo re-parent of {src:?}: {err}");
                    continue;
                }
            }

            if let Some(old_parent) = self.undo_parents[i] {
                let dest = self.undo_indices[i];
                if let Err(err) = universe.add_child(old_parent, src, Some(dest)) {
                    warn!("undo of re-parent dropped {src:?} parent link: {err}");
                    continue;
                }
                self.shift(old_parent, dest, 1);
            }

            if let Some(container) = universe.entity(src).and_then(|e| e.container()) {
                universe.mark_dirty(container);
            }
        }

        self.select_sources(universe);
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn description(&self) -> &str {
        "Change hierarchy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ContainerId, GenericObject, ObjectData};

    fn filed(u: &mut Universe, c: ContainerId, name: &str) -> EntityId {
        let id = u.spawn_entity(None, ObjectData::Generic(GenericObject::new(name)));
        u.attach(c, id, None).unwrap();
        let root = u.container(c).unwrap().root();
        u.add_child(root, id, None).unwrap();
        id
    }

    fn children(u: &Universe, parent: EntityId) -> Vec<EntityId> {
        u.entity(parent).unwrap().children().to_vec()
    }

    #[test]
    fn reparent_and_true_inverse_undo() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let root = u.container(c).unwrap().root();
        let a = filed(&mut u, c, "a");
        let b = filed(&mut u, c, "b");
        let x = filed(&mut u, c, "x");

        let mut action = ChangeEntityHierarchyAction::new(vec![x], vec![a], vec![0], false);
        action.execute(&mut u).unwrap();
        assert_eq!(u.entity(x).unwrap().parent(), Some(a));
        assert_eq!(children(&u, a), vec![x]);
        assert_eq!(children(&u, root), vec![a, b]);

        action.undo(&mut u).unwrap();
        assert_eq!(u.entity(x).unwrap().parent(), Some(root));
        assert!(children(&u, a).is_empty());
        // Back at its original child index, not appended.
        assert_eq!(children(&u, root), vec![a, b, x]);
    }

    #[test]
    fn undo_restores_original_child_index() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let root = u.container(c).unwrap().root();
        let a = filed(&mut u, c, "a");
        let b = filed(&mut u, c, "b");
        let d = filed(&mut u, c, "d");
        let target = filed(&mut u, c, "target");

        // Move the middle child away and back.
        let mut action = ChangeEntityHierarchyAction::new(vec![b], vec![target], vec![0], false);
        action.execute(&mut u).unwrap();
        assert_eq!(children(&u, root), vec![a, d, target]);

        action.undo(&mut u).unwrap();
        assert_eq!(children(&u, root), vec![a, b, d, target]);
    }

    #[test]
    fn batch_between_parents_round_trips() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let root = u.container(c).unwrap().root();
        let p = filed(&mut u, c, "p");
        let q = filed(&mut u, c, "q");
        let a = filed(&mut u, c, "a");
        let b = filed(&mut u, c, "b");

        let mut action =
            ChangeEntityHierarchyAction::new(vec![a, b], vec![p, q], vec![0, 0], false);
        for _ in 0..2 {
            action.execute(&mut u).unwrap();
            assert_eq!(children(&u, p), vec![a]);
            assert_eq!(children(&u, q), vec![b]);
            assert_eq!(children(&u, root), vec![p, q]);

            action.undo(&mut u).unwrap();
            assert_eq!(children(&u, root), vec![p, q, a, b]);
            assert!(children(&u, p).is_empty());
            assert!(children(&u, q).is_empty());
        }
    }

    #[test]
    fn unparented_source_moves_and_returns_to_unparented() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let parent = filed(&mut u, c, "parent");
        let stray = u.spawn_entity(None, ObjectData::Generic(GenericObject::new("stray")));

        let mut action =
            ChangeEntityHierarchyAction::new(vec![stray], vec![parent], vec![0], false);
        action.execute(&mut u).unwrap();
        assert_eq!(u.entity(stray).unwrap().parent(), Some(parent));

        action.undo(&mut u).unwrap();
        assert_eq!(u.entity(stray).unwrap().parent(), None);
    }

    #[test]
    fn out_of_range_child_index_skips_without_detaching() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let root = u.container(c).unwrap().root();
        let a = filed(&mut u, c, "a");
        let b = filed(&mut u, c, "b");

        // Index 5 is past the end of a's (empty) child list; b must keep
        // its old parent rather than ending up unparented.
        let mut action = ChangeEntityHierarchyAction::new(vec![b], vec![a], vec![5], false);
        action.execute(&mut u).unwrap();
        assert_eq!(u.entity(b).unwrap().parent(), Some(root));
        assert_eq!(children(&u, root), vec![a, b]);
        assert!(children(&u, a).is_empty());

        action.undo(&mut u).unwrap();
        assert_eq!(children(&u, root), vec![a, b]);
    }

    #[test]
    fn missing_target_parent_skips_element() {
        let mut u = Universe::new();
        let c = u.create_container("m");
        let root = u.container(c).unwrap().root();
        let x = filed(&mut u, c, "x");

        // A parent whose slot has been freed by an unload.
        let scratch = u.create_container("scratch");
        let dangling = u.spawn_entity(Some(scratch), ObjectData::Generic(GenericObject::new("p")));
        u.unload_container(scratch);
        assert!(u.entity(dangling).is_none());

        let mut action =
            ChangeEntityHierarchyAction::new(vec![x], vec![dangling], vec![0], false);
        action.execute(&mut u).unwrap();
        // Element skipped; nothing changed and undo is a no-op.
        assert_eq!(u.entity(x).unwrap().parent(), Some(root));
        action.undo(&mut u).unwrap();
        assert_eq!(u.entity(x).unwrap().parent(), Some(root));
    }
}
