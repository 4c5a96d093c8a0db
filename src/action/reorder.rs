//! Batched reordering of container membership lists.

use log::warn;

use crate::scene::{ContainerId, EntityId, Universe};

use super::{Action, ActionError, ActionEvent, ActionResult};

/// Moves entities to new positions in their containers' membership lists.
///
/// Target indices are given in pre-removal coordinates: "insert before the
/// member currently at index N", with N equal to the list length meaning
/// the end. Elements are processed in order, and every batched target is
/// shifted incrementally as removals and insertions displace its container's
/// list, so multi-element moves land where the caller aimed them. Shifts are
/// keyed on container identity; splicing one container never disturbs
/// indices recorded against another.
///
/// Execute records each element's live position as it is removed, and undo
/// replays the steps in reverse against those records, which is what keeps
/// alternating undo/redo exact.
#[derive(Debug)]
pub struct ReorderContainerObjectsAction {
    sources: Vec<EntityId>,
    target_indices: Vec<usize>,
    // Captured per execute, parallel to `sources`.
    containers: Vec<ContainerId>,
    undo_indices: Vec<usize>,
    set_selection: bool,
}

impl ReorderContainerObjectsAction {
    pub fn new(sources: Vec<EntityId>, target_indices: Vec<usize>, set_selection: bool) -> Self {
        Self {
            sources,
            target_indices,
            containers: Vec::new(),
            undo_indices: Vec::new(),
            set_selection,
        }
    }

    // Adjusts batched targets for a removal or insertion at `at`, touching
    // only elements recorded against the same container.
    fn shift(&mut self, container: ContainerId, at: usize, delta: isize) {
        for j in 0..self.target_indices.len() {
            if self.containers.get(j) == Some(&container) && self.target_indices[j] > at {
                self.target_indices[j] = self.target_indices[j].wrapping_add_signed(delta);
            }
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
}

impl Action for ReorderContainerObjectsAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        if self.target_indices.len() != self.sources.len() {
            return Err(ActionError::Mutation(format!(
                "{} target indices for {} sources",
                self.target_indices.len(),
                self.sources.len()
            )));
        }

        // Validate the whole batch before touching any list, so a bad
        // element cannot leave a partial move behind.
        self.containers.clear();
        self.undo_indices.clear();
        for (i, &src) in self.sources.iter().enumerate() {
            let container = universe
                .require_entity(src)?
                .container()
                .ok_or_else(|| {
                    ActionError::StructuralInconsistency(
                        "reorder source is not filed in any container".into(),
                    )
                })?;
            let c = universe.require_container(container)?;
            let index = c.index_of(src).ok_or_else(|| {
                ActionError::StructuralInconsistency(
                    "reorder source is missing from its container's list".into(),
                )
            })?;
            if self.target_indices[i] > c.objects().len() {
                return Err(ActionError::StructuralInconsistency(format!(
                    "reorder target {} out of range for container of {}",
                    self.target_indices[i],
                    c.objects().len()
                )));
            }
            self.containers.push(container);
            self.undo_indices.push(index);
        }
        for &container in &self.containers {
            universe.mark_dirty(container);
        }

        for i in 0..self.sources.len() {
            let container = self.containers[i];
            let c = universe.container_mut(container).ok_or_else(|| {
                ActionError::StructuralInconsistency("container no longer loaded".into())
            })?;
            let src = c.index_of(self.sources[i]).ok_or_else(|| {
                ActionError::StructuralInconsistency(
                    "reorder source vanished from its container's list".into(),
                )
            })?;
            self.undo_indices[i] = src;
            c.objects.remove(src);
            self.shift(container, src, -1);

            let dest = self.target_indices[i];
            let c = universe.container_mut(container).ok_or_else(|| {
                ActionError::StructuralInconsistency("container no longer loaded".into())
            })?;
            c.objects.insert(dest, self.sources[i]);
            self.shift(container, dest, 1);
        }

        self.select_sources(universe);
        Ok(ActionEvent::empty())
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        // Each step is the exact inverse of its execute step, replayed in
        // reverse order so every recorded position is live again when used.
        for i in (0..self.sources.len()).rev() {
            let Some(&container) = self.containers.get(i) else {
                warn!("undoing reorder that never captured element {i}");
                continue;
            };
            let c = universe.container_mut(container).ok_or_else(|| {
                ActionError::StructuralInconsistency("container no longer loaded".into())
            })?;
            let at = c.index_of(self.sources[i]).ok_or_else(|| {
                ActionError::StructuralInconsistency(
                    "reorder source vanished from its container's list".into(),
                )
            })?;
            c.objects.remove(at);
            self.shift(container, at, -1);

            let dest = self.undo_indices[i];
            let c = universe.container_mut(container).ok_or_else(|| {
                ActionError::StructuralInconsistency("container no longer loaded".into())
            })?;
            c.objects.insert(dest, self.sources[i]);
            self.shift(container, dest, 1);
            universe.mark_dirty(container);
        }

        self.select_sources(universe);
        Ok(ActionEvent::empty())
    }

    fn description(&self) -> &str {
        "Reorder objects"
    }
}
