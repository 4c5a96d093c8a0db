//! Symmetric container-membership actions: add and delete.

use log::warn;

use crate::scene::{ContainerId, EntityId, Universe};

use super::{Action, ActionEvent, ActionResult};

/// Files already-spawned entities into a container, parented under its
/// root. Undo detaches them again without freeing their slots, so the ids
/// stay valid for redo and for later stack entries.
#[derive(Debug)]
pub struct AddObjectsAction {
    container: ContainerId,
    added: Vec<EntityId>,
    // Parallel to `added`: whether the element actually went in, so undo
    // skips the ones that failed.
    attached: Vec<bool>,
    set_selection: bool,
}

impl AddObjectsAction {
    pub fn new(container: ContainerId, added: Vec<EntityId>, set_selection: bool) -> Self {
        Self {
            container,
            added,
            attached: Vec::new(),
            set_selection,
        }
    }
}

impl Action for AddObjectsAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        let root = universe.require_container(self.container)?.root();
        self.attached.clear();
        for &id in &self.added {
            if let Err(err) = universe.attach(self.container, id, None) {
                warn!("skipping add of {id:?}: {err}");
                self.attached.push(false);
                continue;
            }
            if let Err(err) = universe.add_child(root, id, None) {
                warn!("added {id:?} without parent link: {err}");
            }
            if let Some(e) = universe.entity_mut(id)
                && let Some(proxy) = e.proxy_mut()
                && proxy.auto_register()
            {
                proxy.register();
            }
            self.attached.push(true);
        }
        universe.mark_dirty(self.container);

        if self.set_selection {
            universe.clear_selection();
            for &id in &self.added {
                universe.add_selection(id);
            }
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        for (&id, &attached) in self.added.iter().zip(&self.attached).rev() {
            if !attached {
                continue;
            }
            if let Some(parent) = universe.entity(id).and_then(|e| e.parent())
                && let Err(err) = universe.remove_child(parent, id)
            {
                warn!("undo of add left {id:?} parent link: {err}");
            }
            if let Err(err) = universe.detach(self.container, id) {
                warn!("undo of add left {id:?} filed: {err}");
            }
            if let Some(e) = universe.entity_mut(id)
                && let Some(proxy) = e.proxy_mut()
            {
                proxy.unregister();
            }
        }
        universe.mark_dirty(self.container);

        if self.set_selection {
            universe.clear_selection();
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn description(&self) -> &str {
        "Add objects"
    }
}

/// The exact position an entity occupied before deletion.
#[derive(Debug, Clone, Copy)]
struct RemovedSlot {
    container: ContainerId,
    index: usize,
    parent: Option<EntityId>,
    parent_index: Option<usize>,
}

/// Detaches entities from their containers and parents.
///
/// Deletion never frees entity slots; the ids stay alive so undo restores
/// the same entities at their captured positions and other stack entries
/// keep pointing at them. Captured positions are cleared and re-captured
/// on every execute, so redo after undo sees current state.
#[derive(Debug)]
pub struct DeleteObjectsAction {
    deletables: Vec<EntityId>,
    // Parallel to `deletables`; None marks an element that was not filed
    // when execute ran.
    removed: Vec<Option<RemovedSlot>>,
    set_selection: bool,
}

impl DeleteObjectsAction {
    pub fn new(deletables: Vec<EntityId>, set_selection: bool) -> Self {
        Self {
            deletables,
            removed: Vec::new(),
            set_selection,
        }
    }
}

impl Action for DeleteObjectsAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        self.removed.clear();
        for &id in &self.deletables {
            let Some(container) = universe.entity(id).and_then(|e| e.container()) else {
                warn!("skipping delete of {id:?}: not filed in any container");
                self.removed.push(None);
                continue;
            };
            let parent = universe.entity(id).and_then(|e| e.parent());
            let parent_index = match parent {
                Some(p) => match universe.remove_child(p, id) {
                    Ok(i) => Some(i),
                    Err(err) => {
                        warn!("deleting {id:?} with broken parent link: {err}");
                        None
                    }
                },
                None => None,
            };
            let index = match universe.detach(container, id) {
                Ok(i) => i,
                Err(err) => {
                    warn!("skipping delete of {id:?}: {err}");
                    self.removed.push(None);
                    continue;
                }
            };
            if let Some(e) = universe.entity_mut(id)
                && let Some(proxy) = e.proxy_mut()
            {
                proxy.unregister();
            }
            universe.mark_dirty(container);
            self.removed.push(Some(RemovedSlot {
                container,
                index,
                parent,
                parent_index,
            }));
        }

        if self.set_selection {
            universe.clear_selection();
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        // Reverse order: each captured index is relative to the removals
        // before it, so reinsertion must unwind them back-to-front.
        for (&id, slot) in self.deletables.iter().zip(&self.removed).rev() {
            let Some(slot) = slot else { continue };
            if let Err(err) = universe.attach(slot.container, id, Some(slot.index)) {
                warn!("undo of delete cannot restore {id:?}: {err}");
                continue;
            }
            if let Some(parent) = slot.parent
                && let Err(err) = universe.add_child(parent, id, slot.parent_index)
            {
                warn!("undo of delete restored {id:?} without parent link: {err}");
            }
            if let Some(e) = universe.entity_mut(id)
                && let Some(proxy) = e.proxy_mut()
                && proxy.auto_register()
            {
                proxy.register();
            }
            universe.mark_dirty(slot.container);
        }

        if self.set_selection {
            universe.clear_selection();
            for (&id, slot) in self.deletables.iter().zip(&self.removed) {
                if slot.is_some() {
                    universe.add_selection(id);
                }
            }
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn description(&self) -> &str {
        "Delete objects"
    }
}
