//! Duplication with collision-free naming and identity-stable redo.

use log::warn;

use crate::scene::{ContainerId, EntityId, Universe};

use super::{Action, ActionEvent, ActionResult};

/// Duplicates entities into their own containers, directly after their
/// sources in both the membership list and the source parent's child list.
///
/// Clone names never collide with existing members or with each other: a
/// trailing `_<digits>` suffix is incremented past every taken name,
/// preserving the zero-padded width, and a name without such a suffix gets
/// one appended starting at `_0001`.
///
/// Clone entities are allocated once, on first execution, and the same ids
/// are re-filed on every redo, so later stack entries that captured a
/// clone's id stay valid across undo/redo cycles.
#[derive(Debug)]
pub struct CloneObjectsAction {
    sources: Vec<EntityId>,
    // Parallel to `sources`; filled on first execute, None for skipped
    // elements.
    clones: Vec<Option<EntityId>>,
    set_selection: bool,
}

impl CloneObjectsAction {
    pub fn new(sources: Vec<EntityId>, set_selection: bool) -> Self {
        Self {
            sources,
            clones: Vec::new(),
            set_selection,
        }
    }

    /// Ids of the clones produced by the last execution.
    pub fn clones(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.clones.iter().filter_map(|c| *c)
    }
}

/// Picks a member name not yet taken in `container`, starting from `base`.
fn unique_name(universe: &Universe, container: ContainerId, base: &str) -> String {
    let (prefix, mut number, width) = match base.rsplit_once('_') {
        Some((prefix, suffix))
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            // Saturate rather than wrap on absurd suffixes.
            (prefix, suffix.parse::<u64>().unwrap_or(u64::MAX), suffix.len())
        }
        _ => (base, 0, 4),
    };
    loop {
        number = number.saturating_add(1);
        let candidate = format!("{prefix}_{number:0width$}");
        if universe.object_by_name(container, &candidate).is_none() {
            return candidate;
        }
    }
}

impl Action for CloneObjectsAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        if self.clones.is_empty() {
            self.clones = vec![None; self.sources.len()];
        }
        for (i, &src) in self.sources.iter().enumerate() {
            let Some(container) = universe.entity(src).and_then(|e| e.container()) else {
                warn!("skipping clone of {src:?}: not filed in any container");
                continue;
            };

            // First execution allocates and names the clone; redo reuses it.
            let clone = match self.clones[i] {
                Some(clone) => clone,
                None => {
                    let Some(clone) = universe.duplicate_entity(src) else {
                        warn!("skipping clone of {src:?}: entity slot no longer exists");
                        continue;
                    };
                    let base = universe
                        .entity(src)
                        .map(|e| e.name().to_owned())
                        .unwrap_or_default();
                    let name = unique_name(universe, container, &base);
                    if let Some(e) = universe.entity_mut(clone) {
                        e.set_name(name);
                    }
                    self.clones[i] = Some(clone);
                    clone
                }
            };

            let index = universe
                .index_in_container(container, src)
                .map(|i| i + 1);
            if let Err(err) = universe.attach(container, clone, index) {
                warn!("cannot file clone of {src:?}: {err}");
                continue;
            }
            if let Some(parent) = universe.entity(src).and_then(|e| e.parent()) {
                let child_index = universe.child_index(parent, src).map(|i| i + 1);
                if let Err(err) = universe.add_child(parent, clone, child_index) {
                    warn!("clone of {src:?} filed without parent link: {err}");
                }
            }
            if let Some(e) = universe.entity_mut(clone)
                && let Some(proxy) = e.proxy_mut()
                && proxy.auto_register()
            {
                proxy.register();
            }
            universe.mark_dirty(container);
        }

        if self.set_selection {
            universe.clear_selection();
            for clone in self.clones.iter().filter_map(|c| *c) {
                universe.add_selection(clone);
            }
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        for clone in self.clones.iter().filter_map(|c| *c) {
            if let Some(parent) = universe.entity(clone).and_then(|e| e.parent())
                && let Err(err) = universe.remove_child(parent, clone)
            {
                warn!("undo of clone left {clone:?} parent link: {err}");
            }
            match universe.entity(clone).and_then(|e| e.container()) {
                Some(container) => {
                    if let Err(err) = universe.detach(container, clone) {
                        warn!("undo of clone left {clone:?} filed: {err}");
                    }
                    universe.mark_dirty(container);
                }
                None => warn!("undo of clone: {clone:?} was not filed"),
            }
            if let Some(e) = universe.entity_mut(clone)
                && let Some(proxy) = e.proxy_mut()
            {
                proxy.unregister();
            }
        }

        if self.set_selection {
            universe.clear_selection();
            for &src in &self.sources {
                if universe.entity(src).is_some() {
                    universe.add_selection(src);
                }
            }
        }
        Ok(ActionEvent::OBJECT_ADDED_REMOVED)
    }

    fn description(&self) -> &str {
        "Clone objects"
    }
}
