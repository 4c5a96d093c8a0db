//! Ordered aggregation of actions sharing one undo step.

use std::fmt;

use crate::scene::Universe;

use super::{Action, ActionEvent, ActionResult};

/// Runs a sequence of sub-actions as a single stack entry.
///
/// Execution order is construction order; undo runs the sub-actions in
/// reverse, so later sub-actions that depend on the effects of earlier
/// ones are unwound before their prerequisites.
///
/// A failing sub-action is logged and skipped; the rest of the batch still
/// runs in both directions. The aggregate event is the bitwise OR of the
/// sub-action events.
pub struct CompoundAction {
    actions: Vec<Box<dyn Action>>,
    post_execute: Option<Box<dyn FnMut(bool) + Send>>,
}

impl CompoundAction {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            actions,
            post_execute: None,
        }
    }

    /// Builds from per-element construction results, dropping the elements
    /// that produced no action (e.g. a transform write for a row without
    /// rotation cells).
    pub fn from_optional(actions: Vec<Option<Box<dyn Action>>>) -> Self {
        Self::new(actions.into_iter().flatten().collect())
    }

    pub fn push(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Registers a callback invoked after either direction, with `true` for
    /// the undo direction.
    pub fn set_post_execution(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.post_execute = Some(Box::new(callback));
    }
}

impl Action for CompoundAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        let mut event = ActionEvent::empty();
        for action in self.actions.iter_mut() {
            match action.execute(universe) {
                Ok(e) => event |= e,
                Err(err) => {
                    log::warn!("compound sub-action `{}` failed: {err}", action.description());
                }
            }
        }
        if let Some(callback) = &mut self.post_execute {
            callback(false);
        }
        Ok(event)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        let mut event = ActionEvent::empty();
        for action in self.actions.iter_mut().rev() {
            match action.undo(universe) {
                Ok(e) => event |= e,
                Err(err) => {
                    log::warn!(
                        "compound sub-action `{}` failed to undo: {err}",
                        action.description()
                    );
                }
            }
        }
        if let Some(callback) = &mut self.post_execute {
            callback(true);
        }
        Ok(event)
    }

    fn description(&self) -> &str {
        "Compound action"
    }
}

impl fmt::Debug for CompoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundAction")
            .field("actions", &self.actions)
            .field("has_post_execute", &self.post_execute.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionError, FieldAccessor, PropertiesChangedAction};
    use crate::scene::{GenericObject, ObjectData, PropertyValue};

    /// Appends a tag on execute, a paired undo tag on undo, into a shared
    /// journal so ordering is observable.
    #[derive(Debug)]
    struct Journal {
        tag: &'static str,
        log: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl Action for Journal {
        fn execute(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            self.log.lock().unwrap().push(format!("do {}", self.tag));
            Ok(ActionEvent::empty())
        }

        fn undo(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            self.log.lock().unwrap().push(format!("undo {}", self.tag));
            Ok(ActionEvent::empty())
        }

        fn description(&self) -> &str {
            self.tag
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;

    impl Action for AlwaysFails {
        fn execute(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            Err(ActionError::Mutation("nope".into()))
        }

        fn undo(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            Err(ActionError::Mutation("nope".into()))
        }

        fn description(&self) -> &str {
            "always fails"
        }
    }

    #[test]
    fn undo_runs_in_reverse_order() {
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut universe = Universe::new();
        let mut compound = CompoundAction::new(vec![
            Box::new(Journal {
                tag: "a",
                log: std::sync::Arc::clone(&log),
            }),
            Box::new(Journal {
                tag: "b",
                log: std::sync::Arc::clone(&log),
            }),
            Box::new(Journal {
                tag: "c",
                log: std::sync::Arc::clone(&log),
            }),
        ]);

        compound.execute(&mut universe).unwrap();
        compound.undo(&mut universe).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["do a", "do b", "do c", "undo c", "undo b", "undo a"]
        );
    }

    #[test]
    fn failing_sub_action_does_not_stop_the_batch() {
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut universe = Universe::new();
        let mut compound = CompoundAction::new(vec![
            Box::new(Journal {
                tag: "a",
                log: std::sync::Arc::clone(&log),
            }),
            Box::new(AlwaysFails),
            Box::new(Journal {
                tag: "b",
                log: std::sync::Arc::clone(&log),
            }),
        ]);

        compound.execute(&mut universe).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["do a", "do b"]);
    }

    #[test]
    fn dependent_sub_actions_round_trip() {
        // Second sub-action's snapshot is taken at staging, not execution;
        // reverse-order undo still restores the initial state exactly.
        let mut universe = Universe::new();
        let c = universe.create_container("m");
        let id = universe.spawn_entity(
            Some(c),
            ObjectData::Generic(GenericObject::new("a").with_field("Health", PropertyValue::Int(1))),
        );
        universe.attach(c, id, None).unwrap();

        let first = PropertiesChangedAction::single(
            &universe,
            id,
            FieldAccessor::new("Health"),
            PropertyValue::Int(2),
        )
        .unwrap();
        let second = PropertiesChangedAction::single(
            &universe,
            id,
            FieldAccessor::new("Health"),
            PropertyValue::Int(3),
        )
        .unwrap();
        let mut compound = CompoundAction::new(vec![Box::new(first), Box::new(second)]);

        compound.execute(&mut universe).unwrap();
        assert_eq!(
            universe.entity(id).unwrap().data.get("Health"),
            Some(&PropertyValue::Int(3))
        );
        compound.undo(&mut universe).unwrap();
        assert_eq!(
            universe.entity(id).unwrap().data.get("Health"),
            Some(&PropertyValue::Int(1))
        );
    }
}
