//! Cross-thread hand-off of actions into the editor loop.

use std::fmt;
use std::sync::Mutex;

use super::Action;

/// Collects actions produced off the editor thread (asset import jobs,
/// scripted tools) until the editor loop drains and executes them.
///
/// Shared by `Arc`; [`push`](Self::push) takes `&self`. All graph mutation
/// still happens on the draining thread, which owns the `Universe`.
#[derive(Default)]
pub struct ActionQueue {
    queue: Mutex<Vec<Box<dyn Action>>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, action: Box<dyn Action>) {
        let mut queue = self.queue.lock().unwrap();
        queue.push(action);
    }

    /// Takes every pending action, preserving submission order.
    pub fn drain(&self) -> Vec<Box<dyn Action>> {
        let mut queue = self.queue.lock().unwrap();
        std::mem::take(&mut *queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.queue.lock().map(|q| q.len()).unwrap_or(0);
        f.debug_struct("ActionQueue").field("pending", &len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionEvent, ActionResult};
    use crate::scene::Universe;

    #[derive(Debug)]
    struct Tagged(&'static str);

    impl Action for Tagged {
        fn execute(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            Ok(ActionEvent::empty())
        }

        fn undo(&mut self, _universe: &mut Universe) -> ActionResult<ActionEvent> {
            Ok(ActionEvent::empty())
        }

        fn description(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn drain_preserves_order_and_empties() {
        let queue = ActionQueue::new();
        queue.push(Box::new(Tagged("first")));
        queue.push(Box::new(Tagged("second")));
        assert!(!queue.is_empty());

        let drained = queue.drain();
        let tags: Vec<&str> = drained.iter().map(|a| a.description()).collect();
        assert_eq!(tags, vec!["first", "second"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn push_from_other_threads() {
        use std::sync::Arc;

        let queue = Arc::new(ActionQueue::new());
        let mut joins = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&queue);
            joins.push(std::thread::spawn(move || {
                q.push(Box::new(Tagged("bg")));
            }));
        }
        for j in joins {
            j.join().unwrap();
        }
        assert_eq!(queue.drain().len(), 4);
    }
}
