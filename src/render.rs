//! Interface boundary to the render scene.
//!
//! Entities may carry a visual proxy — a handle to renderable state owned by
//! an external render scene. Actions toggle registration around structural
//! changes (delete unregisters, undo re-registers, clones get copies) but
//! never own the proxy's rendering behavior.

use std::fmt;

/// A renderable stand-in for an entity in an external render scene.
///
/// The contract mirrors how the editor drives renderables:
///
/// - [`register`](Self::register) / [`unregister`](Self::unregister) attach
///   and detach the proxy from the scene without destroying GPU state.
/// - [`set_auto_register`](Self::set_auto_register) controls whether the
///   proxy re-attaches itself when its resources finish (re)loading.
/// - [`set_selection_outline`](Self::set_selection_outline) toggles the
///   selection highlight; driven by selection changes only.
/// - [`dispose`](Self::dispose) releases backing resources for good.
pub trait VisualProxy: fmt::Debug + Send {
    fn register(&mut self);
    fn unregister(&mut self);
    fn dispose(&mut self);
    fn is_registered(&self) -> bool;
    fn set_auto_register(&mut self, auto: bool);
    fn auto_register(&self) -> bool;
    fn set_selection_outline(&mut self, on: bool);
    /// Duplicates the proxy for a cloned entity.
    fn clone_proxy(&self) -> Box<dyn VisualProxy>;
}

/// A proxy implementation that only tracks state.
///
/// Used in tests and headless sessions; a real editor supplies proxies
/// backed by its render scene.
#[derive(Debug, Clone, Default)]
pub struct DebugVisualProxy {
    registered: bool,
    auto_register: bool,
    outline: bool,
    disposed: bool,
}

impl DebugVisualProxy {
    pub fn new() -> Self {
        Self {
            registered: true,
            auto_register: true,
            ..Self::default()
        }
    }

    pub fn has_selection_outline(&self) -> bool {
        self.outline
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl VisualProxy for DebugVisualProxy {
    fn register(&mut self) {
        self.registered = true;
    }

    fn unregister(&mut self) {
        self.registered = false;
    }

    fn dispose(&mut self) {
        self.registered = false;
        self.disposed = true;
    }

    fn is_registered(&self) -> bool {
        self.registered
    }

    fn set_auto_register(&mut self, auto: bool) {
        self.auto_register = auto;
    }

    fn auto_register(&self) -> bool {
        self.auto_register
    }

    fn set_selection_outline(&mut self, on: bool) {
        self.outline = on;
    }

    fn clone_proxy(&self) -> Box<dyn VisualProxy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_cycle() {
        let mut proxy = DebugVisualProxy::new();
        assert!(proxy.is_registered());
        proxy.unregister();
        assert!(!proxy.is_registered());
        proxy.register();
        assert!(proxy.is_registered());
    }

    #[test]
    fn clone_proxy_copies_state() {
        let mut proxy = DebugVisualProxy::new();
        proxy.set_auto_register(false);
        let copy = proxy.clone_proxy();
        assert!(!copy.auto_register());
        assert!(copy.is_registered());
    }

    #[test]
    fn dispose_is_terminal() {
        let mut proxy = DebugVisualProxy::new();
        proxy.dispose();
        assert!(!proxy.is_registered());
        assert!(proxy.is_disposed());
    }
}
