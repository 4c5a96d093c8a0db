//! Scene-graph entities.
//!
//! An [`Entity`] is a node wrapping one [`ObjectData`]. It participates in
//! two orderings at once: the flat, ordered membership list of its
//! [`ObjectContainer`](super::ObjectContainer) (the canonical ownership,
//! render/serialization order), and the parent/child tree rooted at the
//! container's root entity (back-references only — parents never own their
//! children uniquely).
//!
//! Linkage fields (`parent`, `children`, `container`) are maintained
//! exclusively by [`Universe`](super::Universe) graph operations so the two
//! relations can never drift apart; entities expose them read-only.

use std::collections::HashMap;

use slotmap::new_key_type;

use super::data::{ObjectData, PropertyValue};
use super::transform::{Transform, deg_to_rad};
use crate::render::VisualProxy;

new_key_type! {
    /// Stable handle to an entity in a [`Universe`](super::Universe).
    ///
    /// Slots are never freed while an editing session is live, so ids held
    /// by undo-stack actions stay valid across detach/re-attach cycles.
    pub struct EntityId;
}

new_key_type! {
    /// Stable handle to an object container.
    pub struct ContainerId;
}

/// A node in the scene graph.
#[derive(Debug)]
pub struct Entity {
    pub data: ObjectData,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) container: Option<ContainerId>,
    /// Property name -> entities that property references, rebuilt lazily.
    pub(crate) references: HashMap<String, Vec<EntityId>>,
    /// Entities whose reference map points at this one; invalidated on any
    /// graph change.
    pub(crate) referencing_cache: Option<Vec<EntityId>>,
    proxy: Option<Box<dyn VisualProxy>>,
}

impl Entity {
    pub fn new(data: ObjectData, container: Option<ContainerId>) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            container,
            references: HashMap::new(),
            referencing_cache: None,
            proxy: None,
        }
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.data.set_name(name);
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    /// Property name -> referenced entities, as last built by
    /// [`Universe::build_reference_map`](super::Universe::build_reference_map).
    pub fn references(&self) -> &HashMap<String, Vec<EntityId>> {
        &self.references
    }

    pub fn proxy(&self) -> Option<&dyn VisualProxy> {
        self.proxy.as_deref()
    }

    pub fn proxy_mut(&mut self) -> Option<&mut (dyn VisualProxy + 'static)> {
        self.proxy.as_deref_mut()
    }

    /// Installs a visual proxy, disposing any previous one.
    pub fn set_proxy(&mut self, proxy: Box<dyn VisualProxy>) {
        if let Some(old) = self.proxy.as_deref_mut() {
            old.dispose();
        }
        self.proxy = Some(proxy);
    }

    /// Makes a detached copy: deep-cloned data, duplicated proxy, no parent,
    /// no children, same container designation, not filed anywhere.
    pub(crate) fn duplicate(&self) -> Entity {
        Entity {
            data: self.data.clone(),
            parent: None,
            children: Vec::new(),
            container: self.container,
            references: HashMap::new(),
            referencing_cache: None,
            proxy: self.proxy.as_ref().map(|p| p.clone_proxy()),
        }
    }

    /// Reads the local transform out of the wrapped data.
    ///
    /// Generic objects carry `Position`/`Rotation`/`Scale` vectors; row-backed
    /// objects carry per-axis cells (`PositionX` ...). Rotation in the data is
    /// degrees. Missing properties fall back to the identity components.
    pub fn local_transform(&self) -> Transform {
        let mut t = Transform::default();

        if let Some(pos) = self.data.get("Position").and_then(PropertyValue::as_vec3) {
            t.position = pos;
        } else {
            for (slot, axis) in ["PositionX", "PositionY", "PositionZ"].into_iter().enumerate() {
                if let Some(v) = self.data.get(axis).and_then(PropertyValue::as_float) {
                    t.position[slot] = v;
                }
            }
        }

        if let Some(rot) = self.data.get("Rotation").and_then(PropertyValue::as_vec3) {
            t.rotation = rot.map(deg_to_rad);
        } else {
            for (slot, axis) in ["RotationX", "RotationY", "RotationZ"].into_iter().enumerate() {
                if let Some(v) = self.data.get(axis).and_then(PropertyValue::as_float) {
                    t.rotation[slot] = deg_to_rad(v);
                }
            }
        }

        if let Some(scale) = self.data.get("Scale").and_then(PropertyValue::as_vec3) {
            t.scale = scale;
        } else {
            for (slot, axis) in ["ScaleX", "ScaleY", "ScaleZ"].into_iter().enumerate() {
                if let Some(v) = self.data.get(axis).and_then(PropertyValue::as_float) {
                    t.scale[slot] = v;
                }
            }
        }

        t
    }
}
