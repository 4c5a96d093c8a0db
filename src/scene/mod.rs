//! Scene-graph data model: entities, containers, and the universe owning them.
//!
//! - [`Universe`] — per-document owner of the entity arena, container
//!   table, and selection; the single mutation surface for graph linkage
//! - [`Entity`] / [`EntityId`] — a node wrapping one [`ObjectData`]
//! - [`ObjectContainer`] / [`ContainerId`] — named ordered scope of entities
//! - [`ObjectData`] / [`PropertyValue`] — the closed set of wrapped object
//!   kinds and their property values
//! - [`Transform`] — TRS transform read from entity properties

mod container;
mod data;
mod entity;
mod transform;
mod universe;

pub use container::ObjectContainer;
pub use data::{GenericObject, MergedRow, ObjectData, ParamRow, PropertyValue};
pub use entity::{ContainerId, Entity, EntityId};
pub use transform::Transform;
pub(crate) use transform::rad_to_deg;
pub use universe::Universe;
