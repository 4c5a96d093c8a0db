//! Property edits: typed field accessors and the staged-changes action.

use std::fmt;

use crate::scene::{EntityId, ObjectData, PropertyValue, Transform, Universe};

use super::{Action, ActionError, ActionEvent, ActionResult, CompoundAction};

/// A resolved accessor for one field of an [`ObjectData`], selected once at
/// action-construction time.
///
/// `index` addresses a slot of a [`PropertyValue::Array`] field. A missing
/// field, an index on a non-array field, or an out-of-range index is a
/// [`Mutation`](ActionError::Mutation) error.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccessor {
    field: String,
    index: Option<usize>,
}

impl FieldAccessor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            index: None,
        }
    }

    /// Accessor for one slot of an array field.
    pub fn indexed(field: impl Into<String>, index: usize) -> Self {
        Self {
            field: field.into(),
            index: Some(index),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn get(&self, data: &ObjectData) -> ActionResult<PropertyValue> {
        let value = data
            .get(&self.field)
            .ok_or_else(|| ActionError::Mutation(format!("no field `{}`", self.field)))?;
        match self.index {
            None => Ok(value.clone()),
            Some(i) => match value {
                PropertyValue::Array(slots) => slots.get(i).cloned().ok_or_else(|| {
                    ActionError::Mutation(format!(
                        "index {i} out of range for `{}` of {} slots",
                        self.field,
                        slots.len()
                    ))
                }),
                _ => Err(ActionError::Mutation(format!(
                    "field `{}` is not an array",
                    self.field
                ))),
            },
        }
    }

    pub fn set(&self, data: &mut ObjectData, value: PropertyValue) -> ActionResult<()> {
        let slot = data
            .get_mut(&self.field)
            .ok_or_else(|| ActionError::Mutation(format!("no field `{}`", self.field)))?;
        match self.index {
            None => {
                *slot = value;
                Ok(())
            }
            Some(i) => match slot {
                PropertyValue::Array(slots) => {
                    let len = slots.len();
                    let cell = slots.get_mut(i).ok_or_else(|| {
                        ActionError::Mutation(format!(
                            "index {i} out of range for `{}` of {len} slots",
                            self.field
                        ))
                    })?;
                    *cell = value;
                    Ok(())
                }
                _ => Err(ActionError::Mutation(format!(
                    "field `{}` is not an array",
                    self.field
                ))),
            },
        }
    }
}

#[derive(Debug)]
struct PropertyChange {
    entity: EntityId,
    accessor: FieldAccessor,
    old_value: PropertyValue,
    new_value: PropertyValue,
}

/// Writes a batch of staged property changes as one undo step.
///
/// Old values are snapshotted eagerly when a change is staged, so the
/// action is reversible no matter what happens to the fields in between
/// staging and execution. Multiple staged changes apply and roll back as a
/// unit — this is the minimal compound action.
///
/// # Live-edit coalescing
///
/// A widget that mutates a value every frame while a control is held should
/// not push a stack entry per frame: execute the first edit, then while the
/// control is held find it again via
/// [`ActionManager::peek_undo_mut`](super::ActionManager::peek_undo_mut),
/// downcast, and [`amend_new_value`](Self::amend_new_value). The edit
/// becomes a permanent single stack entry on commit (pointer release).
pub struct PropertiesChangedAction {
    changes: Vec<PropertyChange>,
    post_execute: Option<Box<dyn FnMut(bool) + Send>>,
}

impl Default for PropertiesChangedAction {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesChangedAction {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            post_execute: None,
        }
    }

    /// Convenience constructor for a single staged change.
    pub fn single(
        universe: &Universe,
        entity: EntityId,
        accessor: FieldAccessor,
        new_value: PropertyValue,
    ) -> ActionResult<Self> {
        let mut action = Self::new();
        action.add_change(universe, entity, accessor, new_value)?;
        Ok(action)
    }

    /// Stages a change, snapshotting the old value now.
    pub fn add_change(
        &mut self,
        universe: &Universe,
        entity: EntityId,
        accessor: FieldAccessor,
        new_value: PropertyValue,
    ) -> ActionResult<()> {
        let e = universe
            .entity(entity)
            .ok_or_else(|| ActionError::Mutation("target entity no longer exists".into()))?;
        let old_value = accessor.get(&e.data)?;
        self.changes.push(PropertyChange {
            entity,
            accessor,
            old_value,
            new_value,
        });
        Ok(())
    }

    /// Overwrites the staged new value of change `index`, for live-edit
    /// coalescing of an uncommitted action.
    pub fn amend_new_value(&mut self, index: usize, value: PropertyValue) -> ActionResult<()> {
        let change = self.changes.get_mut(index).ok_or_else(|| {
            ActionError::Mutation(format!("no staged change at index {index}"))
        })?;
        change.new_value = value;
        Ok(())
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Registers a callback invoked after either direction, with `true` for
    /// the undo direction — typically a derived-visual refresh.
    pub fn set_post_execution(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.post_execute = Some(Box::new(callback));
    }

    fn apply(&mut self, universe: &mut Universe, is_undo: bool) -> ActionResult<ActionEvent> {
        for change in &self.changes {
            let e = universe
                .entity_mut(change.entity)
                .ok_or_else(|| ActionError::Mutation("target entity no longer exists".into()))?;
            let value = if is_undo {
                change.old_value.clone()
            } else {
                change.new_value.clone()
            };
            change.accessor.set(&mut e.data, value)?;
            if let Some(container) = e.container() {
                universe.mark_dirty(container);
            }
        }
        if let Some(callback) = &mut self.post_execute {
            callback(is_undo);
        }
        Ok(ActionEvent::empty())
    }
}

impl Action for PropertiesChangedAction {
    fn execute(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        self.apply(universe, false)
    }

    fn undo(&mut self, universe: &mut Universe) -> ActionResult<ActionEvent> {
        self.apply(universe, true)
    }

    fn description(&self) -> &str {
        "Change properties"
    }
}

impl fmt::Debug for PropertiesChangedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesChangedAction")
            .field("changes", &self.changes)
            .field("has_post_execute", &self.post_execute.is_some())
            .finish()
    }
}

/// Builds the action that moves an entity to a new transform.
///
/// Generic objects get one [`PropertiesChangedAction`] over their
/// `Position`/`Rotation` vectors; row-backed objects get a
/// [`CompoundAction`] of per-axis cell writes, with missing cells skipped
/// (rows don't all carry every axis). Rotation is written back in degrees.
pub fn update_transform_action(
    universe: &Universe,
    entity: EntityId,
    new_transform: Transform,
) -> ActionResult<Box<dyn Action>> {
    let e = universe
        .entity(entity)
        .ok_or_else(|| ActionError::Mutation("target entity no longer exists".into()))?;
    let rotation_deg = new_transform.rotation.map(crate::scene::rad_to_deg);

    match &e.data {
        ObjectData::ParamRow(_) | ObjectData::MergedRow(_) => {
            let cells: [(&str, f32); 6] = [
                ("PositionX", new_transform.position.x),
                ("PositionY", new_transform.position.y),
                ("PositionZ", new_transform.position.z),
                ("RotationX", rotation_deg.x),
                ("RotationY", rotation_deg.y),
                ("RotationZ", rotation_deg.z),
            ];
            let sub_actions: Vec<Option<Box<dyn Action>>> = cells
                .into_iter()
                .map(|(cell, value)| {
                    PropertiesChangedAction::single(
                        universe,
                        entity,
                        FieldAccessor::new(cell),
                        PropertyValue::Float(value),
                    )
                    .ok()
                    .map(|a| Box::new(a) as Box<dyn Action>)
                })
                .collect();
            Ok(Box::new(CompoundAction::from_optional(sub_actions)))
        }
        ObjectData::Generic(_) => {
            let mut action = PropertiesChangedAction::new();
            action.add_change(
                universe,
                entity,
                FieldAccessor::new("Position"),
                PropertyValue::Vec3(new_transform.position),
            )?;
            // Not every object has a rotation.
            let rotation = FieldAccessor::new("Rotation");
            if rotation.get(&e.data).is_ok() {
                action.add_change(
                    universe,
                    entity,
                    rotation,
                    PropertyValue::Vec3(rotation_deg),
                )?;
            }
            Ok(Box::new(action))
        }
    }
}
