//! Wrapped object data behind every entity.
//!
//! The editor manipulates heterogeneous underlying objects: generic map
//! objects with named properties, parameter rows with ordered cells, and
//! merged rows that present several parameter rows as one object. Rather
//! than dispatching on runtime types, the whole family is a closed tagged
//! variant — [`ObjectData`] — with exhaustive matches in the field lookup
//! and name resolution paths.

use nalgebra::Vector3;

/// A single property value.
///
/// `Array` holds indexable slots (e.g. draw-group words); `EntityRef` is a
/// by-name reference to another entity in the same container, used to build
/// the entity reference map.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(String),
    Vec3(Vector3<f32>),
    EntityRef(String),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns the inner float, converting from `Int` if needed.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Returns the inner vector for `Vec3` values.
    pub fn as_vec3(&self) -> Option<Vector3<f32>> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner string for `String` and `EntityRef` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::EntityRef(s) => Some(s),
            _ => None,
        }
    }
}

/// A generic map object: a name plus an ordered list of named properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericObject {
    fields: Vec<(String, PropertyValue)>,
}

impl GenericObject {
    /// Creates an object with a `Name` property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            fields: vec![("Name".to_string(), PropertyValue::String(name.into()))],
        }
    }

    /// Adds or replaces a property, returning `self` for chained setup.
    pub fn with_field(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&PropertyValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Adds or replaces a property.
    pub fn set_field(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.field_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Iterates properties in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// A parameter row: numeric id, display name, ordered cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRow {
    pub id: i64,
    pub name: String,
    cells: Vec<(String, PropertyValue)>,
}

impl ParamRow {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn with_cell(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.cells.push((name.into(), value));
        self
    }

    pub fn cell(&self, name: &str) -> Option<&PropertyValue> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn cell_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.cells
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Replaces an existing cell or appends a new one.
    pub fn set_cell(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.cell_mut(&name) {
            Some(slot) => *slot = value,
            None => self.cells.push((name, value)),
        }
    }
}

/// Several parameter rows presented as one logical object.
///
/// Field lookup scans the sub-rows in order and resolves to the first row
/// that carries a matching cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub name: String,
    rows: Vec<(String, ParamRow)>,
}

impl MergedRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, label: impl Into<String>, row: ParamRow) -> Self {
        self.rows.push((label.into(), row));
        self
    }

    pub fn cell(&self, name: &str) -> Option<&PropertyValue> {
        self.rows.iter().find_map(|(_, r)| r.cell(name))
    }

    pub fn cell_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.rows.iter_mut().find_map(|(_, r)| r.cell_mut(name))
    }
}

/// The closed set of object kinds an entity can wrap.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Generic(GenericObject),
    ParamRow(ParamRow),
    MergedRow(MergedRow),
}

impl ObjectData {
    /// The entity name derived from the wrapped data.
    ///
    /// Generic objects store it in their `Name` property; rows carry it
    /// directly.
    pub fn name(&self) -> &str {
        match self {
            Self::Generic(o) => o
                .field("Name")
                .and_then(PropertyValue::as_str)
                .unwrap_or(""),
            Self::ParamRow(r) => &r.name,
            Self::MergedRow(m) => &m.name,
        }
    }

    /// Writes the entity name back into the wrapped data.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self {
            Self::Generic(o) => o.set_field("Name", PropertyValue::String(name)),
            Self::ParamRow(r) => r.name = name,
            Self::MergedRow(m) => m.name = name,
        }
    }

    /// Looks up a property/cell by name.
    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        match self {
            Self::Generic(o) => o.field(field),
            Self::ParamRow(r) => r.cell(field),
            Self::MergedRow(m) => m.cell(field),
        }
    }

    /// Looks up a property/cell slot for mutation.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut PropertyValue> {
        match self {
            Self::Generic(o) => o.field_mut(field),
            Self::ParamRow(r) => r.cell_mut(field),
            Self::MergedRow(m) => m.cell_mut(field),
        }
    }

    /// Adds or replaces a property/cell. Merged rows write to the first
    /// sub-row carrying the cell, or add it to the first sub-row.
    pub fn set_field(&mut self, field: impl Into<String>, value: PropertyValue) {
        match self {
            Self::Generic(o) => o.set_field(field, value),
            Self::ParamRow(r) => r.set_cell(field, value),
            Self::MergedRow(m) => {
                let field = field.into();
                match m.cell_mut(&field) {
                    Some(slot) => *slot = value,
                    None => {
                        if let Some((_, row)) = m.rows.first_mut() {
                            row.set_cell(field, value);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_object_name_round_trip() {
        let mut data = ObjectData::Generic(GenericObject::new("enemy_0001"));
        assert_eq!(data.name(), "enemy_0001");
        data.set_name("enemy_0002");
        assert_eq!(data.name(), "enemy_0002");
    }

    #[test]
    fn param_row_cells() {
        let row = ParamRow::new(1000, "spawn")
            .with_cell("PositionX", PropertyValue::Float(1.0))
            .with_cell("PositionY", PropertyValue::Float(2.0));
        let data = ObjectData::ParamRow(row);
        assert_eq!(data.get("PositionY"), Some(&PropertyValue::Float(2.0)));
        assert_eq!(data.get("PositionZ"), None);
        assert_eq!(data.name(), "spawn");
    }

    #[test]
    fn merged_row_scans_sub_rows_in_order() {
        let merged = MergedRow::new("generator")
            .with_row(
                "location",
                ParamRow::new(1, "loc").with_cell("PositionX", PropertyValue::Float(5.0)),
            )
            .with_row(
                "regist",
                ParamRow::new(2, "reg")
                    .with_cell("PositionX", PropertyValue::Float(9.0))
                    .with_cell("EnemyId", PropertyValue::Int(42)),
            );
        let data = ObjectData::MergedRow(merged);
        // First sub-row wins for duplicated cells.
        assert_eq!(data.get("PositionX"), Some(&PropertyValue::Float(5.0)));
        assert_eq!(data.get("EnemyId"), Some(&PropertyValue::Int(42)));
    }

    #[test]
    fn set_field_replaces_in_place() {
        let mut obj = GenericObject::new("a").with_field("Health", PropertyValue::Int(10));
        obj.set_field("Health", PropertyValue::Int(20));
        assert_eq!(obj.field("Health"), Some(&PropertyValue::Int(20)));
        assert_eq!(obj.fields().count(), 2);
    }

    #[test]
    fn deep_clone_is_independent() {
        let data = ObjectData::Generic(
            GenericObject::new("a").with_field(
                "DrawGroups",
                PropertyValue::Array(vec![PropertyValue::Int(1), PropertyValue::Int(2)]),
            ),
        );
        let mut copy = data.clone();
        if let Some(PropertyValue::Array(slots)) = copy.get_mut("DrawGroups") {
            slots[0] = PropertyValue::Int(99);
        }
        assert_eq!(
            data.get("DrawGroups"),
            Some(&PropertyValue::Array(vec![
                PropertyValue::Int(1),
                PropertyValue::Int(2)
            ]))
        );
    }
}
