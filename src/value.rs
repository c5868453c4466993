// Copyright 2025 Cowboy AI, LLC.

//! Live values produced by the deserializer
//!
//! [`Value`] is the in-memory counterpart of a [`Node`](crate::Node): where a
//! node only knows its shape, a value knows its semantic type (enums carry
//! their type name, objects are concrete [`DomainObject`]s, 2-D arrays are
//! rectangular [`Grid`]s).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::errors::{SerializationError, SerializationResult};
use crate::fragment::FragmentSet;
use crate::object::DomainObject;
use crate::registry::{SemanticType, TypeRegistry};

/// String-keyed fallback store for fields without a declared property
pub type CustomData = IndexMap<String, Value>;

/// A rectangular two dimensional array stored row-major
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid<T> {
    rows: usize,
    columns: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Create a grid from row-major cells
    ///
    /// # Errors
    ///
    /// Returns an error if `cells.len() != rows * columns`
    pub fn new(rows: usize, columns: usize, cells: Vec<T>) -> SerializationResult<Self> {
        if rows.checked_mul(columns) != Some(cells.len()) {
            return Err(SerializationError::conversion(format!(
                "{} cells cannot fill a {rows}x{columns} grid",
                cells.len()
            )));
        }
        Ok(Self { rows, columns, cells })
    }

    /// Pack rows into a grid `columns` wide, filling missing trailing cells
    ///
    /// Rows longer than `columns` are truncated.
    pub fn from_rows_padded<F>(rows: Vec<Vec<T>>, columns: usize, mut fill: F) -> Self
    where
        F: FnMut() -> T,
    {
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * columns);
        for row in rows {
            let len = row.len().min(columns);
            cells.extend(row.into_iter().take(columns));
            cells.extend((len..columns).map(|_| fill()));
        }
        Self {
            rows: row_count,
            columns,
            cells,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cell at `(row, column)`
    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row < self.rows && column < self.columns {
            self.cells.get(row * self.columns + column)
        } else {
            None
        }
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            let start = row * self.columns;
            Some(&self.cells[start..start + self.columns])
        } else {
            None
        }
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.rows).filter_map(move |r| self.row(r))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Convert every cell
    pub fn try_map<U, F>(self, f: F) -> SerializationResult<Grid<U>>
    where
        F: FnMut(T) -> SerializationResult<U>,
    {
        let cells = self.cells.into_iter().map(f).collect::<SerializationResult<Vec<U>>>()?;
        Ok(Grid {
            rows: self.rows,
            columns: self.columns,
            cells,
        })
    }
}

/// A deserialised value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Globally unique identifier
    Guid(Uuid),
    /// Point in time
    DateTime(DateTime<Utc>),
    /// Variant of a registered enumeration
    Enum {
        /// Registered enum name
        type_name: String,
        /// Canonical variant name
        variant: String,
    },
    /// Raw bytes
    Binary(Bytes),
    /// One dimensional array or list
    Array(Vec<Value>),
    /// Rectangular two dimensional array
    Grid(Grid<Value>),
    /// String-keyed dictionary
    Map(CustomData),
    /// Type-keyed fragment collection
    FragmentSet(FragmentSet),
    /// Domain object
    Object(Box<dyn DomainObject>),
}

impl Value {
    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short label of the value's type, used in diagnostics
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Guid(_) => "Guid".to_string(),
            Value::DateTime(_) => "DateTime".to_string(),
            Value::Enum { type_name, .. } => type_name.clone(),
            Value::Binary(_) => "Binary".to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Grid(_) => "Grid".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::FragmentSet(_) => "FragmentSet".to_string(),
            Value::Object(obj) => short_type_name(obj.type_name()).to_string(),
        }
    }

    /// Borrow the domain object, if any
    pub fn as_object(&self) -> Option<&dyn DomainObject> {
        match self {
            Value::Object(obj) => Some(obj.as_ref()),
            _ => None,
        }
    }

    /// Borrow the object as a concrete type
    pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
        self.as_object().and_then(|obj| obj.downcast_ref::<T>())
    }

    /// Move the object out as a concrete type
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the value is not an object of type `T`
    pub fn into_object<T: DomainObject>(self) -> SerializationResult<T> {
        match self {
            Value::Object(obj) => {
                let label = obj.type_name();
                obj.into_any().downcast::<T>().map(|b| *b).map_err(|_| {
                    SerializationError::conversion(format!(
                        "expected {} but found {}",
                        std::any::type_name::<T>(),
                        label
                    ))
                })
            }
            other => Err(SerializationError::conversion(format!(
                "expected {} but found {}",
                std::any::type_name::<T>(),
                other.type_label()
            ))),
        }
    }

    /// Borrow as a map
    pub fn as_map(&self) -> Option<&CustomData> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value can be assigned to a property declared as `ty`
    pub fn conforms_to(&self, ty: &SemanticType, registry: &TypeRegistry) -> bool {
        registry.conforms(self, ty)
    }
}

pub(crate) fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
    &name[start..]
}

/// Conversion of Rust field types into [`Value`]
pub trait IntoValue {
    /// Convert into a live value
    fn into_value(self) -> Value;
}

/// Conversion of [`Value`] back into Rust field types
///
/// Null converts to `None` for options and to the empty value for strings,
/// byte buffers and collections, since those properties are nullable.
pub trait FromValue: Sized {
    /// Convert from a live value
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the value has another type
    fn from_value(value: Value) -> SerializationResult<Self>;
}

fn mismatch<T>(value: &Value) -> SerializationError {
    SerializationError::conversion(format!(
        "cannot convert {} into {}",
        value.type_label(),
        std::any::type_name::<T>()
    ))
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> SerializationResult<Self> {
        Ok(value)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Int(i) => i32::try_from(i)
                .map_err(|_| SerializationError::conversion(format!("{i} is out of range for i32"))),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Int(i) => u32::try_from(i)
                .map_err(|_| SerializationError::conversion(format!("{i} is out of range for u32"))),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for Uuid {
    fn into_value(self) -> Value {
        Value::Guid(self)
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Guid(g) => Ok(g),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::DateTime(self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::DateTime(t) => Ok(t),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Value {
        Value::Binary(self)
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Binary(b) => Ok(b),
            Value::Null => Ok(Bytes::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for FragmentSet {
    fn into_value(self) -> Value {
        Value::FragmentSet(self)
    }
}

impl FromValue for FragmentSet {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::FragmentSet(set) => Ok(set),
            Value::Null => Ok(FragmentSet::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoValue for Box<dyn DomainObject> {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for Box<dyn DomainObject> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Grid<T> {
    fn into_value(self) -> Value {
        Value::Grid(Grid {
            rows: self.rows,
            columns: self.columns,
            cells: self.cells.into_iter().map(IntoValue::into_value).collect(),
        })
    }
}

impl<T: FromValue> FromValue for Grid<T> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Grid(grid) => grid.try_map(T::from_value),
            Value::Null => Ok(Grid {
                rows: 0,
                columns: 0,
                cells: Vec::new(),
            }),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: IntoValue> IntoValue for IndexMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            Value::Null => Ok(IndexMap::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_padding() {
        let grid = Grid::from_rows_padded(vec![vec![1, 2, 3], vec![4, 5]], 3, || 0);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.get(1, 2), Some(&0));
        assert_eq!(grid.row(0), Some(&[1, 2, 3][..]));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_grid_new_checks_dimensions() {
        assert!(Grid::new(2, 2, vec![1, 2, 3]).is_err());
        let grid = Grid::new(1, 3, vec![1, 2, 3]).unwrap();
        assert_eq!(grid.iter_rows().count(), 1);
    }

    #[test]
    fn test_option_and_vec_conversion() {
        let value = vec![Some(1i64), None].into_value();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Null]));
        let back: Vec<Option<i64>> = FromValue::from_value(value).unwrap();
        assert_eq!(back, vec![Some(1), None]);
    }

    #[test]
    fn test_float_accepts_int() {
        assert_eq!(f64::from_value(Value::Int(3)).unwrap(), 3.0);
        assert!(i64::from_value(Value::Float(3.5)).is_err());
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_crate::structure::Bar"), "Bar");
        assert_eq!(short_type_name("Bar"), "Bar");
    }
}
