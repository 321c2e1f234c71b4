//! Typed column storage.
//!
//! Each column keeps its cells in one homogeneous vector. A cell of a
//! nullable scalar column is `None` when null; non-nullable columns never
//! hold `None` (link cells are the exception, a link may always be empty).

use strata_core::{DataType, Error, Result, RowIndex, Value};

/// Cell vector of one column.
#[derive(Clone, Debug)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Boolean(Vec<Option<bool>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Timestamp(Vec<Option<i64>>),
    Binary(Vec<Option<Vec<u8>>>),
    Link(Vec<Option<RowIndex>>),
    LinkList(Vec<Vec<RowIndex>>),
    Mixed(Vec<Value>),
}

/// Runs the same expression against whichever cell vector backs the column.
macro_rules! with_cells {
    ($data:expr, $cells:ident => $body:expr) => {
        match $data {
            ColumnData::Integer($cells) => $body,
            ColumnData::Boolean($cells) => $body,
            ColumnData::Float($cells) => $body,
            ColumnData::Double($cells) => $body,
            ColumnData::String($cells) => $body,
            ColumnData::Timestamp($cells) => $body,
            ColumnData::Binary($cells) => $body,
            ColumnData::Link($cells) => $body,
            ColumnData::LinkList($cells) => $body,
            ColumnData::Mixed($cells) => $body,
        }
    };
}

impl ColumnData {
    /// Creates a column of `rows` fresh cells.
    pub fn new(data_type: DataType, nullable: bool, rows: usize) -> Self {
        let mut column = Self::empty(data_type);
        column.push_defaults(rows, nullable);
        column
    }

    fn empty(data_type: DataType) -> Self {
        match data_type {
            DataType::Integer => ColumnData::Integer(Vec::new()),
            DataType::Boolean => ColumnData::Boolean(Vec::new()),
            DataType::Float => ColumnData::Float(Vec::new()),
            DataType::Double => ColumnData::Double(Vec::new()),
            DataType::String => ColumnData::String(Vec::new()),
            DataType::Timestamp => ColumnData::Timestamp(Vec::new()),
            DataType::Binary => ColumnData::Binary(Vec::new()),
            DataType::Link => ColumnData::Link(Vec::new()),
            DataType::LinkList => ColumnData::LinkList(Vec::new()),
            DataType::Mixed => ColumnData::Mixed(Vec::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Integer(_) => DataType::Integer,
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Float(_) => DataType::Float,
            ColumnData::Double(_) => DataType::Double,
            ColumnData::String(_) => DataType::String,
            ColumnData::Timestamp(_) => DataType::Timestamp,
            ColumnData::Binary(_) => DataType::Binary,
            ColumnData::Link(_) => DataType::Link,
            ColumnData::LinkList(_) => DataType::LinkList,
            ColumnData::Mixed(_) => DataType::Mixed,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_cells!(self, cells => cells.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves room for `additional` cells.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        with_cells!(self, cells => cells.try_reserve(additional))
            .map_err(|e| Error::resource_exhausted(e.to_string()))
    }

    /// Appends `count` fresh cells.
    pub fn push_defaults(&mut self, count: usize, nullable: bool) {
        let new_len = self.len() + count;
        match self {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => {
                v.resize(new_len, (!nullable).then_some(0))
            }
            ColumnData::Boolean(v) => v.resize(new_len, (!nullable).then_some(false)),
            ColumnData::Float(v) => v.resize(new_len, (!nullable).then_some(0.0)),
            ColumnData::Double(v) => v.resize(new_len, (!nullable).then_some(0.0)),
            ColumnData::String(v) => v.resize(new_len, (!nullable).then(String::new)),
            ColumnData::Binary(v) => v.resize(new_len, (!nullable).then(Vec::new)),
            ColumnData::Link(v) => v.resize(new_len, None),
            ColumnData::LinkList(v) => v.resize(new_len, Vec::new()),
            ColumnData::Mixed(v) => v.resize(new_len, Value::Null),
        }
    }

    /// Reads a cell as a [`Value`].
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn get(&self, row: RowIndex) -> Value {
        match self {
            ColumnData::Integer(v) => v[row].map_or(Value::Null, Value::Integer),
            ColumnData::Boolean(v) => v[row].map_or(Value::Null, Value::Boolean),
            ColumnData::Float(v) => v[row].map_or(Value::Null, Value::Float),
            ColumnData::Double(v) => v[row].map_or(Value::Null, Value::Double),
            ColumnData::String(v) => v[row].clone().map_or(Value::Null, Value::String),
            ColumnData::Timestamp(v) => v[row].map_or(Value::Null, Value::Timestamp),
            ColumnData::Binary(v) => v[row].clone().map_or(Value::Null, Value::Binary),
            ColumnData::Link(v) => v[row].map_or(Value::Null, Value::Link),
            ColumnData::LinkList(v) => Value::LinkList(v[row].clone()),
            ColumnData::Mixed(v) => v[row].clone(),
        }
    }

    /// Whether a cell is null. Empty links count as null.
    pub fn is_null(&self, row: RowIndex) -> bool {
        match self {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => v[row].is_none(),
            ColumnData::Boolean(v) => v[row].is_none(),
            ColumnData::Float(v) => v[row].is_none(),
            ColumnData::Double(v) => v[row].is_none(),
            ColumnData::String(v) => v[row].is_none(),
            ColumnData::Binary(v) => v[row].is_none(),
            ColumnData::Link(v) => v[row].is_none(),
            ColumnData::LinkList(_) => false,
            ColumnData::Mixed(v) => v[row].is_null(),
        }
    }

    /// Writes a cell. The caller has already checked the value against the
    /// column definition; a mismatch here is reported as an invalid argument.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn set(&mut self, row: RowIndex, value: Value) -> Result<()> {
        match (self, value) {
            (ColumnData::Integer(v), Value::Integer(x)) => v[row] = Some(x),
            (ColumnData::Integer(v), Value::Null) => v[row] = None,
            (ColumnData::Boolean(v), Value::Boolean(x)) => v[row] = Some(x),
            (ColumnData::Boolean(v), Value::Null) => v[row] = None,
            (ColumnData::Float(v), Value::Float(x)) => v[row] = Some(x),
            (ColumnData::Float(v), Value::Null) => v[row] = None,
            (ColumnData::Double(v), Value::Double(x)) => v[row] = Some(x),
            (ColumnData::Double(v), Value::Null) => v[row] = None,
            (ColumnData::String(v), Value::String(x)) => v[row] = Some(x),
            (ColumnData::String(v), Value::Null) => v[row] = None,
            (ColumnData::Timestamp(v), Value::Timestamp(x)) => v[row] = Some(x),
            (ColumnData::Timestamp(v), Value::Null) => v[row] = None,
            (ColumnData::Binary(v), Value::Binary(x)) => v[row] = Some(x),
            (ColumnData::Binary(v), Value::Null) => v[row] = None,
            (ColumnData::Link(v), Value::Link(x)) => v[row] = Some(x),
            (ColumnData::Link(v), Value::Null) => v[row] = None,
            (ColumnData::LinkList(v), Value::LinkList(x)) => v[row] = x,
            (ColumnData::Mixed(v), x) => v[row] = x,
            (column, value) => {
                return Err(Error::invalid_argument(format!(
                    "cannot store {} in a {} column",
                    value,
                    column.data_type()
                )))
            }
        }
        Ok(())
    }

    /// Removes a cell, shifting later cells up.
    pub fn remove(&mut self, row: RowIndex) {
        with_cells!(self, cells => {
            cells.remove(row);
        })
    }

    /// Replaces a cell with the last one and shrinks the column.
    pub fn swap_remove(&mut self, row: RowIndex) {
        with_cells!(self, cells => {
            cells.swap_remove(row);
        })
    }

    pub fn clear(&mut self) {
        with_cells!(self, cells => cells.clear())
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// Replaces every null cell with the type default.
    pub fn fill_nulls(&mut self) {
        match self {
            ColumnData::Integer(v) | ColumnData::Timestamp(v) => fill(v, 0),
            ColumnData::Boolean(v) => fill(v, false),
            ColumnData::Float(v) => fill(v, 0.0),
            ColumnData::Double(v) => fill(v, 0.0),
            ColumnData::String(v) => fill(v, String::new()),
            ColumnData::Binary(v) => fill(v, Vec::new()),
            ColumnData::Link(_) | ColumnData::LinkList(_) | ColumnData::Mixed(_) => {}
        }
    }

    /// Rewrites the row positions stored in a link or link-list column.
    ///
    /// `map` returns the new position of a target row, or `None` when the
    /// target is gone. Returns whether any cell changed.
    pub fn remap_links(&mut self, map: impl Fn(RowIndex) -> Option<RowIndex>) -> bool {
        let mut changed = false;
        match self {
            ColumnData::Link(cells) => {
                for cell in cells.iter_mut() {
                    if let Some(target) = *cell {
                        let mapped = map(target);
                        if mapped != Some(target) {
                            *cell = mapped;
                            changed = true;
                        }
                    }
                }
            }
            ColumnData::LinkList(cells) => {
                for list in cells.iter_mut() {
                    let before = list.len();
                    let mut rewritten = false;
                    list.retain_mut(|target| match map(*target) {
                        Some(next) => {
                            rewritten |= next != *target;
                            *target = next;
                            true
                        }
                        None => false,
                    });
                    changed |= rewritten || list.len() != before;
                }
            }
            _ => {}
        }
        changed
    }

    pub fn as_integers(&self) -> Option<&[Option<i64>]> {
        match self {
            ColumnData::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[Option<f32>]> {
        match self {
            ColumnData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[Option<i64>]> {
        match self {
            ColumnData::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::String(v) => Some(v),
            _ => None,
        }
    }
}

fn fill<T: Clone>(cells: &mut [Option<T>], default: T) {
    for cell in cells.iter_mut().filter(|c| c.is_none()) {
        *cell = Some(default.clone());
    }
}
