//! Group-by-string, aggregate-by-integer.

use crate::table::Table;
use crate::table_data::TableData;
use hashbrown::HashMap;
use strata_core::{DataType, Error, Result, Value};

/// Aggregate applied to each pivot group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PivotType {
    /// Number of rows in the group.
    Count,
    Sum,
    Average,
    Min,
    Max,
}

#[derive(Default)]
struct Accumulator {
    rows: i64,
    values: usize,
    sum: i64,
    min: Option<i64>,
    max: Option<i64>,
}

impl Accumulator {
    fn add(&mut self, value: Option<i64>) {
        self.rows += 1;
        let Some(v) = value else { return };
        self.values += 1;
        self.sum = self.sum.wrapping_add(v);
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }

    fn result(&self, op: PivotType) -> Value {
        match op {
            PivotType::Count => Value::Integer(self.rows),
            PivotType::Sum => Value::Integer(self.sum),
            PivotType::Average if self.values == 0 => Value::Double(0.0),
            PivotType::Average => Value::Double(self.sum as f64 / self.values as f64),
            PivotType::Min => Value::from(self.min),
            PivotType::Max => Value::from(self.max),
        }
    }
}

/// Per-group results of a pivot, in first-appearance order.
pub(crate) struct PivotGroups {
    group_name: String,
    value_name: String,
    op: PivotType,
    groups: Vec<(Option<String>, Accumulator)>,
}

pub(crate) fn compute(
    t: &TableData,
    group_col: usize,
    value_col: usize,
    op: PivotType,
) -> Result<PivotGroups> {
    let group_def = t.column_def(group_col)?;
    let value_def = t.column_def(value_col)?;
    if group_def.data_type() != DataType::String || value_def.data_type() != DataType::Integer {
        return Err(Error::unsupported(format!(
            "pivot needs a String group column and an Integer value column, got {} and {}",
            group_def.data_type(),
            value_def.data_type()
        )));
    }
    let (Some(keys), Some(values)) = (
        t.column(group_col).as_strings(),
        t.column(value_col).as_integers(),
    ) else {
        return Err(Error::unsupported("pivot columns have unexpected storage"));
    };

    let mut positions: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<(Option<String>, Accumulator)> = Vec::new();
    for (key, value) in keys.iter().zip(values) {
        let key = key.as_deref();
        let pos = *positions.entry(key).or_insert_with(|| {
            groups.push((key.map(str::to_string), Accumulator::default()));
            groups.len() - 1
        });
        groups[pos].1.add(*value);
    }

    Ok(PivotGroups {
        group_name: group_def.name().to_string(),
        value_name: value_def.name().to_string(),
        op,
        groups,
    })
}

impl PivotGroups {
    /// Materializes the groups as a new standalone table.
    pub(crate) fn into_table(self) -> Result<Table> {
        let table = Table::new();
        let null_group = self.groups.iter().any(|(key, _)| key.is_none());
        table.add_column(DataType::String, &self.group_name, null_group)?;
        let (value_type, nullable) = match self.op {
            PivotType::Average => (DataType::Double, false),
            PivotType::Min | PivotType::Max => (DataType::Integer, true),
            PivotType::Count | PivotType::Sum => (DataType::Integer, false),
        };
        table.add_column(value_type, &self.value_name, nullable)?;
        for (key, acc) in &self.groups {
            table.add_row(vec![Value::from(key.clone()), acc.result(self.op)])?;
        }
        Ok(table)
    }
}
