//! Per-column predicates.

use crate::table_data::TableData;
use core::cmp::Ordering;
use strata_core::pattern_match::{self, Case};
use strata_core::{DataType, Error, Result, RowIndex, Value};

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        }
    }
}

/// String operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextOp {
    Contains,
    BeginsWith,
    EndsWith,
    Like,
}

/// A single predicate over one column.
#[derive(Clone, Debug)]
pub(crate) enum Condition {
    Compare {
        col: usize,
        op: CompareOp,
        value: Value,
    },
    Between {
        col: usize,
        low: Value,
        high: Value,
    },
    Null {
        col: usize,
        negate: bool,
    },
    Text {
        col: usize,
        op: TextOp,
        needle: String,
        case: Case,
    },
}

fn is_ordered_type(dt: DataType) -> bool {
    matches!(
        dt,
        DataType::Integer | DataType::Float | DataType::Double | DataType::Timestamp
    )
}

impl Condition {
    /// Builds a comparison after checking the value against the column.
    pub fn compare(t: &TableData, col: usize, op: CompareOp, value: Value) -> Result<Self> {
        let def = t.column_def(col)?;
        if op.is_ordering() {
            if !is_ordered_type(def.data_type()) {
                return Err(Error::unsupported(format!(
                    "{} column {:?} has no ordering",
                    def.data_type(),
                    def.name()
                )));
            }
            if value.is_null() {
                return Err(Error::invalid_argument("cannot order against null"));
            }
        }
        if def.data_type().is_link() && !value.is_null() {
            return Err(Error::unsupported(format!(
                "link column {:?} can only be compared with null",
                def.name()
            )));
        }
        check_operand(t, col, &value)?;
        Ok(Condition::Compare { col, op, value })
    }

    pub fn between(t: &TableData, col: usize, low: Value, high: Value) -> Result<Self> {
        let def = t.column_def(col)?;
        if !is_ordered_type(def.data_type()) {
            return Err(Error::unsupported(format!(
                "{} column {:?} has no ordering",
                def.data_type(),
                def.name()
            )));
        }
        check_operand(t, col, &low)?;
        check_operand(t, col, &high)?;
        if low.is_null() || high.is_null() {
            return Err(Error::invalid_argument("range bounds cannot be null"));
        }
        Ok(Condition::Between { col, low, high })
    }

    pub fn null(t: &TableData, col: usize, negate: bool) -> Result<Self> {
        t.column_def(col)?;
        Ok(Condition::Null { col, negate })
    }

    pub fn text(t: &TableData, col: usize, op: TextOp, needle: &str, case: Case) -> Result<Self> {
        t.check_column_type(col, DataType::String)?;
        Ok(Condition::Text {
            col,
            op,
            needle: needle.to_string(),
            case,
        })
    }

    /// The column the predicate reads.
    pub fn column(&self) -> usize {
        match self {
            Condition::Compare { col, .. }
            | Condition::Between { col, .. }
            | Condition::Null { col, .. }
            | Condition::Text { col, .. } => *col,
        }
    }

    /// Whether `row` satisfies the predicate. Ordered comparisons and text
    /// operators never match a null cell.
    pub fn matches(&self, t: &TableData, row: RowIndex) -> bool {
        match self {
            Condition::Compare { col, op, value } => {
                let cell = t.column(*col).get(row);
                if op.is_ordering() && cell.is_null() {
                    return false;
                }
                op.accepts(cell.cmp(value))
            }
            Condition::Between { col, low, high } => {
                let cell = t.column(*col).get(row);
                !cell.is_null() && cell >= *low && cell <= *high
            }
            Condition::Null { col, negate } => t.column(*col).is_null(row) != *negate,
            Condition::Text {
                col,
                op,
                needle,
                case,
            } => match t.column(*col).get(row) {
                Value::String(s) => match op {
                    TextOp::Contains => pattern_match::contains(&s, needle, *case),
                    TextOp::BeginsWith => pattern_match::begins_with(&s, needle, *case),
                    TextOp::EndsWith => pattern_match::ends_with(&s, needle, *case),
                    TextOp::Like => pattern_match::like(&s, needle, *case),
                },
                _ => false,
            },
        }
    }
}

fn check_operand(t: &TableData, col: usize, value: &Value) -> Result<()> {
    let def = t.column_def(col)?;
    if value.is_null() {
        return Ok(());
    }
    if !def.accepts(value) {
        return Err(Error::type_mismatch(def.name(), def.data_type(), value));
    }
    Ok(())
}
