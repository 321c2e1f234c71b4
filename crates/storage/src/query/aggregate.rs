//! Column aggregates over a set of rows. Null cells are skipped.

use crate::table_data::TableData;
use strata_core::{DataType, Error, Result, RowIndex};

fn integer_cells(t: &TableData, col: usize, expected: DataType) -> Result<&[Option<i64>]> {
    let def = t.check_column_type(col, expected)?;
    let column = t.column(col);
    let cells = match expected {
        DataType::Timestamp => column.as_timestamps(),
        _ => column.as_integers(),
    };
    cells.ok_or_else(|| Error::column_type_mismatch(def.name(), expected, column.data_type()))
}

fn float_cells(t: &TableData, col: usize) -> Result<&[Option<f32>]> {
    let def = t.check_column_type(col, DataType::Float)?;
    let column = t.column(col);
    column
        .as_floats()
        .ok_or_else(|| Error::column_type_mismatch(def.name(), DataType::Float, column.data_type()))
}

fn double_cells(t: &TableData, col: usize) -> Result<&[Option<f64>]> {
    let def = t.check_column_type(col, DataType::Double)?;
    let column = t.column(col);
    column
        .as_doubles()
        .ok_or_else(|| Error::column_type_mismatch(def.name(), DataType::Double, column.data_type()))
}

/// Non-null values of `rows`, widened to f64.
fn real_values<'a>(
    t: &'a TableData,
    col: usize,
    rows: &'a [RowIndex],
    data_type: DataType,
) -> Result<Box<dyn Iterator<Item = f64> + 'a>> {
    Ok(match data_type {
        DataType::Integer => {
            let cells = integer_cells(t, col, DataType::Integer)?;
            Box::new(rows.iter().filter_map(move |&r| cells[r].map(|v| v as f64)))
        }
        DataType::Float => {
            let cells = float_cells(t, col)?;
            Box::new(rows.iter().filter_map(move |&r| cells[r].map(f64::from)))
        }
        DataType::Double => {
            let cells = double_cells(t, col)?;
            Box::new(rows.iter().filter_map(move |&r| cells[r]))
        }
        other => {
            return Err(Error::unsupported(format!(
                "cannot aggregate {} values",
                other
            )))
        }
    })
}

/// Wrapping sum of an integer column.
pub(crate) fn sum_long(t: &TableData, col: usize, rows: &[RowIndex]) -> Result<i64> {
    let cells = integer_cells(t, col, DataType::Integer)?;
    Ok(rows
        .iter()
        .filter_map(|&r| cells[r])
        .fold(0i64, i64::wrapping_add))
}

/// Sum of a float or double column, accumulated in f64.
pub(crate) fn sum_real(
    t: &TableData,
    col: usize,
    rows: &[RowIndex],
    data_type: DataType,
) -> Result<f64> {
    Ok(real_values(t, col, rows, data_type)?.sum())
}

pub(crate) fn max_integer(
    t: &TableData,
    col: usize,
    rows: &[RowIndex],
    data_type: DataType,
) -> Result<Option<i64>> {
    let cells = integer_cells(t, col, data_type)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).max())
}

pub(crate) fn min_integer(
    t: &TableData,
    col: usize,
    rows: &[RowIndex],
    data_type: DataType,
) -> Result<Option<i64>> {
    let cells = integer_cells(t, col, data_type)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).min())
}

pub(crate) fn max_float(t: &TableData, col: usize, rows: &[RowIndex]) -> Result<Option<f32>> {
    let cells = float_cells(t, col)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).reduce(f32::max))
}

pub(crate) fn min_float(t: &TableData, col: usize, rows: &[RowIndex]) -> Result<Option<f32>> {
    let cells = float_cells(t, col)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).reduce(f32::min))
}

pub(crate) fn max_double(t: &TableData, col: usize, rows: &[RowIndex]) -> Result<Option<f64>> {
    let cells = double_cells(t, col)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).reduce(f64::max))
}

pub(crate) fn min_double(t: &TableData, col: usize, rows: &[RowIndex]) -> Result<Option<f64>> {
    let cells = double_cells(t, col)?;
    Ok(rows.iter().filter_map(|&r| cells[r]).reduce(f64::min))
}

/// Mean of the non-null values; 0.0 when there are none.
pub(crate) fn average(
    t: &TableData,
    col: usize,
    rows: &[RowIndex],
    data_type: DataType,
) -> Result<f64> {
    let (sum, count) = real_values(t, col, rows, data_type)?
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum / count as f64)
}
