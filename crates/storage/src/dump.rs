//! JSON rendering of table rows.

use crate::column_store::ColumnData;
use crate::table_data::TableData;
use serde_json::{Map, Number, Value as Json};
use strata_core::{RowIndex, Value};

fn float_to_json(v: f32) -> Json {
    // Go through the shortest decimal form so 0.1f32 prints as 0.1.
    v.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or(Json::Null, Json::Number)
}

fn double_to_json(v: f64) -> Json {
    Number::from_f64(v).map_or(Json::Null, Json::Number)
}

fn value_to_json(value: Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(v) | Value::Timestamp(v) => Json::from(v),
        Value::Boolean(v) => Json::Bool(v),
        Value::Float(v) => float_to_json(v),
        Value::Double(v) => double_to_json(v),
        Value::String(v) => Json::String(v),
        Value::Binary(v) => Json::Array(v.into_iter().map(Json::from).collect()),
        Value::Link(v) => Json::from(v),
        Value::LinkList(v) => Json::Array(v.into_iter().map(Json::from).collect()),
    }
}

/// One object per row, keys in column order.
pub(crate) fn rows_to_json(t: &TableData, rows: &[RowIndex]) -> Json {
    let names: Vec<&str> = t.schema().columns().iter().map(|c| c.name()).collect();
    let columns: Vec<&ColumnData> = (0..t.column_count()).map(|c| t.column(c)).collect();
    Json::Array(
        rows.iter()
            .map(|&row| {
                let mut object = Map::with_capacity(names.len());
                for (name, column) in names.iter().zip(&columns) {
                    object.insert(name.to_string(), value_to_json(column.get(row)));
                }
                Json::Object(object)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use crate::{Table, TableOrView};
    use strata_core::{DataType, Value};

    #[test]
    fn test_rows_in_column_order() {
        let table = Table::new();
        table.add_column(DataType::String, "name", false).unwrap();
        table.add_column(DataType::Integer, "age", false).unwrap();
        table.add_column(DataType::Boolean, "hired", false).unwrap();
        table
            .add_row(vec!["John".into(), 40.into(), true.into()])
            .unwrap();
        table
            .add_row(vec!["Susan".into(), 50.into(), false.into()])
            .unwrap();
        assert_eq!(
            table.to_json().unwrap(),
            r#"[{"name":"John","age":40,"hired":true},{"name":"Susan","age":50,"hired":false}]"#
        );
    }

    #[test]
    fn test_other_types() {
        let table = Table::new();
        table.add_column(DataType::Float, "f", false).unwrap();
        table.add_column(DataType::Double, "d", true).unwrap();
        table.add_column(DataType::Binary, "raw", false).unwrap();
        table.add_column(DataType::Timestamp, "at", false).unwrap();
        table
            .add_row(vec![
                Value::Float(0.1),
                Value::Double(f64::NAN),
                Value::Binary(vec![1, 2]),
                Value::Timestamp(1_000),
            ])
            .unwrap();
        table.add_empty_row().unwrap();
        assert_eq!(
            table.to_json().unwrap(),
            r#"[{"f":0.1,"d":null,"raw":[1,2],"at":1000},{"f":0.0,"d":null,"raw":[],"at":0}]"#
        );
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new();
        table.add_column(DataType::Integer, "n", false).unwrap();
        assert_eq!(table.to_json().unwrap(), "[]");
    }
}
