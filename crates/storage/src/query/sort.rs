//! Row ordering for sorted views.

use crate::table_data::TableData;
use core::cmp::Ordering;
use strata_core::{Error, Result, RowIndex, Value};

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sort {
    #[default]
    Ascending,
    Descending,
}

/// Only columns that can carry a search index can be sorted or made
/// distinct.
pub(crate) fn check_sortable(t: &TableData, col: usize) -> Result<()> {
    let def = t.column_def(col)?;
    if !def.data_type().is_indexable() {
        return Err(Error::unsupported(format!(
            "cannot sort {} column {:?}",
            def.data_type(),
            def.name()
        )));
    }
    Ok(())
}

/// Stable sort of `rows` by the given keys, first key first. Nulls come
/// first in ascending order.
pub(crate) fn sort_rows(t: &TableData, rows: &mut Vec<RowIndex>, keys: &[(usize, Sort)]) {
    if keys.is_empty() || rows.len() < 2 {
        return;
    }
    let mut decorated: Vec<(Vec<Value>, RowIndex)> = rows
        .iter()
        .map(|&r| (keys.iter().map(|&(col, _)| t.column(col).get(r)).collect(), r))
        .collect();
    decorated.sort_by(|(a, _), (b, _)| compare_keys(a, b, keys));
    rows.clear();
    rows.extend(decorated.into_iter().map(|(_, r)| r));
}

fn compare_keys(a: &[Value], b: &[Value], keys: &[(usize, Sort)]) -> Ordering {
    for ((av, bv), &(_, order)) in a.iter().zip(b).zip(keys) {
        let cmp = av.cmp(bv);
        if cmp != Ordering::Equal {
            return match order {
                Sort::Ascending => cmp,
                Sort::Descending => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::schema::{ColumnDef, MAX_NAME_LENGTH};
    use strata_core::DataType;

    fn table() -> TableData {
        let mut t = TableData::new(None);
        t.add_column(ColumnDef::new("team", DataType::String), MAX_NAME_LENGTH)
            .unwrap();
        t.add_column(ColumnDef::new("score", DataType::Integer).nullable(true), MAX_NAME_LENGTH)
            .unwrap();
        t.add_column(ColumnDef::new("raw", DataType::Binary), MAX_NAME_LENGTH)
            .unwrap();
        let rows: [(&str, Option<i64>); 4] = [("b", Some(3)), ("a", Some(7)), ("b", None), ("a", Some(1))];
        for (team, score) in rows {
            let row = t.add_rows(1).unwrap();
            t.set(0, row, Value::from(team)).unwrap();
            t.set(1, row, Value::from(score)).unwrap();
        }
        t
    }

    #[test]
    fn test_single_key_nulls_first() {
        let t = table();
        let mut rows: Vec<RowIndex> = (0..t.size()).collect();
        sort_rows(&t, &mut rows, &[(1, Sort::Ascending)]);
        assert_eq!(rows, vec![2, 3, 0, 1]);
        sort_rows(&t, &mut rows, &[(1, Sort::Descending)]);
        assert_eq!(rows, vec![1, 0, 3, 2]);
    }

    #[test]
    fn test_multi_key_is_stable() {
        let t = table();
        let mut rows: Vec<RowIndex> = (0..t.size()).collect();
        sort_rows(&t, &mut rows, &[(0, Sort::Ascending)]);
        assert_eq!(rows, vec![1, 3, 0, 2]);
        let mut rows: Vec<RowIndex> = (0..t.size()).collect();
        sort_rows(&t, &mut rows, &[(0, Sort::Ascending), (1, Sort::Descending)]);
        assert_eq!(rows, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_binary_is_not_sortable() {
        let t = table();
        assert!(check_sortable(&t, 1).is_ok());
        assert!(check_sortable(&t, 2).is_err());
        assert!(check_sortable(&t, 9).is_err());
    }
}
