//! Integration tests for tables, primary keys, links and views.

use strata_storage::{
    Case, DataType, Error, ErrorKind, SharedGroup, Sort, Table, TableOrView, Value, ViewMode,
};

/// Helper to create the people table used by most scenarios.
fn people() -> Table {
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
    table
        .add_row(vec!["Greg".into(), 26.into(), true.into()])
        .unwrap();
    table
}

fn names(table: &impl TableOrView) -> Vec<String> {
    (0..table.size().unwrap())
        .map(|i| table.get_string(0, i).unwrap().unwrap_or_default())
        .collect()
}

#[test]
fn test_added_column_reads_back() {
    let table = Table::new();
    let types = [
        DataType::Integer,
        DataType::Boolean,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Timestamp,
        DataType::Binary,
        DataType::Mixed,
    ];
    for (i, data_type) in types.into_iter().enumerate() {
        let name = format!("col{}", i);
        let col = table.add_column(data_type, &name, false).unwrap();
        assert_eq!(col, i);
        assert_eq!(table.column_type(col).unwrap(), data_type);
        assert_eq!(table.column_name(col).unwrap(), name);
    }
    assert_eq!(table.column_count().unwrap(), types.len());
}

#[test]
fn test_people_scenario() {
    let table = people();
    assert_eq!(table.find_first_string(0, "Susan").unwrap(), Some(1));
    assert_eq!(table.size().unwrap(), 3);
    table.clear().unwrap();
    assert!(table.is_empty().unwrap());
}

#[test]
fn test_json_dump_literal() {
    let table = people();
    table.remove_last().unwrap();
    assert_eq!(
        table.to_json().unwrap(),
        r#"[{"name":"John","age":40,"hired":true},{"name":"Susan","age":50,"hired":false}]"#
    );
}

#[test]
fn test_remove_shifts_following_rows() {
    let table = people();
    table.add_row(vec!["Ann".into(), 33.into(), false.into()]).unwrap();
    let before = table.size().unwrap();
    table.remove(1).unwrap();
    assert_eq!(table.size().unwrap(), before - 1);
    assert_eq!(names(&table), vec!["John", "Greg", "Ann"]);

    table.remove_last().unwrap();
    assert_eq!(table.size().unwrap(), before - 2);
    assert_eq!(names(&table), vec!["John", "Greg"]);
}

#[test]
fn test_move_last_over_takes_last_row() {
    let table = people();
    table.add_row(vec!["Ann".into(), 33.into(), false.into()]).unwrap();
    table.move_last_over(0).unwrap();
    assert_eq!(table.size().unwrap(), 3);
    assert_eq!(names(&table), vec!["Ann", "Susan", "Greg"]);
    assert_eq!(table.get_long(1, 0).unwrap(), Some(33));
}

#[test]
fn test_aggregates_and_lookups() {
    let table = people();
    assert_eq!(table.sum_long(1).unwrap(), 116);
    assert_eq!(table.maximum_long(1).unwrap(), Some(50));
    assert_eq!(table.minimum_long(1).unwrap(), Some(26));
    assert_eq!(table.count_long(1, 40).unwrap(), 1);
    assert_eq!(table.count_string(0, "Nobody").unwrap(), 0);
    assert_eq!(table.find_first_boolean(2, false).unwrap(), Some(1));
    assert_eq!(table.find_first_long(1, 99).unwrap(), None);

    table.add_search_index(0).unwrap();
    assert!(table.has_search_index(0).unwrap());
    assert_eq!(table.find_first_string(0, "Greg").unwrap(), Some(2));
    table.remove(0).unwrap();
    assert_eq!(table.find_first_string(0, "Greg").unwrap(), Some(1));
    table.remove_search_index(0).unwrap();
    assert!(!table.has_search_index(0).unwrap());
}

#[test]
fn test_find_all_and_sorted_views() {
    let table = people();
    let hired = table.find_all_boolean(2, true).unwrap();
    assert_eq!(names(&hired), vec!["John", "Greg"]);
    assert_eq!(hired.average_long(1).unwrap(), 33.0);

    let by_age = table.sorted_view(1, Sort::Ascending).unwrap();
    assert_eq!(names(&by_age), vec!["Greg", "John", "Susan"]);

    table.add_row(vec!["Ann".into(), 19.into(), true.into()]).unwrap();
    assert_eq!(names(&by_age), vec!["Ann", "Greg", "John", "Susan"]);
    assert_eq!(names(&hired), vec!["John", "Greg", "Ann"]);

    by_age.set_mode(ViewMode::Detached);
    table.set_long(1, 1, 10).unwrap();
    assert_eq!(names(&by_age), vec!["Ann", "Greg", "John", "Susan"]);
    by_age.set_mode(ViewMode::Synced);
    assert_eq!(names(&by_age), vec!["Susan", "Ann", "Greg", "John"]);
}

#[test]
fn test_distinct_and_query_views() {
    let table = people();
    table.add_row(vec!["Ann".into(), 40.into(), false.into()]).unwrap();
    let distinct = table.distinct_view(1).unwrap();
    assert_eq!(distinct.size().unwrap(), 3);
    assert_eq!(distinct.row_indices().unwrap(), vec![0, 1, 2]);

    let q = table
        .query()
        .unwrap()
        .ends_with(0, "N", Case::Insensitive)
        .unwrap();
    assert_eq!(names(&q.find_all().unwrap()), vec!["John", "Susan", "Ann"]);
}

#[test]
fn test_pivot_groups_by_string() {
    let table = people();
    table.add_column(DataType::String, "team", true).unwrap();
    table.set_string(3, 0, "red").unwrap();
    table.set_string(3, 1, "blue").unwrap();
    table.set_string(3, 2, "red").unwrap();
    let result = table.pivot(3, 1, strata_storage::PivotType::Sum).unwrap();
    assert_eq!(result.column_name(0).unwrap(), "team");
    assert_eq!(names(&result), vec!["red", "blue"]);
    assert_eq!(result.get_long(1, 0).unwrap(), Some(66));
    assert_eq!(
        table
            .pivot(0, 2, strata_storage::PivotType::Count)
            .unwrap_err()
            .kind(),
        ErrorKind::UnsupportedOperation
    );
}

#[test]
fn test_closed_table_is_invalid() {
    let table = people();
    let handle = table.clone();
    let row = table.checked_row(0).unwrap();
    table.close();
    assert!(!handle.is_valid());
    assert_eq!(
        handle.add_empty_row().unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(
        handle.set_long(1, 0, 1).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(row.get_long(1).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(
        handle.to_string(),
        "The Table is no longer valid."
    );
}

// ---------------------------------------------------------------------------
// Primary keys (group tables only)
// ---------------------------------------------------------------------------

#[test]
fn test_duplicate_key_insert_is_refused() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let table = tx.add_table("people").unwrap();
    table.add_column(DataType::String, "name", false).unwrap();
    table.add_column(DataType::Integer, "age", false).unwrap();
    table.set_primary_key(Some("name")).unwrap();
    assert!(table.has_search_index(0).unwrap());

    table.add_row(vec!["John".into(), 40.into()]).unwrap();
    let err = table.add_row(vec!["John".into(), 41.into()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(table.size().unwrap(), 1);

    let err = table.add_empty_row_with_primary_key("John").unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
    assert_eq!(table.size().unwrap(), 1);

    let row = table.add_empty_row_with_primary_key("Susan").unwrap();
    assert_eq!(row, 1);
    assert_eq!(
        table.set_string(0, 1, "John").unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    table.set_string(0, 1, "Sue").unwrap();
    assert_eq!(
        table.to_string(),
        "The Table people has 'name' field as a PrimaryKey, and contains 2 columns: name, age. And 2 rows."
    );
}

#[test]
fn test_integer_key_and_setting_key_on_duplicates() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let table = tx.add_table("items").unwrap();
    table.add_column(DataType::Integer, "id", false).unwrap();
    table.add_column(DataType::Double, "price", false).unwrap();
    table.add_row(vec![1.into(), 2.5.into()]).unwrap();
    table.add_row(vec![1.into(), 3.5.into()]).unwrap();
    assert_eq!(
        table.set_primary_key(Some("id")).unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    assert!(!table.has_primary_key().unwrap());

    table.set_long(0, 1, 2).unwrap();
    table.set_primary_key(Some("id")).unwrap();
    assert_eq!(
        table.add_empty_row_with_primary_key(2).unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    assert_eq!(
        table.set_primary_key(Some("price")).unwrap_err().kind(),
        ErrorKind::UnsupportedOperation
    );
    table.set_primary_key(None).unwrap();
    assert!(!table.has_primary_key().unwrap());
    assert!(matches!(
        table.add_empty_row_with_primary_key(3),
        Err(Error::MissingPrimaryKey { .. })
    ));
}

#[test]
fn test_nullable_key_holds_at_most_one_null() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let table = tx.add_table("users").unwrap();
    table.add_column(DataType::String, "email", true).unwrap();
    table.add_column(DataType::Integer, "age", false).unwrap();
    table.add_row(vec![Value::Null, 30.into()]).unwrap();
    table.add_row(vec![Value::Null, 31.into()]).unwrap();
    assert!(matches!(
        table.set_primary_key(Some("email")),
        Err(Error::DuplicateKey { .. })
    ));
    table.remove_last().unwrap();
    table.set_primary_key(Some("email")).unwrap();

    // A second null key is a duplicate, whichever way it arrives.
    let err = table.add_empty_row_with_primary_key(Value::Null).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
    assert_eq!(
        table.add_empty_row().unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    assert_eq!(table.size().unwrap(), 1);

    let row = table.add_empty_row_with_primary_key("ann@example.com").unwrap();
    assert_eq!(row, 1);
    assert_eq!(
        table.set_null(0, 1).unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    assert!(matches!(
        table.unchecked_row(1).set_null(0),
        Err(Error::DuplicateKey { .. })
    ));
    assert_eq!(
        table.get_string(0, 1).unwrap().as_deref(),
        Some("ann@example.com")
    );
    assert_eq!(table.size().unwrap(), 2);

    // Making the key required turns the null into "", which must not
    // collide with an existing empty key.
    table.set_string(0, 1, "").unwrap();
    assert!(matches!(
        table.convert_column_to_not_nullable(0),
        Err(Error::DuplicateKey { .. })
    ));
    assert!(table.is_column_nullable(0).unwrap());
    assert!(table.is_null(0, 0).unwrap());

    table.set_string(0, 1, "ann@example.com").unwrap();
    table.convert_column_to_not_nullable(0).unwrap();
    assert!(!table.is_column_nullable(0).unwrap());
    assert_eq!(table.get_string(0, 0).unwrap().as_deref(), Some(""));
    assert_eq!(table.find_first_string(0, "").unwrap(), Some(0));
    assert_eq!(
        table.add_empty_row().unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    assert_eq!(table.size().unwrap(), 2);
}

#[test]
fn test_key_survives_removal_of_earlier_column() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let table = tx.add_table("people").unwrap();
    table.add_column(DataType::Integer, "age", false).unwrap();
    table.add_column(DataType::Boolean, "hired", false).unwrap();
    table.add_column(DataType::String, "name", false).unwrap();
    table.set_primary_key(Some("name")).unwrap();
    assert_eq!(table.primary_key().unwrap(), Some(2));

    table.remove_column(0).unwrap();
    assert!(table.has_primary_key().unwrap());
    assert_eq!(table.primary_key().unwrap(), Some(1));

    table.rename_column(1, "full_name").unwrap();
    assert_eq!(table.primary_key().unwrap(), Some(1));

    table.remove_column(1).unwrap();
    assert!(!table.has_primary_key().unwrap());
}

#[test]
fn test_key_visible_after_commit() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let table = tx.add_table("people").unwrap();
    table.add_column(DataType::String, "name", false).unwrap();
    table.set_primary_key(Some("name")).unwrap();
    table.add_empty_row_with_primary_key("John").unwrap();
    tx.commit().unwrap();

    let rx = group.begin_read();
    let table = rx.get_table("people").unwrap();
    assert_eq!(table.primary_key().unwrap(), Some(0));
    assert_eq!(
        table.add_empty_row().unwrap_err().kind(),
        ErrorKind::ImmutableContext
    );
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[test]
fn test_links_follow_row_removal() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let dogs = tx.add_table("dogs").unwrap();
    dogs.add_column(DataType::String, "name", false).unwrap();
    for name in ["Rex", "Fido", "Lassie"] {
        dogs.add_row(vec![name.into()]).unwrap();
    }
    let owners = tx.add_table("owners").unwrap();
    owners.add_column(DataType::String, "name", false).unwrap();
    let best = owners.add_link_column(DataType::Link, "best", &dogs).unwrap();
    let all = owners
        .add_link_column(DataType::LinkList, "all", &dogs)
        .unwrap();
    owners
        .add_row(vec!["Ann".into(), Value::Link(2), Value::LinkList(vec![0, 1, 2])])
        .unwrap();
    owners
        .add_row(vec!["Bob".into(), Value::Link(1), Value::LinkList(vec![1])])
        .unwrap();

    assert!(owners.set_link(best, 0, 9).is_err());
    assert_eq!(owners.link_target(best).unwrap().name().unwrap().as_deref(), Some("dogs"));

    dogs.remove(0).unwrap();
    assert_eq!(owners.get_link(best, 0).unwrap(), Some(1));
    assert_eq!(owners.get_link(best, 1).unwrap(), Some(0));
    assert_eq!(owners.get_link_list(all, 0).unwrap(), vec![0, 1]);

    dogs.move_last_over(0).unwrap();
    assert_eq!(owners.get_link(best, 0).unwrap(), Some(0));
    assert!(owners.is_null_link(best, 1).unwrap());
    assert_eq!(owners.get_link_list(all, 0).unwrap(), vec![0]);
    assert!(owners.get_link_list(all, 1).unwrap().is_empty());

    owners.add_link_to_list(all, 1, 0).unwrap();
    assert_eq!(owners.remove_link_from_list(all, 1, 0).unwrap(), 0);

    assert_eq!(
        tx.remove_table("dogs").unwrap_err().kind(),
        ErrorKind::ConstraintViolation
    );
    tx.remove_table("owners").unwrap();
    assert!(!owners.is_valid());
    tx.remove_table("dogs").unwrap();
    assert!(!dogs.is_valid());
}

#[test]
fn test_standalone_tables_cannot_link() {
    let a = Table::new();
    let b = Table::new();
    b.add_column(DataType::Integer, "n", false).unwrap();
    assert_eq!(
        a.add_link_column(DataType::Link, "other", &b)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidArgument
    );
}
