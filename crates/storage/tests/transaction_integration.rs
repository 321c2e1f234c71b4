//! Integration tests for shared groups and their transactions.

use std::thread;

use strata_storage::{
    runtime, Config, DataType, Error, ErrorKind, SharedGroup, TableOrView, TransactionState,
};

fn group_with_people() -> SharedGroup {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    let people = tx.add_table("people").unwrap();
    people.add_column(DataType::String, "name", false).unwrap();
    people.add_column(DataType::Integer, "age", false).unwrap();
    people.add_row(vec!["John".into(), 40.into()]).unwrap();
    tx.commit().unwrap();
    group
}

#[test]
fn test_reader_sees_its_snapshot_only() {
    let group = group_with_people();
    let rx = group.begin_read();
    let before = rx.get_table("people").unwrap();

    let tx = group.begin_write().unwrap();
    let people = tx.get_table("people").unwrap();
    people.add_row(vec!["Susan".into(), 50.into()]).unwrap();
    people.set_long(1, 0, 41).unwrap();
    assert_eq!(before.size().unwrap(), 1);
    tx.commit().unwrap();

    assert_eq!(before.size().unwrap(), 1);
    assert_eq!(before.get_long(1, 0).unwrap(), Some(40));

    let after = group.begin_read().get_table("people").unwrap();
    // The read transaction was a temporary, so the handle is already dead.
    assert_eq!(after.size().unwrap_err().kind(), ErrorKind::InvalidState);

    let rx2 = group.begin_read();
    let after = rx2.get_table("people").unwrap();
    assert_eq!(after.size().unwrap(), 2);
    assert_eq!(after.get_long(1, 0).unwrap(), Some(41));
}

#[test]
fn test_rollback_discards_changes() {
    let group = group_with_people();
    let tx = group.begin_write().unwrap();
    let people = tx.get_table("people").unwrap();
    people.clear().unwrap();
    tx.add_table("dogs").unwrap();
    tx.rollback();

    let rx = group.begin_read();
    assert_eq!(rx.size().unwrap(), 1);
    assert_eq!(rx.get_table("people").unwrap().size().unwrap(), 1);
    assert!(matches!(
        rx.get_table("dogs"),
        Err(Error::TableNotFound { .. })
    ));
}

#[test]
fn test_everything_invalid_after_end() {
    let group = group_with_people();
    let tx = group.begin_write().unwrap();
    let people = tx.get_table("people").unwrap();
    let row = people.checked_row(0).unwrap();
    let view = people.find_all_long(1, 40).unwrap();
    let query = people.query().unwrap().equal_to(0, "John").unwrap();
    tx.commit().unwrap();

    assert!(!people.is_valid());
    assert!(!people.is_writable());
    assert!(!row.is_attached());
    for kind in [
        people.add_empty_row().unwrap_err().kind(),
        people.set_long(1, 0, 1).unwrap_err().kind(),
        row.set_long(1, 1).unwrap_err().kind(),
        view.size().unwrap_err().kind(),
        query.count().unwrap_err().kind(),
    ] {
        assert_eq!(kind, ErrorKind::InvalidState);
    }

    let rx = group.begin_read();
    let people = rx.get_table("people").unwrap();
    rx.end();
    assert!(!people.is_valid());
}

#[test]
fn test_read_transaction_is_immutable() {
    let group = group_with_people();
    let rx = group.begin_read();
    let people = rx.get_table("people").unwrap();
    assert!(!people.is_writable());
    for err in [
        people.add_empty_row().unwrap_err(),
        people.set_string(0, 0, "Jo").unwrap_err(),
        people.add_column(DataType::Double, "score", false).unwrap_err(),
        people.remove(0).unwrap_err(),
    ] {
        assert!(matches!(err, Error::Immutable));
        assert_eq!(err.kind(), ErrorKind::ImmutableContext);
    }
    assert_eq!(rx.state(), TransactionState::Active);
    assert_eq!(people.get_string(0, 0).unwrap().as_deref(), Some("John"));
}

#[test]
fn test_second_writer_fails_fast() {
    let group = group_with_people();
    let tx = group.begin_write().unwrap();
    let err = group.begin_write().err().unwrap();
    assert!(matches!(err, Error::WriterActive));

    let other = group.clone();
    let handle = thread::spawn(move || other.begin_write().is_err());
    assert!(handle.join().unwrap());

    drop(tx);
    assert!(group.begin_write().is_ok());
}

#[test]
fn test_table_management() {
    let group = SharedGroup::new().unwrap();
    let tx = group.begin_write().unwrap();
    assert!(tx.add_table("pk").is_err());
    assert!(tx.add_table("metadata").is_err());
    assert!(tx.add_table("").is_err());
    tx.add_table("people").unwrap();
    assert!(matches!(
        tx.add_table("people"),
        Err(Error::InvalidName { .. })
    ));
    tx.add_table("dogs").unwrap();
    assert_eq!(
        tx.table_names().unwrap(),
        vec!["people".to_string(), "dogs".to_string()]
    );
    let dogs = tx.get_table("dogs").unwrap();
    tx.remove_table("dogs").unwrap();
    assert!(!dogs.is_valid());
    assert!(!tx.has_table("dogs").unwrap());
    assert_eq!(tx.size().unwrap(), 1);
    assert!(tx.remove_table("dogs").is_err());
}

#[test]
fn test_versions_never_repeat() {
    let group = group_with_people();
    let rx = group.begin_read();
    let v0 = rx.get_table("people").unwrap().version().unwrap();

    let tx = group.begin_write().unwrap();
    let people = tx.get_table("people").unwrap();
    people.set_long(1, 0, 1).unwrap();
    let rolled_back = people.version().unwrap();
    tx.rollback();

    let tx = group.begin_write().unwrap();
    let people = tx.get_table("people").unwrap();
    people.set_long(1, 0, 2).unwrap();
    let v1 = people.version().unwrap();
    assert!(v0 < rolled_back);
    assert!(rolled_back < v1);
    tx.commit().unwrap();
}

#[test]
fn test_concurrent_readers() {
    let group = group_with_people();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let group = group.clone();
            thread::spawn(move || {
                let rx = group.begin_read();
                let people = rx.get_table("people").unwrap();
                people.sum_long(1).unwrap()
            })
        })
        .collect();

    let tx = group.begin_write().unwrap();
    tx.get_table("people")
        .unwrap()
        .add_row(vec!["Susan".into(), 50.into()])
        .unwrap();
    tx.commit().unwrap();

    for reader in readers {
        let sum = reader.join().unwrap();
        assert!(sum == 40 || sum == 90);
    }
}

#[test]
fn test_config_controls_key_index() {
    let config = Config::new().index_primary_key(false).max_name_length(8);
    let group = SharedGroup::with_config(config).unwrap();
    assert!(!group.config().get_index_primary_key());
    let tx = group.begin_write().unwrap();
    assert!(tx.add_table("much_too_long").is_err());
    let t = tx.add_table("short").unwrap();
    t.add_column(DataType::Integer, "id", false).unwrap();
    t.set_primary_key(Some("id")).unwrap();
    assert!(!t.has_search_index(0).unwrap());
}

#[test]
fn test_retired_snapshots_reach_reclaimer() {
    let group = group_with_people();
    runtime::init();
    for n in 0..3 {
        let tx = group.begin_write().unwrap();
        tx.get_table("people")
            .unwrap()
            .add_row(vec![format!("p{}", n).as_str().into(), n.into()])
            .unwrap();
        tx.commit().unwrap();
    }
    assert_eq!(group.begin_read().size().unwrap(), 1);
    runtime::shutdown();
    assert!(!runtime::is_initialized());
    assert!(runtime::reclaimed_count() >= 3);
    assert_eq!(
        group.begin_read().get_table("people").unwrap().size().unwrap_err().kind(),
        ErrorKind::InvalidState
    );
}
