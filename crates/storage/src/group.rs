//! Group state: the tables of one snapshot and their shared bookkeeping.
//!
//! Operations that reach beyond a single table live here: primary-key
//! enforcement against the registry, link validation, and rewriting links
//! when rows of a target table go away or move.

use crate::registry::{is_meta_table, PrimaryKeyRegistry};
use crate::table_data::TableData;
use core::sync::atomic::{AtomicU64, Ordering};
use strata_core::schema::{check_naming_rules, ColumnDef, MAX_NAME_LENGTH};
use strata_core::{Error, Result, RowIndex, Value};
use tracing::{debug, trace, warn};

/// Source of table versions. Shared by every context of a group, so a
/// version is never handed out twice even across rollbacks.
#[derive(Debug, Default)]
pub(crate) struct VersionClock(AtomicU64);

impl VersionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// How a removed row's slot is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RemovePolicy {
    /// Later rows shift down by one.
    Shift,
    /// The last row moves into the hole.
    MoveLastOver,
}

/// All tables of one snapshot.
///
/// Slots are never reused, so a slot number identifies one table for the
/// lifetime of a snapshot and its copies.
#[derive(Clone, Debug)]
pub(crate) struct GroupState {
    tables: Vec<Option<TableData>>,
    registry: Option<PrimaryKeyRegistry>,
}

impl GroupState {
    /// An empty group with a primary-key registry.
    pub fn new() -> Result<Self> {
        Ok(Self {
            tables: Vec::new(),
            registry: Some(PrimaryKeyRegistry::new()?),
        })
    }

    /// A single anonymous table at slot 0, without a registry.
    pub fn standalone() -> Self {
        Self {
            tables: vec![Some(TableData::new(None))],
            registry: None,
        }
    }

    pub fn table(&self, slot: usize) -> Result<&TableData> {
        self.tables
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(Error::Invalidated { what: "table" })
    }

    pub fn table_mut(&mut self, slot: usize) -> Result<&mut TableData> {
        self.tables
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or(Error::Invalidated { what: "table" })
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.as_ref().and_then(TableData::name) == Some(name))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .iter()
            .flatten()
            .filter_map(|t| t.name().map(str::to_string))
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.iter().flatten().count()
    }

    // ---------------------------------------------------------------------
    // Tables
    // ---------------------------------------------------------------------

    pub fn add_table(&mut self, name: &str, max_name_len: usize, version: u64) -> Result<usize> {
        check_naming_rules(name, max_name_len)?;
        if is_meta_table(name) {
            return Err(Error::invalid_name(name, "name is reserved"));
        }
        if self.find_slot(name).is_some() {
            return Err(Error::invalid_name(name, "table already exists"));
        }
        let mut table = TableData::new(Some(name.to_string()));
        table.touch_structure(version);
        self.tables.push(Some(table));
        debug!(table = name, "table added");
        Ok(self.tables.len() - 1)
    }

    pub fn remove_table(&mut self, name: &str) -> Result<()> {
        let slot = self
            .find_slot(name)
            .ok_or_else(|| Error::table_not_found(name))?;
        let linked_from = self
            .tables
            .iter()
            .enumerate()
            .filter(|(s, _)| *s != slot)
            .filter_map(|(_, t)| t.as_ref())
            .find(|t| t.link_columns_into(name).next().is_some());
        if let Some(source) = linked_from {
            return Err(Error::constraint_violation(format!(
                "table {:?} is the link target of table {:?}",
                name,
                source.display_name()
            )));
        }
        if let Some(registry) = self.registry.as_mut() {
            registry.set(name, None)?;
        }
        self.tables[slot] = None;
        debug!(table = name, "table removed");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Primary keys
    // ---------------------------------------------------------------------

    /// Key column of the table in `slot`, resolved through the registry and
    /// cached against the table's structural version.
    pub fn primary_key(&self, slot: usize) -> Result<Option<usize>> {
        let table = self.table(slot)?;
        let Some(registry) = self.registry.as_ref() else {
            return Ok(None);
        };
        let stamp = table.structural_version();
        if let Some(cached) = table.pk_cache.get(stamp) {
            return Ok(cached);
        }
        let column = table
            .name()
            .and_then(|name| registry.lookup(name))
            .and_then(|property| table.schema().index_of(&property));
        trace!(table = table.display_name(), ?column, "primary key resolved");
        table.pk_cache.store(stamp, column);
        Ok(column)
    }

    fn table_name(&self, slot: usize) -> Result<String> {
        Ok(self.table(slot)?.display_name().to_string())
    }

    pub fn set_primary_key(
        &mut self,
        slot: usize,
        column: Option<&str>,
        add_index: bool,
        version: u64,
    ) -> Result<()> {
        if self.registry.is_none() {
            return Err(Error::NoPrimaryKeySupport);
        }
        let name = self.table_name(slot)?;
        let key_column = match column {
            Some(property) => {
                let table = self.table(slot)?;
                let col = table.schema().index_of(property).ok_or_else(|| {
                    Error::invalid_argument(format!("no column named {:?}", property))
                })?;
                let def = table.column_def(col)?;
                if !def.data_type().supports_primary_key() {
                    return Err(Error::unsupported(format!(
                        "a primary key must be an integer or string column, {:?} is {}",
                        property,
                        def.data_type()
                    )));
                }
                table.check_all_unique(col)?;
                Some(col)
            }
            None => None,
        };
        if let Some(registry) = self.registry.as_mut() {
            registry.set(&name, column)?;
        }
        let table = self.table_mut(slot)?;
        if let Some(col) = key_column.filter(|_| add_index) {
            table.add_search_index(col)?;
        }
        table.touch_structure(version);
        debug!(table = %name, column = ?column, "primary key changed");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------------

    pub fn add_column(
        &mut self,
        slot: usize,
        def: ColumnDef,
        max_name_len: usize,
        version: u64,
    ) -> Result<usize> {
        if let Some(target) = def.link_target() {
            if self.find_slot(target).is_none() {
                return Err(Error::table_not_found(target));
            }
        }
        let table = self.table_mut(slot)?;
        let col = table.add_column(def, max_name_len)?;
        table.touch_structure(version);
        trace!(table = table.display_name(), col, "column added");
        Ok(col)
    }

    pub fn remove_column(&mut self, slot: usize, col: usize, version: u64) -> Result<()> {
        let key = self.primary_key(slot)?;
        let name = self.table_name(slot)?;
        let table = self.table_mut(slot)?;
        let rows_before = table.size();
        let removed = table.remove_column(col)?;
        let emptied = rows_before > 0 && table.size() == 0;
        table.touch_layout(version);
        if key == Some(col) {
            if let Some(registry) = self.registry.as_mut() {
                registry.set(&name, None)?;
            }
        }
        if emptied {
            self.repair_links(&name, |_| None, version);
        }
        debug!(table = %name, column = removed.name(), "column removed");
        Ok(())
    }

    /// Renames a column. When it is the key column the registry follows; if
    /// the registry cannot be updated the column keeps its old name.
    pub fn rename_column(
        &mut self,
        slot: usize,
        col: usize,
        new_name: &str,
        max_name_len: usize,
        version: u64,
    ) -> Result<()> {
        let key = self.primary_key(slot)?;
        let name = self.table_name(slot)?;
        let old_name = self
            .table_mut(slot)?
            .rename_column(col, new_name, max_name_len)?;
        if key == Some(col) && old_name != new_name {
            let updated = match self.registry.as_mut() {
                Some(registry) => registry.rename_property(&name, new_name),
                None => Ok(()),
            };
            if let Err(e) = updated {
                warn!(
                    table = %name,
                    column = %old_name,
                    error = %e,
                    "primary key registry update failed, restoring column name"
                );
                self.table_mut(slot)?
                    .rename_column(col, &old_name, MAX_NAME_LENGTH)?;
                return Err(e);
            }
        }
        self.table_mut(slot)?.touch_structure(version);
        trace!(table = %name, from = %old_name, to = new_name, "column renamed");
        Ok(())
    }

    pub fn set_nullable(&mut self, slot: usize, col: usize, nullable: bool, version: u64) -> Result<()> {
        let key = self.primary_key(slot)?;
        let table = self.table(slot)?;
        let def = table.column_def(col)?;
        if !nullable && key == Some(col) {
            let nulls = table.column(col).null_count();
            if nulls > 0 {
                let default = Value::default_for_type(def.data_type());
                if nulls + table.find_all(col, &default).len() > 1 {
                    return Err(Error::duplicate_key(def.name(), default));
                }
            }
        }
        let table = self.table_mut(slot)?;
        table.set_nullable(col, nullable)?;
        table.touch_structure(version);
        Ok(())
    }

    pub fn set_search_index(&mut self, slot: usize, col: usize, enabled: bool, version: u64) -> Result<()> {
        let table = self.table_mut(slot)?;
        if enabled {
            table.add_search_index(col)?;
        } else {
            table.remove_search_index(col)?;
        }
        table.touch_structure(version);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Rows
    // ---------------------------------------------------------------------

    /// Appends `count` default rows.
    pub fn add_empty_rows(&mut self, slot: usize, count: usize, version: u64) -> Result<RowIndex> {
        if count < 1 {
            return Err(Error::invalid_argument(format!(
                "row count must be at least 1, got {}",
                count
            )));
        }
        if let Some(key) = self.primary_key(slot)? {
            if count > 1 {
                return Err(Error::constraint_violation(
                    "multiple empty rows cannot be added to a table with a primary key",
                ));
            }
            let table = self.table(slot)?;
            let default = table.column_def(key)?.default_value();
            table.check_unique(key, &default, None)?;
        }
        let table = self.table_mut(slot)?;
        let first = table.add_rows(count)?;
        table.touch(version);
        Ok(first)
    }

    /// Appends one row whose key cell is `value`.
    pub fn add_row_with_primary_key(
        &mut self,
        slot: usize,
        value: Value,
        validate: bool,
        version: u64,
    ) -> Result<RowIndex> {
        let name = self.table_name(slot)?;
        let key = self
            .primary_key(slot)?
            .ok_or(Error::MissingPrimaryKey { table: name })?;
        let table = self.table(slot)?;
        table.check_value(key, &value)?;
        if validate {
            table.check_unique(key, &value, None)?;
        }
        let table = self.table_mut(slot)?;
        let row = table.add_rows(1)?;
        table.set_unchecked(key, row, value)?;
        table.touch(version);
        Ok(row)
    }

    /// Appends one row from a full list of cell values, all checked first.
    pub fn add_row(&mut self, slot: usize, values: Vec<Value>, version: u64) -> Result<RowIndex> {
        let key = self.primary_key(slot)?;
        let table = self.table(slot)?;
        if values.len() != table.column_count() {
            return Err(Error::invalid_argument(format!(
                "the number of values ({}) does not match the number of columns ({})",
                values.len(),
                table.column_count()
            )));
        }
        for (col, value) in values.iter().enumerate() {
            table.check_value(col, value)?;
            self.check_link_targets(slot, col, value)?;
        }
        if let Some(key) = key {
            table.check_unique(key, &values[key], None)?;
        }
        let table = self.table_mut(slot)?;
        let row = table.add_rows(1)?;
        for (col, value) in values.into_iter().enumerate() {
            table.set_unchecked(col, row, value)?;
        }
        table.touch(version);
        Ok(row)
    }

    /// Writes one cell, enforcing key uniqueness and link bounds.
    ///
    /// With `checked` unset, range and type checks are skipped and misuse
    /// panics inside the column store. Nullability is checked either way.
    pub fn set_value(
        &mut self,
        slot: usize,
        col: usize,
        row: RowIndex,
        value: Value,
        checked: bool,
        version: u64,
    ) -> Result<()> {
        let key = self.primary_key(slot)?;
        let table = self.table(slot)?;
        if checked {
            table.check_value(col, &value)?;
            table.check_row(row)?;
        } else if value.is_null() {
            // The column store takes a null for any type.
            table.check_value(col, &value)?;
        }
        self.check_link_targets(slot, col, &value)?;
        if key == Some(col) {
            table.check_unique(col, &value, Some(row))?;
        }
        let table = self.table_mut(slot)?;
        table.set_unchecked(col, row, value)?;
        table.touch(version);
        Ok(())
    }

    fn check_link_targets(&self, slot: usize, col: usize, value: &Value) -> Result<()> {
        let targets: &[RowIndex] = match value {
            Value::Link(target) => core::slice::from_ref(target),
            Value::LinkList(targets) => targets,
            _ => return Ok(()),
        };
        let size = self.link_target(slot, col)?.size();
        match targets.iter().find(|&&t| t >= size) {
            Some(&index) => Err(Error::RowOutOfRange { index, size }),
            None => Ok(()),
        }
    }

    /// Target table of a link column.
    pub fn link_target(&self, slot: usize, col: usize) -> Result<&TableData> {
        let def = self.table(slot)?.column_def(col)?;
        let target = def
            .link_target()
            .ok_or_else(|| Error::invalid_argument(format!("{:?} is not a link column", def.name())))?;
        let target_slot = self
            .find_slot(target)
            .ok_or_else(|| Error::table_not_found(target))?;
        self.table(target_slot)
    }

    pub fn link_target_slot(&self, slot: usize, col: usize) -> Result<usize> {
        let def = self.table(slot)?.column_def(col)?;
        let target = def
            .link_target()
            .ok_or_else(|| Error::invalid_argument(format!("{:?} is not a link column", def.name())))?;
        self.find_slot(target)
            .ok_or_else(|| Error::table_not_found(target))
    }

    pub fn add_link_to_list(
        &mut self,
        slot: usize,
        col: usize,
        row: RowIndex,
        target: RowIndex,
        version: u64,
    ) -> Result<()> {
        self.check_link_targets(slot, col, &Value::Link(target))?;
        let table = self.table_mut(slot)?;
        table.link_list_mut(col, row)?.push(target);
        table.touch(version);
        Ok(())
    }

    pub fn remove_link_from_list(
        &mut self,
        slot: usize,
        col: usize,
        row: RowIndex,
        position: usize,
        version: u64,
    ) -> Result<RowIndex> {
        let table = self.table_mut(slot)?;
        let list = table.link_list_mut(col, row)?;
        if position >= list.len() {
            return Err(Error::RowOutOfRange {
                index: position,
                size: list.len(),
            });
        }
        let removed = list.remove(position);
        table.touch(version);
        Ok(removed)
    }

    /// Removes a row and rewrites every link that pointed at it or at a row
    /// that moved.
    pub fn remove_row(
        &mut self,
        slot: usize,
        row: RowIndex,
        policy: RemovePolicy,
        version: u64,
    ) -> Result<()> {
        let table = self.table_mut(slot)?;
        let moved = match policy {
            RemovePolicy::Shift => {
                table.remove_row(row)?;
                None
            }
            RemovePolicy::MoveLastOver => table.move_last_over(row)?,
        };
        table.touch(version);
        let Some(name) = table.name().map(str::to_string) else {
            return Ok(());
        };
        match policy {
            RemovePolicy::Shift => self.repair_links(
                &name,
                |t| match t.cmp(&row) {
                    core::cmp::Ordering::Less => Some(t),
                    core::cmp::Ordering::Equal => None,
                    core::cmp::Ordering::Greater => Some(t - 1),
                },
                version,
            ),
            RemovePolicy::MoveLastOver => self.repair_links(
                &name,
                |t| {
                    if t == row {
                        None
                    } else if Some(t) == moved {
                        Some(row)
                    } else {
                        Some(t)
                    }
                },
                version,
            ),
        }
        Ok(())
    }

    pub fn clear_table(&mut self, slot: usize, version: u64) -> Result<()> {
        let table = self.table_mut(slot)?;
        table.clear();
        table.touch(version);
        if let Some(name) = table.name().map(str::to_string) {
            self.repair_links(&name, |_| None, version);
        }
        Ok(())
    }

    fn repair_links(&mut self, target: &str, map: impl Fn(RowIndex) -> Option<RowIndex>, version: u64) {
        for table in self.tables.iter_mut().flatten() {
            let columns: Vec<usize> = table.link_columns_into(target).collect();
            let mut changed = false;
            for col in columns {
                changed |= table.remap_links(col, &map);
            }
            if changed {
                table.touch(version);
                trace!(table = table.display_name(), target, "links repaired");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> Option<&mut PrimaryKeyRegistry> {
        self.registry.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{DataType, ErrorKind};

    fn group_with_people() -> (GroupState, usize, VersionClock) {
        let clock = VersionClock::new();
        let mut group = GroupState::new().unwrap();
        let slot = group.add_table("people", MAX_NAME_LENGTH, clock.next()).unwrap();
        group
            .add_column(slot, ColumnDef::new("name", DataType::String), MAX_NAME_LENGTH, clock.next())
            .unwrap();
        group
            .add_column(slot, ColumnDef::new("age", DataType::Integer), MAX_NAME_LENGTH, clock.next())
            .unwrap();
        (group, slot, clock)
    }

    #[test]
    fn test_version_clock_is_monotonic() {
        let clock = VersionClock::new();
        let a = clock.next();
        let b = clock.next();
        assert!(b > a);
    }

    #[test]
    fn test_reserved_table_names() {
        let mut group = GroupState::new().unwrap();
        assert!(group.add_table("pk", MAX_NAME_LENGTH, 1).is_err());
        assert!(group.add_table("metadata", MAX_NAME_LENGTH, 1).is_err());
        group.add_table("people", MAX_NAME_LENGTH, 1).unwrap();
        assert!(group.add_table("people", MAX_NAME_LENGTH, 2).is_err());
    }

    #[test]
    fn test_primary_key_follows_column_shift() {
        let (mut group, slot, clock) = group_with_people();
        group.set_primary_key(slot, Some("age"), true, clock.next()).unwrap();
        assert_eq!(group.primary_key(slot).unwrap(), Some(1));

        group.remove_column(slot, 0, clock.next()).unwrap();
        assert_eq!(group.primary_key(slot).unwrap(), Some(0));

        group.remove_column(slot, 0, clock.next()).unwrap();
        assert_eq!(group.primary_key(slot).unwrap(), None);
    }

    #[test]
    fn test_rename_rolls_back_when_registry_fails() {
        let (mut group, slot, clock) = group_with_people();
        group.set_primary_key(slot, Some("name"), true, clock.next()).unwrap();
        assert_eq!(group.primary_key(slot).unwrap(), Some(0));

        // Drop the registry row behind the table's back; the cached key
        // column still says "name".
        group.registry_mut().unwrap().set("people", None).unwrap();

        let err = group
            .rename_column(slot, 0, "full_name", MAX_NAME_LENGTH, clock.next())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(group.table(slot).unwrap().column_name(0).unwrap(), "name");
    }

    #[test]
    fn test_rename_key_column_updates_registry() {
        let (mut group, slot, clock) = group_with_people();
        group.set_primary_key(slot, Some("name"), true, clock.next()).unwrap();
        group
            .rename_column(slot, 0, "full_name", MAX_NAME_LENGTH, clock.next())
            .unwrap();
        assert_eq!(group.primary_key(slot).unwrap(), Some(0));
    }

    #[test]
    fn test_link_repair_on_shift_and_move() {
        let (mut group, people, clock) = group_with_people();
        let dogs = group.add_table("dogs", MAX_NAME_LENGTH, clock.next()).unwrap();
        group
            .add_column(
                dogs,
                ColumnDef::link("owner", DataType::Link, "people"),
                MAX_NAME_LENGTH,
                clock.next(),
            )
            .unwrap();
        group.add_empty_rows(people, 3, clock.next()).unwrap();
        group.add_empty_rows(dogs, 3, clock.next()).unwrap();
        for (dog, owner) in [(0, 0), (1, 1), (2, 2)] {
            group
                .set_value(dogs, 0, dog, Value::Link(owner), true, clock.next())
                .unwrap();
        }

        group.remove_row(people, 0, RemovePolicy::Shift, clock.next()).unwrap();
        let owners = group.table(dogs).unwrap().column(0).clone();
        assert_eq!(owners.get(0), Value::Null);
        assert_eq!(owners.get(1), Value::Link(0));
        assert_eq!(owners.get(2), Value::Link(1));

        group
            .remove_row(people, 0, RemovePolicy::MoveLastOver, clock.next())
            .unwrap();
        let owners = group.table(dogs).unwrap().column(0).clone();
        assert_eq!(owners.get(1), Value::Null);
        assert_eq!(owners.get(2), Value::Link(0));

        assert!(group
            .set_value(dogs, 0, 0, Value::Link(5), true, clock.next())
            .is_err());
        assert_eq!(
            group.remove_table("people").unwrap_err().kind(),
            ErrorKind::ConstraintViolation
        );
    }

    #[test]
    fn test_empty_rows_with_primary_key() {
        let (mut group, slot, clock) = group_with_people();
        group.set_primary_key(slot, Some("name"), true, clock.next()).unwrap();
        assert_eq!(
            group.add_empty_rows(slot, 2, clock.next()).unwrap_err().kind(),
            ErrorKind::ConstraintViolation
        );
        assert!(group.add_empty_rows(slot, 0, clock.next()).is_err());
        group.add_empty_rows(slot, 1, clock.next()).unwrap();
        // A second default key would collide with the first.
        assert!(group.add_empty_rows(slot, 1, clock.next()).is_err());
        assert_eq!(group.table(slot).unwrap().size(), 1);
    }
}
