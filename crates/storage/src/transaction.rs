//! Shared groups and their read/write transactions.
//!
//! A [`SharedGroup`] publishes one committed snapshot. Readers pin the
//! snapshot that was current when they began; the single writer works on a
//! private copy and replaces the published snapshot on commit.

use crate::config::Config;
use crate::context::{Context, ContextKind};
use crate::group::{GroupState, VersionClock};
use crate::runtime;
use crate::table::Table;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use parking_lot::RwLock;
use std::sync::Arc;
use strata_core::{Error, Result};
use tracing::debug;

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open.
    Active,
    /// Write transaction whose changes were published.
    Committed,
    /// Write transaction whose changes were discarded.
    RolledBack,
    /// Read transaction that was ended.
    Closed,
}

struct GroupShared {
    published: RwLock<Arc<GroupState>>,
    writer_active: AtomicBool,
    clock: Arc<VersionClock>,
    config: Arc<Config>,
}

impl GroupShared {
    fn release_writer(&self) {
        self.writer_active.store(false, Ordering::Release);
    }

    fn retire(&self, snapshot: Arc<GroupState>) {
        if self.config.get_defer_reclamation() {
            runtime::defer_drop(snapshot);
        }
    }
}

/// A group of tables shared between transactions.
///
/// ```
/// use strata_core::DataType;
/// use strata_storage::SharedGroup;
///
/// let group = SharedGroup::new().unwrap();
/// let tx = group.begin_write().unwrap();
/// let people = tx.add_table("people").unwrap();
/// people.add_column(DataType::String, "name", false).unwrap();
/// tx.commit().unwrap();
///
/// let rx = group.begin_read();
/// assert!(rx.has_table("people").unwrap());
/// ```
#[derive(Clone)]
pub struct SharedGroup {
    shared: Arc<GroupShared>,
}

impl SharedGroup {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            shared: Arc::new(GroupShared {
                published: RwLock::new(Arc::new(GroupState::new()?)),
                writer_active: AtomicBool::new(false),
                clock: Arc::new(VersionClock::new()),
                config: Arc::new(config),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    fn open_context(&self, kind: ContextKind) -> (TransactionId, Arc<Context>) {
        let id = NEXT_TX_ID.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::clone(&self.shared.published.read());
        let ctx = Context::new(
            id,
            kind,
            snapshot,
            Arc::clone(&self.shared.clock),
            Arc::clone(&self.shared.config),
        );
        (id, ctx)
    }

    /// Opens a read transaction on the latest committed snapshot.
    pub fn begin_read(&self) -> ReadTransaction {
        let (id, ctx) = self.open_context(ContextKind::Read);
        debug!(tx = id, "read transaction started");
        ReadTransaction {
            id,
            ctx,
            state: TransactionState::Active,
        }
    }

    /// Opens the write transaction. Fails at once if another one is open.
    pub fn begin_write(&self) -> Result<WriteTransaction> {
        if self
            .shared
            .writer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::WriterActive);
        }
        let (id, ctx) = self.open_context(ContextKind::Write);
        debug!(tx = id, "write transaction started");
        Ok(WriteTransaction {
            id,
            ctx,
            shared: Arc::clone(&self.shared),
            state: TransactionState::Active,
        })
    }

    /// Whether a write transaction is currently open.
    pub fn is_writer_active(&self) -> bool {
        self.shared.writer_active.load(Ordering::Acquire)
    }
}

fn open_table(ctx: &Arc<Context>, name: &str) -> Result<Table> {
    let slot = ctx.read(|g| g.find_slot(name).ok_or_else(|| Error::table_not_found(name)))?;
    Ok(Table::attach(Arc::clone(ctx), slot))
}

/// A frozen view of the group as of `begin_read`.
pub struct ReadTransaction {
    id: TransactionId,
    ctx: Arc<Context>,
    state: TransactionState,
}

impl ReadTransaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn get_table(&self, name: &str) -> Result<Table> {
        open_table(&self.ctx, name)
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        self.ctx.read(|g| Ok(g.find_slot(name).is_some()))
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.ctx.read(|g| Ok(g.table_names()))
    }

    /// Number of tables.
    pub fn size(&self) -> Result<usize> {
        self.ctx.read(|g| Ok(g.table_count()))
    }

    /// Ends the transaction, invalidating every table, row and view taken
    /// from it.
    pub fn end(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.state == TransactionState::Active {
            self.ctx.invalidate();
            self.state = TransactionState::Closed;
            debug!(tx = self.id, "read transaction ended");
        }
    }
}

impl Drop for ReadTransaction {
    fn drop(&mut self) {
        self.close();
    }
}

/// The single open writer of a group.
pub struct WriteTransaction {
    id: TransactionId,
    ctx: Arc<Context>,
    shared: Arc<GroupShared>,
    state: TransactionState,
}

impl WriteTransaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn get_table(&self, name: &str) -> Result<Table> {
        open_table(&self.ctx, name)
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        self.ctx.read(|g| Ok(g.find_slot(name).is_some()))
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.ctx.read(|g| Ok(g.table_names()))
    }

    pub fn size(&self) -> Result<usize> {
        self.ctx.read(|g| Ok(g.table_count()))
    }

    pub fn add_table(&self, name: &str) -> Result<Table> {
        let max = self.ctx.config().get_max_name_length();
        let slot = self.ctx.write(|g, version| g.add_table(name, max, version))?;
        Ok(Table::attach(Arc::clone(&self.ctx), slot))
    }

    pub fn get_or_add_table(&self, name: &str) -> Result<Table> {
        match self.get_table(name) {
            Err(Error::TableNotFound { .. }) => self.add_table(name),
            found => found,
        }
    }

    /// Removes a table. Refused while another table links to it.
    pub fn remove_table(&self, name: &str) -> Result<()> {
        self.ctx.write(|g, _| g.remove_table(name))
    }

    /// Publishes the changes and ends the transaction.
    pub fn commit(mut self) -> Result<()> {
        let Some(group) = self.ctx.invalidate() else {
            return Err(Error::Invalidated {
                what: "write transaction",
            });
        };
        let replaced = core::mem::replace(&mut *self.shared.published.write(), group);
        self.state = TransactionState::Committed;
        self.shared.release_writer();
        self.shared.retire(replaced);
        debug!(tx = self.id, "write transaction committed");
        Ok(())
    }

    /// Discards the changes and ends the transaction.
    pub fn rollback(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        if let Some(discarded) = self.ctx.invalidate() {
            self.shared.retire(discarded);
        }
        self.state = TransactionState::RolledBack;
        self.shared.release_writer();
        debug!(tx = self.id, "write transaction rolled back");
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        self.abort();
    }
}
