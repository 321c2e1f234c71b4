//! Validity and mutability boundary shared by every handle derived from one
//! transaction or standalone table.
//!
//! A context owns a reference to a group snapshot. Read contexts never touch
//! it; write contexts copy it on first mutation. Once a context ends, every
//! handle bound to it fails with [`Error::Invalidated`].

use crate::config::Config;
use crate::group::{GroupState, VersionClock};
use parking_lot::RwLock;
use std::sync::Arc;
use strata_core::{Error, Result};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContextKind {
    Read,
    Write,
    Standalone,
}

struct ContextState {
    group: Arc<GroupState>,
    live: bool,
}

pub(crate) struct Context {
    id: u64,
    kind: ContextKind,
    state: RwLock<ContextState>,
    clock: Arc<VersionClock>,
    config: Arc<Config>,
}

impl Context {
    pub fn new(
        id: u64,
        kind: ContextKind,
        group: Arc<GroupState>,
        clock: Arc<VersionClock>,
        config: Arc<Config>,
    ) -> Arc<Self> {
        trace!(context = id, ?kind, "context opened");
        Arc::new(Self {
            id,
            kind,
            state: RwLock::new(ContextState { group, live: true }),
            clock,
            config,
        })
    }

    /// A context holding one anonymous table at slot 0.
    pub fn standalone() -> Arc<Self> {
        Self::new(
            0,
            ContextKind::Standalone,
            Arc::new(GroupState::standalone()),
            Arc::new(VersionClock::new()),
            Arc::new(Config::default()),
        )
    }

    #[inline]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_live(&self) -> bool {
        self.state.read().live
    }

    pub fn is_writable(&self) -> bool {
        self.kind != ContextKind::Read && self.is_live()
    }

    /// Runs `f` against the current group state.
    pub fn read<R>(&self, f: impl FnOnce(&GroupState) -> Result<R>) -> Result<R> {
        let state = self.state.read();
        if !state.live {
            return Err(Error::Invalidated { what: "context" });
        }
        f(&state.group)
    }

    /// Runs a mutation against the group state with a fresh version number.
    pub fn write<R>(&self, f: impl FnOnce(&mut GroupState, u64) -> Result<R>) -> Result<R> {
        let mut state = self.state.write();
        if !state.live {
            return Err(Error::Invalidated { what: "context" });
        }
        if self.kind == ContextKind::Read {
            return Err(Error::Immutable);
        }
        let version = self.clock.next();
        f(Arc::make_mut(&mut state.group), version)
    }

    /// Ends the context and hands back the state it saw last.
    pub fn invalidate(&self) -> Option<Arc<GroupState>> {
        let mut state = self.state.write();
        if !state.live {
            return None;
        }
        state.live = false;
        trace!(context = self.id, kind = ?self.kind, "context invalidated");
        Some(Arc::clone(&state.group))
    }
}
