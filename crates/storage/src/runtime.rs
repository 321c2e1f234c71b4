//! Process-wide deferred reclamation.
//!
//! Committing a write transaction replaces the published snapshot. The old
//! snapshot may be large, so instead of dropping it on the committing
//! thread it is handed to a background reclaimer. The reclaimer only ever
//! drops values; nothing waits on it.
//!
//! ```
//! use strata_storage::runtime;
//!
//! runtime::init();
//! assert!(runtime::is_initialized());
//! runtime::defer_drop(vec![0u8; 1024]);
//! runtime::shutdown();
//! assert!(!runtime::is_initialized());
//! ```

use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

type Garbage = Box<dyn Send>;

struct Reclaimer {
    sender: Sender<Garbage>,
    worker: JoinHandle<()>,
}

static RECLAIMER: Mutex<Option<Reclaimer>> = parking_lot::const_mutex(None);

static RECLAIMED: AtomicU64 = AtomicU64::new(0);

/// Starts the reclaimer thread. Returns false if it was already running.
pub fn init() -> bool {
    let mut slot = RECLAIMER.lock();
    if slot.is_some() {
        return false;
    }
    let (sender, receiver) = mpsc::channel::<Garbage>();
    let spawned = thread::Builder::new()
        .name("strata-reclaimer".into())
        .spawn(move || {
            for garbage in receiver {
                drop(garbage);
                RECLAIMED.fetch_add(1, Ordering::Relaxed);
            }
        });
    match spawned {
        Ok(worker) => {
            debug!("reclaimer started");
            *slot = Some(Reclaimer { sender, worker });
            true
        }
        Err(e) => {
            warn!(error = %e, "could not start reclaimer, dropping inline");
            false
        }
    }
}

/// Drains pending garbage and stops the reclaimer thread.
pub fn shutdown() {
    let reclaimer = RECLAIMER.lock().take();
    if let Some(Reclaimer { sender, worker }) = reclaimer {
        drop(sender);
        if worker.join().is_err() {
            warn!("reclaimer thread panicked");
        }
        debug!("reclaimer stopped");
    }
}

pub fn is_initialized() -> bool {
    RECLAIMER.lock().is_some()
}

/// Number of values the reclaimer thread has dropped so far.
pub fn reclaimed_count() -> u64 {
    RECLAIMED.load(Ordering::Relaxed)
}

/// Drops `value` on the reclaimer thread, or right here when it is not
/// running.
pub fn defer_drop<T: Send + 'static>(value: T) {
    let garbage: Garbage = Box::new(value);
    let rejected = match RECLAIMER.lock().as_ref() {
        Some(reclaimer) => reclaimer.sender.send(garbage).err().map(|e| e.0),
        None => Some(garbage),
    };
    // Dropped after the lock is released.
    drop(rejected);
}
