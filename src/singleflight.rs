//! Single-flight request coalescing: collapse a thundering herd of
//! concurrent callers for the same key into a single execution of the
//! underlying work.
//!
//! # Protocol
//!
//! 1. Lock the registry.
//! 2. If a [`Call`] is already in flight for `key`, clone its handle, drop
//!    the lock, and `.await` its completion — every waiter gets the same
//!    `Result`.
//! 3. Otherwise, install a fresh `Call`, drop the lock, run the future,
//!    store the result, notify all waiters, re-lock, and remove the `Call`
//!    so the *next* caller (after this window closes) re-executes the work
//!    rather than replaying a stale result. `SingleFlight` deliberately
//!    caches nothing across windows — that's [`crate::cache::CacheShell`]'s
//!    job.
//!
//! The registry lock ([`parking_lot::Mutex`], matching the rest of the
//! crate's in-memory locks) is only ever held across map bookkeeping, never
//! across the `.await` of the caller-supplied future — holding it there
//! would serialize unrelated keys behind whichever key's load happens to be
//! slow.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::CacheError;

type SharedResult = Arc<(Notify, parking_lot::Mutex<Option<Result<crate::byte_view::ByteView, ErrMsg>>>)>;

/// A `CacheError` is not `Clone` (it boxes a `dyn Error`), but every waiter
/// in a single-flight window must observe the *same* error. `ErrMsg` is the
/// cloneable snapshot stored in the shared slot; it carries the original
/// error's message and variant tag so each waiter can reconstruct an
/// equivalent `CacheError` without needing the original boxed cause to be
/// `Clone`.
#[derive(Clone, Debug)]
enum ErrMsg {
    InvalidInput,
    NotFound(String),
    Loader(String),
    Peer(String),
}

impl From<&CacheError> for ErrMsg {
    fn from(e: &CacheError) -> Self {
        match e {
            CacheError::InvalidInput => ErrMsg::InvalidInput,
            CacheError::NotFound(g) => ErrMsg::NotFound(g.clone()),
            CacheError::LoaderError(src) => ErrMsg::Loader(src.to_string()),
            CacheError::PeerError(src) => ErrMsg::Peer(src.to_string()),
        }
    }
}

impl From<ErrMsg> for CacheError {
    fn from(e: ErrMsg) -> Self {
        match e {
            ErrMsg::InvalidInput => CacheError::InvalidInput,
            ErrMsg::NotFound(g) => CacheError::NotFound(g),
            ErrMsg::Loader(msg) => CacheError::loader_msg(msg),
            ErrMsg::Peer(msg) => CacheError::peer_msg(msg),
        }
    }
}

/// An in-flight (or just-completed, not yet reaped) coalesced call.
struct Call {
    shared: SharedResult,
}

/// The in-flight call registry for one [`crate::group::Group`].
///
/// At most one [`Call`] exists per key at any instant; the map is empty
/// whenever no loads for this group are in flight.
pub struct SingleFlight {
    calls: Mutex<HashMap<String, Call>>,
}

impl SingleFlight {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `make_future()` at most once per overlapping window of callers
    /// for `key`.
    ///
    /// `make_future` is only invoked by the caller that actually becomes the
    /// leader for this window (the first to arrive); followers never
    /// construct their own future at all, so side effects embedded in
    /// building the future (not just in awaiting it) only happen once too.
    pub async fn do_call<F, Fut>(&self, key: &str, make_future: F) -> Result<crate::byte_view::ByteView, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<crate::byte_view::ByteView, CacheError>>,
    {
        let (shared, is_leader) = {
            let mut calls = self.calls.lock();
            if let Some(existing) = calls.get(key) {
                (existing.shared.clone(), false)
            } else {
                let shared: SharedResult = Arc::new((Notify::new(), parking_lot::Mutex::new(None)));
                calls.insert(key.to_string(), Call { shared: shared.clone() });
                (shared, true)
            }
        };

        if !is_leader {
            // A follower: wait for the leader to signal completion, then
            // read the result it stashed. `notified()` must be constructed
            // before we check the slot, to avoid missing a notification that
            // fires between the check and the wait (the classic lost-wakeup
            // race); re-checking after each wake handles spurious wakeups.
            loop {
                let notified = shared.0.notified();
                if let Some(result) = shared.1.lock().clone() {
                    return result.map_err(CacheError::from);
                }
                notified.await;
            }
        }

        let result = make_future().await;
        *shared.1.lock() = Some(result.as_ref().map(Clone::clone).map_err(ErrMsg::from));
        shared.0.notify_waiters();

        self.calls.lock().remove(key);

        result
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingleFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}
