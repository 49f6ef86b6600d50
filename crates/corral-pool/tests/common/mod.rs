//! In-process backend used by the pool integration tests.
//!
//! Connections are plain handles with a per-connection liveness flag the
//! test can flip, so probe failures and backend outages are scripted
//! without any network.

#![allow(dead_code)] // not every test file uses every helper

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use corral_pool::ConnectionBackend;
use parking_lot::Mutex;

pub struct MockConn {
    pub id: usize,
    alive: Arc<AtomicBool>,
    in_use: Arc<AtomicBool>,
}

impl MockConn {
    /// Mark the connection as held by a caller, panicking if it already is.
    pub fn claim(&self) {
        let was_held = self.in_use.swap(true, Ordering::SeqCst);
        assert!(!was_held, "connection {} handed to two owners", self.id);
    }

    pub fn unclaim(&self) {
        self.in_use.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockBackend {
    next_id: AtomicUsize,
    open_attempts: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    refuse_opens: AtomicBool,
    open_delay: Mutex<Option<Duration>>,
    alive: Mutex<HashMap<usize, Arc<AtomicBool>>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent open fail, as if the backend went down.
    pub fn refuse_opens(&self, refuse: bool) {
        self.refuse_opens.store(refuse, Ordering::SeqCst);
    }

    /// Delay subsequent opens, widening creation races.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock() = Some(delay);
    }

    /// Flip a specific connection's liveness so its next probe fails.
    pub fn kill(&self, id: usize) {
        if let Some(flag) = self.alive.lock().get(&id) {
            flag.store(false, Ordering::SeqCst);
        }
    }

    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionBackend for MockBackend {
    type Conn = MockConn;

    async fn open(&self) -> Option<MockConn> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.open_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse_opens.load(Ordering::SeqCst) {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let alive = Arc::new(AtomicBool::new(true));
        self.alive.lock().insert(id, Arc::clone(&alive));
        self.opened.fetch_add(1, Ordering::SeqCst);
        Some(MockConn {
            id,
            alive,
            in_use: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn probe(&self, conn: &mut MockConn) -> bool {
        conn.alive.load(Ordering::SeqCst)
    }

    async fn close(&self, _conn: MockConn) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
