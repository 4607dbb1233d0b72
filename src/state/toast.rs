use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub created_at: Instant,
}

#[derive(Debug, Default)]
struct ToastState {
    next_id: u64,
    toasts: Vec<Toast>,
}

/// Short-lived user feedback. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<ToastState>>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ToastState::default())),
            ttl,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(message.into(), ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(message.into(), ToastKind::Error)
    }

    fn push(&self, message: String, kind: ToastKind) -> u64 {
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.toasts.push(Toast {
            id,
            message,
            kind,
            created_at: Instant::now(),
        });
        id
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.inner.lock();
        let before = state.toasts.len();
        state.toasts.retain(|toast| toast.id != id);
        state.toasts.len() != before
    }

    /// Drops toasts older than the TTL at `now`; returns how many went.
    pub fn prune_at(&self, now: Instant) -> usize {
        let ttl = self.ttl;
        let mut state = self.inner.lock();
        let before = state.toasts.len();
        state
            .toasts
            .retain(|toast| now.saturating_duration_since(toast.created_at) < ttl);
        before - state.toasts.len()
    }

    /// Toasts still visible now, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        self.prune_at(Instant::now());
        self.inner.lock().toasts.clone()
    }

    /// Removes and returns every queued toast, expired or not.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut self.inner.lock().toasts)
    }

    /// Clears every toast. Ids keep counting up so a stale id from before
    /// the reset can't dismiss a new toast.
    pub fn reset(&self) {
        self.inner.lock().toasts.clear();
    }
}
