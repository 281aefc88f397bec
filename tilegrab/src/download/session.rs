//! Single-session bookkeeping.
//!
//! At most one download runs per [`SessionManager`]. Starting a session
//! hands out a [`SessionGuard`] that owns the session's cancellation token;
//! dropping the guard ends the session, however the download task exits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::DownloadError;

#[derive(Debug)]
struct ActiveSession {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct Inner {
    active: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
}

/// Process-wide "is a download running" flag plus its cancel handle.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session as running.
    ///
    /// Fails without side effects if one is already running.
    pub fn try_begin(&self) -> Result<SessionGuard, DownloadError> {
        let mut active = self.inner.active.lock();
        if active.is_some() {
            return Err(DownloadError::AlreadyRunning);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *active = Some(ActiveSession {
            id,
            token: token.clone(),
        });
        debug!(session = id, "Download session started");

        Ok(SessionGuard {
            inner: Arc::clone(&self.inner),
            id,
            token,
        })
    }

    /// Cancels the running session. Returns false if none is running.
    pub fn cancel(&self) -> bool {
        match self.inner.active.lock().as_ref() {
            Some(session) => {
                session.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.active.lock().is_some()
    }
}

/// Proof of a running session. Ends the session on drop.
#[derive(Debug)]
pub struct SessionGuard {
    inner: Arc<Inner>,
    id: u64,
    token: CancellationToken,
}

impl SessionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Token cancelled by [`SessionManager::cancel`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut active = self.inner.active.lock();
        if active.as_ref().is_some_and(|s| s.id == self.id) {
            *active = None;
            debug!(session = self.id, "Download session ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_one_session_at_a_time() {
        let sessions = SessionManager::new();
        let guard = sessions.try_begin().unwrap();

        assert!(sessions.is_running());
        assert_eq!(sessions.try_begin().unwrap_err(), DownloadError::AlreadyRunning);

        drop(guard);
        assert!(!sessions.is_running());
        assert!(sessions.try_begin().is_ok());
    }

    #[test]
    fn test_cancel_reaches_guard_token() {
        let sessions = SessionManager::new();
        assert!(!sessions.cancel());

        let guard = sessions.try_begin().unwrap();
        assert!(!guard.token().is_cancelled());
        assert!(sessions.clone().cancel());
        assert!(guard.token().is_cancelled());

        // Cancelling does not end the session; the guard does
        assert!(sessions.is_running());
    }

    #[test]
    fn test_sessions_get_fresh_tokens() {
        let sessions = SessionManager::new();
        let first = sessions.try_begin().unwrap();
        sessions.cancel();
        let first_id = first.id();
        drop(first);

        let second = sessions.try_begin().unwrap();
        assert_ne!(second.id(), first_id);
        assert!(!second.token().is_cancelled());
    }
}
