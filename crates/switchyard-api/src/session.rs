// Session lifecycle state shared by both vendor clients.
//
// A session is valid while the authenticated flag is set and the last
// successful login is younger than the expiry policy. The state sits
// behind an async mutex held across re-authentication, so two callers
// racing on an expired session trigger exactly one login: the second
// caller waits on the lock and then observes the refreshed state.

use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};

/// Default session lifetime: embedded device web sessions expire
/// server-side after roughly half an hour of the login completing.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 60);

/// Authentication state for one device session.
#[derive(Debug)]
pub struct SessionState {
    authenticated: bool,
    established_at: Option<Instant>,
    max_age: Duration,
}

impl SessionState {
    pub fn new(max_age: Duration) -> Self {
        Self {
            authenticated: false,
            established_at: None,
            max_age,
        }
    }

    /// True if authenticated and within the expiry window.
    pub fn is_valid(&self) -> bool {
        self.authenticated
            && self
                .established_at
                .is_some_and(|at| at.elapsed() < self.max_age)
    }

    /// Record a successful authentication.
    pub fn mark_authenticated(&mut self) {
        self.authenticated = true;
        self.established_at = Some(Instant::now());
    }

    /// Drop the session. The next `ensure_session` re-authenticates.
    pub fn invalidate(&mut self) {
        self.authenticated = false;
        self.established_at = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Async guard around [`SessionState`].
///
/// `begin()` hands out the lock; clients hold it across the whole
/// validity-check-plus-login sequence inside `ensure_session`.
#[derive(Debug)]
pub struct SessionGuard {
    state: Mutex<SessionState>,
}

impl SessionGuard {
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::new(max_age)),
        }
    }

    /// Acquire the session lock.
    pub async fn begin(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Invalidate without caring who else is waiting (used on 401/403).
    pub async fn invalidate(&self) {
        self.state.lock().await.invalidate();
    }

    /// Snapshot of the authenticated flag (health checks, diagnostics).
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_authenticated()
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_MAX_AGE)
    }
}
