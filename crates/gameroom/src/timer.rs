use super::ExpiryAction;
use super::Session;
use super::Store;
use parlay_core::ID;
use std::sync::Arc;
use tokio::time::Instant;

/// An armed registration deadline for one session.
/// Runs detached; the store re-checks everything when it fires, so the timer
/// racing an explicit cancel or continue is harmless.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    session: ID<Session>,
    at: Instant,
}

impl Deadline {
    pub fn new(session: ID<Session>, at: Instant) -> Self {
        Self { session, at }
    }
    /// Sleep until the deadline and hand the fire to the store.
    /// A one-shot extension moves the deadline after we armed; the Deferred
    /// answer re-arms for the new one instead of spawning a second timer.
    pub async fn watch(self, store: Arc<Store>) -> Option<ExpiryAction> {
        let mut at = self.at;
        loop {
            tokio::time::sleep_until(at).await;
            match store.expire(self.session, Instant::now()) {
                ExpiryAction::Ignored => {
                    log::debug!("[timer] session {} deadline was moot", self.session);
                    return None;
                }
                ExpiryAction::Deferred(later) => {
                    log::debug!("[timer] session {} deadline re-armed", self.session);
                    at = later;
                }
                outcome => return Some(outcome),
            }
        }
    }
}
