use super::*;
use parlay_core::SPIN_TICKS;
use parlay_core::SPIN_TICK_GAP;
use std::sync::Arc;

/// Detached turn resolution.
/// One spawned task per activated turn: it animates the payout engine's
/// frames onto the shared surface, commits the delta, then hands the cursor
/// back to the session. No lock is ever held across an await; the task talks
/// to the store through its short guarded operations.
impl Dealer {
    pub(crate) fn detach(self: &Arc<Self>, ticket: TurnTicket) {
        let dealer = self.clone();
        tokio::spawn(async move { dealer.resolve(ticket).await });
    }
    /// Drive one turn to its terminal stage no matter what.
    /// A collaborator fault is reported to the operator, the held stake is
    /// returned, and the session keeps moving; a wedged session would strand
    /// every other participant.
    async fn resolve(self: Arc<Self>, ticket: TurnTicket) {
        let (id, user) = (ticket.session, ticket.user);
        if let Err(e) = self.animate(&ticket).await {
            log::error!(
                target: "operator",
                "[executor] turn fault in session {} for {}: {}",
                id,
                user,
                e
            );
            self.release(user, ticket.stake).await;
        }
        self.store.finish_turn(id, user);
        match self.store.advance(id) {
            Ok(_) => self.render(id),
            // the session was cancelled mid-spin; compensation already ran
            Err(_) => log::debug!("[executor] session {} gone before advance", id),
        }
    }
    /// The happy path: resolve, animate, commit, render the outcome.
    async fn animate(&self, ticket: &TurnTicket) -> Result<(), CollabError> {
        let (id, user) = (ticket.session, ticket.user);
        let resolution = self.payout.resolve(user, ticket.stake, ticket).await?;
        // engines may hand back more frames than the surface should churn
        // through; everything past the cap is animation nobody sees anyway
        for frame in resolution.frames.iter().take(SPIN_TICKS) {
            self.store.record_frame(id, user, frame.clone());
            self.dispatch.enqueue(
                ticket.target.clone(),
                View::Spin {
                    user,
                    frame: frame.clone(),
                }
                .to_json(),
            );
            tokio::time::sleep(SPIN_TICK_GAP).await;
        }
        // re-check after the awaits: a cancel mid-animation means the stake
        // comes back through compensation and the delta must not land
        if self
            .store
            .session(id)
            .map(|s| s.state() == SessionState::Cancelled)
            .unwrap_or(true)
        {
            log::debug!("[executor] session {} cancelled mid-spin, outcome dropped", id);
            return Ok(());
        }
        let balance = self.economy.apply(user, resolution.delta).await?;
        // past the commit point: failures from here on are reported, never
        // compensated, since the delta already landed
        for effect in &resolution.effects {
            if let Err(e) = self.economy.effect(user, effect).await {
                log::error!(target: "operator", "[executor] side effect failed for {}: {}", user, e);
            }
        }
        log::debug!(
            "[executor] {} resolved {} in session {}, balance {}",
            user,
            resolution.delta,
            id,
            balance
        );
        let recorded = self.store.record_result(
            id,
            TurnResult {
                user,
                round: ticket.round,
                delta: resolution.delta,
                frame: resolution.outcome.clone(),
            },
        );
        if !recorded {
            log::debug!("[executor] session {} cancelled at commit, result discarded", id);
            return Ok(());
        }
        self.dispatch.enqueue(
            ticket.target.clone(),
            View::Outcome {
                user,
                frame: resolution.outcome.clone(),
                delta: resolution.delta,
            }
            .to_json(),
        );
        Ok(())
    }
}
