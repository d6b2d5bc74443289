use super::*;
use parlay_core::*;
use std::sync::Arc;
use tokio::time::Instant;

/// Rematch coordination.
/// Votes are collected on the finished session; the final tally either ends
/// the thread or spawns a successor that inherits variant, stake, format,
/// and surface from its predecessor.
impl Dealer {
    pub(crate) async fn vote(
        self: &Arc<Self>,
        id: ID<Session>,
        user: ID<Member>,
        choice: Choice,
    ) -> Reply {
        match self.store.cast_vote(id, user, choice) {
            Err(e) => e.into(),
            Ok(Tally::Pending) => Reply::VoteRecorded,
            Ok(Tally::Declined) => {
                log::info!("[dealer] session {} stays finished, rematch declined", id);
                Reply::VoteRecorded
            }
            Ok(Tally::Approved { members, creator }) => {
                self.rematch(id, members, creator).await;
                Reply::VoteRecorded
            }
        }
    }
    /// Spawn the successor for an approved tally.
    /// Every yes-voter who can cover the stake is bought in immediately;
    /// short-funded members come along as NeedsStake, which forces the
    /// successor through a fresh lobby instead of straight into play.
    async fn rematch(
        self: &Arc<Self>,
        id: ID<Session>,
        members: Vec<ID<Member>>,
        creator: ID<Member>,
    ) {
        let Some(predecessor) = self.store.session(id) else {
            return;
        };
        let stake = predecessor.stake();
        let mut roster = Vec::with_capacity(members.len());
        for user in members {
            let status = if self.economy.balance(user).await >= stake
                && self.economy.apply(user, -stake).await.is_ok()
            {
                ParticipantStatus::Ready
            } else {
                ParticipantStatus::NeedsStake
            };
            roster.push((user, status));
        }
        let successor = self.store.open_successor(
            &predecessor,
            roster,
            creator,
            REGISTRATION_WINDOW,
            Instant::now(),
        );
        if successor.state() == SessionState::Lobby {
            self.arm(successor.id(), successor.deadline());
        }
        self.render(successor.id());
    }
}
