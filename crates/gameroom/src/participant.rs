use super::Session;
use parlay_core::ID;
use serde::Deserialize;
use serde::Serialize;
use tokio::time::Instant;

/// Marker type for chat users. The profile subsystem owns the real record;
/// the core only ever needs the identity.
pub struct Member;

/// Membership status within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Joined without a completed profile; excluded from turn orders until
    /// confirmed, dropped if still pending when the lobby deadline fires.
    PendingConfirmation,
    /// Counted for turn order and headcount alike.
    Ready,
    /// Rematch member whose balance cannot cover the stake yet.
    NeedsStake,
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingConfirmation => write!(f, "pending confirmation"),
            Self::Ready => write!(f, "ready"),
            Self::NeedsStake => write!(f, "needs stake"),
        }
    }
}

/// One (session, user) membership.
#[derive(Clone, Debug)]
pub struct Participant {
    session: ID<Session>,
    user: ID<Member>,
    status: ParticipantStatus,
    joined: Instant,
}

impl Participant {
    pub fn new(
        session: ID<Session>,
        user: ID<Member>,
        status: ParticipantStatus,
        joined: Instant,
    ) -> Self {
        Self {
            session,
            user,
            status,
            joined,
        }
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn user(&self) -> ID<Member> {
        self.user
    }
    pub fn status(&self) -> ParticipantStatus {
        self.status
    }
    pub fn joined(&self) -> Instant {
        self.joined
    }
    pub fn is_ready(&self) -> bool {
        self.status == ParticipantStatus::Ready
    }
    pub(crate) fn promote(&mut self) {
        self.status = ParticipantStatus::Ready;
    }
}
