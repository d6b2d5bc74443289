use super::Member;
use super::Session;
use super::Variant;
use parlay_core::Credits;
use parlay_core::ID;
use parlay_core::Round;
use parlay_dispatch::Target;
use tokio::time::Instant;

/// Execution stage of one participant's turn.
/// At most one participant per session is ever Resolving; the turn cursor
/// enforces that, this stage exists to make activation idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Ready,
    Resolving,
    Done,
}

/// In-flight bookkeeping for a turn being resolved.
/// Kept in memory only: a process restart drops the animation, never the
/// authoritative session state.
#[derive(Clone, Debug)]
pub struct TurnExecution {
    pub user: ID<Member>,
    pub round: Round,
    pub stage: Stage,
    pub started: Instant,
    pub frame: Option<String>,
}

impl TurnExecution {
    pub fn begin(user: ID<Member>, round: Round, now: Instant) -> Self {
        Self {
            user,
            round,
            stage: Stage::Resolving,
            started: now,
            frame: None,
        }
    }
}

/// Finalized outcome of one turn, persisted for the session summary.
#[derive(Clone, Debug)]
pub struct TurnResult {
    pub user: ID<Member>,
    pub round: Round,
    pub delta: Credits,
    pub frame: String,
}

/// Everything the detached resolution task needs, snapshotted at activation
/// so the executor never holds the store lock across awaits.
#[derive(Clone, Debug)]
pub struct TurnTicket {
    pub session: ID<Session>,
    pub user: ID<Member>,
    pub variant: Variant,
    pub round: Round,
    pub stake: Credits,
    pub target: Target,
}
