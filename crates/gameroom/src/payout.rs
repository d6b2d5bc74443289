use super::Member;
use super::TurnTicket;
use parlay_core::Credits;
use parlay_core::ID;

/// Failure inside an external collaborator.
/// The executor treats any of these as a turn fault: report, force the turn
/// Done, keep the session moving.
#[derive(Debug, Clone)]
pub struct CollabError(pub String);

impl std::fmt::Display for CollabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "collaborator failure: {}", self.0)
    }
}

impl std::error::Error for CollabError {}

/// Opaque side effect flag attached to a resolution, applied through the
/// economy collaborator alongside the delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffect(pub String);

/// Everything the payout engine produces for one turn: the animation frames,
/// the final render state, the monetary delta, and any side-effect flags.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub frames: Vec<String>,
    pub outcome: String,
    pub delta: Credits,
    pub effects: Vec<SideEffect>,
}

/// The opaque payout engine.
/// Implementations own the gambling math; the core only animates what they
/// return and applies the delta they computed.
///
/// The async design allows implementations to consult remote odds services
/// or run heavyweight draws off-thread without blocking the session.
#[async_trait::async_trait]
pub trait Payout: Send + Sync {
    /// Resolve one turn for a participant at the given stake.
    async fn resolve(
        &self,
        user: ID<Member>,
        stake: Credits,
        ticket: &TurnTicket,
    ) -> Result<Resolution, CollabError>;
}

/// The economy ledger: balances, stake holds, payout deltas, compensation.
#[async_trait::async_trait]
pub trait Economy: Send + Sync {
    /// Apply a delta to a user's balance, returning the new balance.
    async fn apply(&self, user: ID<Member>, delta: Credits) -> Result<Credits, CollabError>;
    /// Current balance, used by the rematch stake gate.
    async fn balance(&self, user: ID<Member>) -> Credits;
    /// Apply a resolution side effect for a user.
    async fn effect(&self, user: ID<Member>, effect: &SideEffect) -> Result<(), CollabError>;
}

/// The profile gate: decides whether a joining user enters Ready or
/// PendingConfirmation.
#[async_trait::async_trait]
pub trait ProfileGate: Send + Sync {
    async fn is_ready(&self, user: ID<Member>) -> bool;
}
