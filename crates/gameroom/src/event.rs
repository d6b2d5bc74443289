use super::Choice;
use super::Format;
use super::Member;
use super::Session;
use super::Variant;
use parlay_core::Credits;
use parlay_core::ID;
use parlay_dispatch::Target;

/// Inbound commands from the platform edge.
/// Already authenticated and parsed; the dealer only decides and replies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Open a fresh session on a chat surface.
    Open {
        creator: ID<Member>,
        variant: Variant,
        stake: Credits,
        target: Target,
    },
    /// Act on an existing session.
    Act {
        session: ID<Session>,
        actor: ID<Member>,
        action: Action,
    },
}

/// Per-session actions a participant can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Join,
    Confirm,
    Extend,
    Cancel,
    Continue,
    Choose(Format),
    Spin,
    Vote(Choice),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join => write!(f, "join"),
            Self::Confirm => write!(f, "confirm"),
            Self::Extend => write!(f, "extend"),
            Self::Cancel => write!(f, "cancel"),
            Self::Continue => write!(f, "continue"),
            Self::Choose(format) => write!(f, "choose {}", format),
            Self::Spin => write!(f, "spin"),
            Self::Vote(Choice::Yes) => write!(f, "vote yes"),
            Self::Vote(Choice::No) => write!(f, "vote no"),
        }
    }
}
