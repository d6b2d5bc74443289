/// Rejections for inbound actions.
/// Every variant is a synchronous refusal with no state mutation: the acting
/// user gets it back in their acknowledgment, the shared surface is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Unknown session reference.
    NotFound,
    /// Guard-then-act rejection: the precondition changed before we acted.
    TooLate,
    /// Creator-only action attempted by someone else.
    NotCreator,
    /// Not the current-turn participant.
    NotYourTurn,
    /// Turn already resolving or resolved; repeated activation is rejected.
    TurnTaken,
    /// Headcount cap reached.
    LobbyFull,
    /// Actor never joined this session.
    NotParticipant,
    /// User is already a participant.
    AlreadyJoined,
    /// The one-shot deadline extension was already used.
    AlreadyExtended,
    /// Early start requires the minimum ready headcount.
    NotEnoughPlayers,
    /// Rematch votes were already tallied.
    VotingClosed,
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no such session"),
            Self::TooLate => write!(f, "too late, already done"),
            Self::NotCreator => write!(f, "only the creator can do that"),
            Self::NotYourTurn => write!(f, "not your turn"),
            Self::TurnTaken => write!(f, "that turn is already running"),
            Self::LobbyFull => write!(f, "the lobby is full"),
            Self::NotParticipant => write!(f, "you are not in this session"),
            Self::AlreadyJoined => write!(f, "already joined"),
            Self::AlreadyExtended => write!(f, "deadline was already extended"),
            Self::NotEnoughPlayers => write!(f, "not enough players yet"),
            Self::VotingClosed => write!(f, "voting is closed"),
        }
    }
}

impl std::error::Error for ActionError {}
