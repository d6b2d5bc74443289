use super::Member;
use parlay_core::*;
use parlay_dispatch::Target;
use serde::Deserialize;
use serde::Serialize;
use tokio::time::Instant;

/// Which mini-game a session runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// One round, creator picks the grid format before play.
    Classic,
    /// Multiple rounds with a fresh turn order each round.
    Marathon,
    /// One round, fixed format, deferred reveal animation.
    SpecialReveal,
}

impl Variant {
    /// Whether the creator picks a format between lobby and play.
    pub fn selectable_format(&self) -> bool {
        matches!(self, Self::Classic)
    }
    /// Total rounds this variant plays.
    pub fn rounds(&self) -> Round {
        match self {
            Self::Marathon => MARATHON_ROUNDS,
            _ => 1,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Marathon => write!(f, "marathon"),
            Self::SpecialReveal => write!(f, "special reveal"),
        }
    }
}

/// Grid shape for classic sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// One cell.
    Single,
    /// One row of three.
    Triple,
    /// Three by three grid.
    Grid,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "1x1"),
            Self::Triple => write!(f, "3x1"),
            Self::Grid => write!(f, "3x3"),
        }
    }
}

/// Lifecycle states. Transitions only move forward; see [`SessionState::may_become`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Lobby,
    ChooseFormat,
    Playing,
    Finished,
    Cancelled,
}

impl SessionState {
    pub fn terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
    /// Legal forward edges of the lifecycle.
    /// ChooseFormat is skipped by fixed-format variants; Cancelled is
    /// reachable from any pre-Finished state; no state is re-entered.
    pub fn may_become(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Lobby, Self::ChooseFormat) => true,
            (Self::Lobby, Self::Playing) => true,
            (Self::ChooseFormat, Self::Playing) => true,
            (Self::Playing, Self::Finished) => true,
            (Self::Lobby, Self::Cancelled) => true,
            (Self::ChooseFormat, Self::Cancelled) => true,
            (Self::Playing, Self::Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::ChooseFormat => write!(f, "choose format"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What a lobby deadline firing should do.
/// Computed purely from session state and the clock so the decision is
/// testable without running a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// Session left the lobby already: the fire is a no-op.
    Ignore,
    /// Deadline moved (extension after the timer armed): re-arm for it.
    Defer(Instant),
    /// The registration window is over.
    Due,
}

/// One instance of a multiplayer mini-game, lobby to terminal state.
/// Mutation happens only through the store's short, guarded operations.
#[derive(Clone, Debug)]
pub struct Session {
    id: ID<Session>,
    variant: Variant,
    state: SessionState,
    stake: Credits,
    creator: ID<Member>,
    created: Instant,
    deadline: Instant,
    extended: bool,
    format: Option<Format>,
    round: Round,
    cursor: Position,
    target: Target,
}

impl Session {
    pub fn new(
        variant: Variant,
        stake: Credits,
        creator: ID<Member>,
        target: Target,
        window: std::time::Duration,
        now: Instant,
    ) -> Self {
        Self {
            id: ID::default(),
            variant,
            state: SessionState::Lobby,
            stake,
            creator,
            created: now,
            deadline: now + window,
            extended: false,
            format: None,
            round: 1,
            cursor: 0,
            target,
        }
    }
    pub fn variant(&self) -> Variant {
        self.variant
    }
    pub fn state(&self) -> SessionState {
        self.state
    }
    pub fn stake(&self) -> Credits {
        self.stake
    }
    pub fn creator(&self) -> ID<Member> {
        self.creator
    }
    pub fn created(&self) -> Instant {
        self.created
    }
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
    pub fn extended(&self) -> bool {
        self.extended
    }
    pub fn format(&self) -> Option<Format> {
        self.format
    }
    pub fn round(&self) -> Round {
        self.round
    }
    pub fn cursor(&self) -> Position {
        self.cursor
    }
    pub fn target(&self) -> &Target {
        &self.target
    }
    /// Decide what a deadline fire should do right now.
    pub fn expiry(&self, now: Instant) -> Expiry {
        if self.state != SessionState::Lobby {
            Expiry::Ignore
        } else if self.deadline > now {
            Expiry::Defer(self.deadline)
        } else {
            Expiry::Due
        }
    }
}

/// Crate-private mutators, called only under the store lock.
impl Session {
    pub(crate) fn transition(&mut self, next: SessionState) -> bool {
        if self.state.may_become(next) {
            log::debug!("[session {}] {} -> {}", self.id, self.state, next);
            self.state = next;
            true
        } else {
            false
        }
    }
    pub(crate) fn extend(&mut self, by: std::time::Duration) -> Instant {
        self.extended = true;
        self.deadline += by;
        self.deadline
    }
    pub(crate) fn set_format(&mut self, format: Format) {
        self.format = Some(format);
    }
    pub(crate) fn set_round(&mut self, round: Round) {
        self.round = round;
    }
    pub(crate) fn set_cursor(&mut self, cursor: Position) {
        self.cursor = cursor;
    }
}

impl Unique for Session {
    fn id(&self) -> ID<Session> {
        self.id
    }
}
