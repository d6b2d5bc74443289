use super::ActionError;
use super::Member;
use super::Session;
use parlay_core::Credits;
use parlay_core::ID;
use parlay_core::Round;
use serde::Serialize;

/// Render payloads for the shared session surface.
/// The dispatcher treats these as opaque text; platform markup is someone
/// else's concern.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum View {
    /// Registration open: who is in, how long remains.
    Lobby {
        session: ID<Session>,
        stake: Credits,
        ready: usize,
        pending: usize,
        seconds_left: u64,
    },
    /// Creator is picking the grid format.
    ChooseFormat {
        session: ID<Session>,
        formats: Vec<String>,
    },
    /// Someone's turn to act.
    Turn {
        user: ID<Member>,
        round: Round,
        rounds: Round,
    },
    /// Intermediate animation frame while a turn resolves.
    Spin { user: ID<Member>, frame: String },
    /// A turn's final state.
    Outcome {
        user: ID<Member>,
        frame: String,
        delta: Credits,
    },
    /// Session finished: per-player totals plus the rematch prompt.
    Summary { lines: Vec<SummaryLine> },
    /// Session cancelled before finishing.
    Cancelled,
}

/// One player's accumulated delta across the session.
#[derive(Clone, Debug, Serialize)]
pub struct SummaryLine {
    pub user: ID<Member>,
    pub delta: Credits,
}

impl View {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize view")
    }
}

/// Fast per-action acknowledgment, distinct from surface renders so a slow
/// render never delays the platform-level response.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Opened { session: ID<Session> },
    Joined { status: String },
    Extended { seconds_left: u64 },
    Cancelled,
    Continued,
    FormatChosen,
    TurnStarted,
    VoteRecorded,
    Rejected { reason: String },
}

impl Reply {
    pub fn rejected(e: ActionError) -> Self {
        Self::Rejected {
            reason: e.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize reply")
    }
}

impl From<ActionError> for Reply {
    fn from(e: ActionError) -> Self {
        Self::rejected(e)
    }
}
