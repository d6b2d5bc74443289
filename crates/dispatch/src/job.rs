use parlay_core::Sequence;
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Ordering;
use tokio::time::Instant;

/// Identity of one editable chat surface.
/// Either a (chat, message) pair or an inline-message identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// A message the transport can edit in place.
    Message { chat: i64, message: i64 },
    /// An inline surface addressed by opaque identifier.
    Inline { id: String },
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message { chat, message } => write!(f, "{}/{}", chat, message),
            Self::Inline { id } => write!(f, "inline/{}", id),
        }
    }
}

/// One pending render request.
/// Ephemeral: lives in the queue until sent, superseded, or dropped.
#[derive(Clone, Debug)]
pub struct Job {
    pub target: Target,
    pub seq: Sequence,
    pub due: Instant,
    pub payload: String,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for Job {}

/// Ordered by due time, then by sequence for a stable tiebreak.
impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
