use super::Member;
use parlay_core::ID;
use serde::Deserialize;
use serde::Serialize;

/// A participant's rematch choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Yes,
    No,
}

/// One participant's vote on continuing into a successor session.
/// Re-votes overwrite in place until the tally.
#[derive(Clone, Debug)]
pub struct RematchVote {
    pub user: ID<Member>,
    pub choice: Choice,
}

/// Result of casting a vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tally {
    /// Not everyone has voted yet.
    Pending,
    /// Everyone voted but fewer than the quorum said yes: stays terminal.
    Declined,
    /// Quorum reached: spawn a successor with these members.
    /// Members are the yes-voters in original join order; the creator is the
    /// original creator if they said yes, else the first remaining yes-voter.
    Approved {
        members: Vec<ID<Member>>,
        creator: ID<Member>,
    },
}
