use super::Member;
use parlay_core::ID;
use parlay_core::Position;
use parlay_core::Round;
use rand::Rng;
use rand::seq::SliceRandom;

/// Outcome of advancing the turn cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Same round, next participant.
    NextTurn,
    /// Order exhausted, more rounds remain: fresh order, cursor reset.
    RoundAdvanced,
    /// Order exhausted in the final round: every outcome is finalized.
    Complete,
}

/// Uniformly random permutation of the given members.
pub fn permutation<R: Rng>(rng: &mut R, mut members: Vec<ID<Member>>) -> Vec<ID<Member>> {
    members.shuffle(rng);
    members
}

/// Whether a persisted order still covers exactly the current ready set.
pub fn covers(order: &[ID<Member>], ready: &[ID<Member>]) -> bool {
    order.len() == ready.len() && ready.iter().all(|id| order.contains(id))
}

/// Where the cursor goes from here.
/// Pure so round progression is testable without a store.
pub fn step(cursor: Position, len: usize, round: Round, rounds: Round) -> Advance {
    if cursor + 1 < len {
        Advance::NextTurn
    } else if round < rounds {
        Advance::RoundAdvanced
    } else {
        Advance::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    fn members(n: usize) -> Vec<ID<Member>> {
        (0..n).map(|_| ID::default()).collect()
    }
    #[test]
    fn permutation_preserves_membership() {
        let mut rng = SmallRng::seed_from_u64(7);
        let original = members(6);
        let shuffled = permutation(&mut rng, original.clone());
        assert!(covers(&shuffled, &original));
    }
    #[test]
    fn covers_rejects_membership_drift() {
        let a = members(3);
        let mut b = a.clone();
        b.pop();
        b.push(ID::default());
        assert!(covers(&a, &a));
        assert!(!covers(&a, &b));
        assert!(!covers(&a, &a[..2].to_vec()));
    }
    #[test]
    fn step_walks_turns_then_rounds() {
        assert_eq!(step(0, 3, 1, 1), Advance::NextTurn);
        assert_eq!(step(1, 3, 1, 1), Advance::NextTurn);
        assert_eq!(step(2, 3, 1, 1), Advance::Complete);
        assert_eq!(step(2, 3, 1, 3), Advance::RoundAdvanced);
        assert_eq!(step(2, 3, 3, 3), Advance::Complete);
    }
    #[test]
    fn singleton_order_completes_immediately() {
        assert_eq!(step(0, 1, 1, 1), Advance::Complete);
    }
}
